//! Integration Test: セットアップからタイマー発火までの一連の流れ
//!
//! 実HTTPプローバー + wiremock で死活判定・キャッシュ・ティアダウンを検証する。

use std::time::Duration;
use webalive::common::error::SetupError;
use webalive::events::SensorEvent;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{refused_url, single_target_config, test_checker};

/// 期待通りのステータスなら alive
#[tokio::test]
async fn test_expected_status_is_alive_after_setup() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&mock)
        .await;

    let mut checker = test_checker(Some("Asia/Tokyo"));
    let sensors = checker
        .orchestrator
        .setup(&single_target_config(&mock.uri(), 200, 300))
        .await
        .unwrap();

    assert!(sensors[0].value());
    let snapshot = checker.registry.get("sensor.web_state").unwrap();
    assert!(snapshot.state);
    assert_eq!(snapshot.name, "web state");

    checker.orchestrator.shutdown().await;
}

/// ステータス不一致なら not alive
#[tokio::test]
async fn test_status_mismatch_is_not_alive() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock)
        .await;

    let mut checker = test_checker(Some("Asia/Tokyo"));
    let sensors = checker
        .orchestrator
        .setup(&single_target_config(&mock.uri(), 200, 300))
        .await
        .unwrap();

    assert!(!sensors[0].value());
    assert!(!checker.registry.get("sensor.web_state").unwrap().state);

    checker.orchestrator.shutdown().await;
}

/// 接続拒否でも not alive になり、エラーはセットアップの外に出ない
#[tokio::test]
async fn test_connection_refused_is_not_alive() {
    let url = refused_url().await;

    let mut checker = test_checker(Some("Asia/Tokyo"));
    let sensors = checker
        .orchestrator
        .setup(&single_target_config(&url, 200, 1))
        .await
        .unwrap();
    assert!(!sensors[0].value());

    // タイマー発火後もスケジューラーは動き続ける
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(checker.orchestrator.active_targets(), vec!["web"]);
    assert!(!checker.orchestrator.groups()[0].stopped);
    assert!(!sensors[0].value());

    checker.orchestrator.shutdown().await;
}

/// 同じバケット内の連続ティックはネットワーク呼び出し1回にまとまる
#[tokio::test]
async fn test_ticks_in_same_bucket_reuse_cached_result() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock)
        .await;

    let mut checker = test_checker(Some("Asia/Tokyo"));
    let mut events = checker.registry.events().subscribe();
    checker
        .orchestrator
        .setup(&single_target_config(&mock.uri(), 200, 1))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    checker.orchestrator.shutdown().await;

    let mut refreshed = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SensorEvent::StateRefreshed { state: true, .. }) {
            refreshed += 1;
        }
    }
    assert!(refreshed >= 2, "expected at least two ticks, got {refreshed}");

    mock.verify().await;
}

/// バケットが変われば再度プローブし、状態変化が反映される
#[tokio::test]
async fn test_new_bucket_probes_again() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;

    let mut checker = test_checker(Some("Asia/Tokyo"));
    let mut events = checker.registry.events().subscribe();
    let sensors = checker
        .orchestrator
        .setup(&single_target_config(&mock.uri(), 200, 1))
        .await
        .unwrap();
    assert!(!sensors[0].value());

    checker.clock.advance(Duration::from_secs(10));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    checker.orchestrator.shutdown().await;

    assert!(sensors[0].value());
    let changed = std::iter::from_fn(|| events.try_recv().ok()).any(|event| {
        matches!(
            event,
            SensorEvent::StateChanged {
                old_state: false,
                new_state: true,
                ..
            }
        )
    });
    assert!(changed);
}

/// タイムゾーン未設定ならセットアップは失敗し、エンティティは登録されない
#[tokio::test]
async fn test_missing_time_zone_registers_no_entities() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let mut checker = test_checker(None);
    let result = checker
        .orchestrator
        .setup(&single_target_config(&mock.uri(), 200, 300))
        .await;

    assert!(matches!(result, Err(SetupError::MissingTimeZone)));
    assert!(checker.registry.is_empty());
    assert!(checker.orchestrator.active_targets().is_empty());
}

/// シャットダウン後はタイマーが発火しない
#[tokio::test]
async fn test_shutdown_stops_probing() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;

    let mut checker = test_checker(Some("Asia/Tokyo"));
    checker
        .orchestrator
        .setup(&single_target_config(&mock.uri(), 200, 1))
        .await
        .unwrap();
    checker.orchestrator.shutdown().await;

    let before = mock.received_requests().await.unwrap().len();
    checker.clock.advance(Duration::from_secs(10));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let after = mock.received_requests().await.unwrap().len();

    assert_eq!(before, after);
    assert!(checker.orchestrator.active_targets().is_empty());
}
