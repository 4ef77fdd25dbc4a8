//! 統合テスト用ユーティリティ

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use webalive::config::{CheckerConfig, SensorConfig};
use webalive::events::create_shared_event_bus;
use webalive::health::{HttpProber, ManualClock};
use webalive::registry::EntityRegistry;
use webalive::Orchestrator;

/// 実HTTPプローバーと固定時計で組み立てたチェッカー
#[allow(dead_code)]
pub struct TestChecker {
    pub orchestrator: Orchestrator,
    pub registry: EntityRegistry,
    pub clock: Arc<ManualClock>,
}

/// 10秒境界に揃った固定時刻の時計
pub fn fixed_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ))
}

/// タイムゾーンを指定してチェッカーを作成
pub fn test_checker(time_zone: Option<&str>) -> TestChecker {
    let registry = EntityRegistry::new(time_zone.map(str::to_string), create_shared_event_bus());
    let clock = fixed_clock();
    let prober = Arc::new(HttpProber::new().expect("Failed to create prober"));
    let orchestrator = Orchestrator::new(prober, clock.clone(), Arc::new(registry.clone()));
    TestChecker {
        orchestrator,
        registry,
        clock,
    }
}

/// 1対象だけの設定
pub fn single_target_config(url: &str, expected_status: u16, interval: u64) -> CheckerConfig {
    CheckerConfig::new(Some("Asia/Tokyo".to_string())).with_sensor(
        SensorConfig::new("web", url)
            .with_expected_status(expected_status)
            .with_interval(interval),
    )
}

/// 接続を拒否するURL（バインドしてすぐ閉じたポート）
pub async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
