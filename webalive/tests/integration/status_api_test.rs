//! Integration Test: ステータスAPI
//!
//! 実ポートにバインドしたAPIから、セットアップ済みエンティティを取得する。

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use webalive::api;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{single_target_config, test_checker};

#[tokio::test]
async fn test_status_api_reports_entities() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;

    let mut checker = test_checker(Some("UTC"));
    checker
        .orchestrator
        .setup(&single_target_config(&mock.uri(), 200, 300))
        .await
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = api::create_router(checker.registry.clone());
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    });

    let client = reqwest::Client::new();
    let list: Value = client
        .get(format!("http://{}/api/entities", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list[0]["entity_id"], "sensor.web_state");
    assert_eq!(list[0]["state"], true);

    let missing = client
        .get(format!("http://{}/api/entities/sensor.nope_state", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    shutdown.cancel();
    server.await.unwrap().unwrap();
    checker.orchestrator.shutdown().await;
}
