//! HTTPプローバー
//!
//! タイムアウト付きのGETを1回発行し、ステータスコードを期待値と比較する。

use crate::common::error::ProbeError;
use crate::types::{is_alive, ProbeOutcome, ProbeResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// プローブのタイムアウト（秒）
pub const PROBE_TIMEOUT_SECS: u64 = 10;

/// プローブ処理の抽象化
///
/// テストでは呼び出し回数を数える実装や遅延する実装に差し替える。
#[async_trait]
pub trait Prober: Send + Sync {
    /// URLにプローブを送り、期待ステータスと比較した結果を返す
    async fn probe(&self, url: &str, expected_status: u16) -> ProbeResult;

    /// プローブ結果をbool値で返す
    ///
    /// 失敗とステータス不一致はどちらも `false`。
    async fn is_alive(&self, url: &str, expected_status: u16) -> bool {
        is_alive(&self.probe(url, expected_status).await)
    }
}

/// reqwestによるHTTPプローバー
#[derive(Clone, Debug)]
pub struct HttpProber {
    client: Client,
    timeout_secs: u64,
}

impl HttpProber {
    /// デフォルトタイムアウト（10秒）でプローバーを作成
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(PROBE_TIMEOUT_SECS)
    }

    /// タイムアウトを指定してプローバーを作成
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// タイムアウト（秒）
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str, expected_status: u16) -> ProbeResult {
        let result = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ProbeError::from_reqwest(&e, self.timeout_secs))?;

            let status = response.status().as_u16();

            // 接続を正しく返却するためボディを読み切ってから判定する
            response
                .bytes()
                .await
                .map_err(|e| ProbeError::from_reqwest(&e, self.timeout_secs))?;

            Ok(ProbeOutcome::from_status(expected_status, status))
        }
        .await;

        match &result {
            Ok(ProbeOutcome::Alive { status }) => {
                debug!(url = %url, status = status, "Probe succeeded");
            }
            Ok(ProbeOutcome::StatusMismatch { expected, actual }) => {
                debug!(
                    url = %url,
                    expected = expected,
                    actual = actual,
                    "Probe returned unexpected status"
                );
            }
            Err(e) => {
                info!(url = %url, error = %e, "Probe failed");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_prober_default_timeout() {
        let prober = HttpProber::new().unwrap();
        assert_eq!(prober.timeout_secs(), PROBE_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_probe_expected_status_is_alive() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock)
            .await;

        let prober = HttpProber::new().unwrap();
        let result = prober.probe(&mock.uri(), 200).await;
        assert_eq!(result, Ok(ProbeOutcome::Alive { status: 200 }));
    }

    #[tokio::test]
    async fn test_probe_status_mismatch() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock)
            .await;

        let prober = HttpProber::new().unwrap();
        let result = prober.probe(&mock.uri(), 200).await;
        assert_eq!(
            result,
            Ok(ProbeOutcome::StatusMismatch {
                expected: 200,
                actual: 404
            })
        );
        assert!(!prober.is_alive(&mock.uri(), 200).await);
    }

    #[tokio::test]
    async fn test_probe_non_200_expected_status() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock)
            .await;

        let prober = HttpProber::new().unwrap();
        assert!(prober.is_alive(&mock.uri(), 503).await);
    }

    #[tokio::test]
    async fn test_probe_connection_refused() {
        // 空きポートを取得してから閉じる
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = HttpProber::new().unwrap();
        let result = prober.probe(&format!("http://{}", addr), 200).await;
        assert!(matches!(result, Err(ProbeError::Connect(_))));
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock)
            .await;

        let prober = HttpProber::with_timeout(1).unwrap();
        let result = prober.probe(&mock.uri(), 200).await;
        assert_eq!(result, Err(ProbeError::Timeout(1)));
    }
}
