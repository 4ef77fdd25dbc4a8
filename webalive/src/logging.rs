//! ロギング初期化
//!
//! - 標準出力: 人間向けフォーマット
//! - `WEBALIVE_LOG_DIR` 設定時: 日次ローテーションのJSONファイル
//!
//! フィルタは `WEBALIVE_LOG_LEVEL`（旧: `RUST_LOG`）、未設定なら `info`。

use crate::config::get_env_with_fallback;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// ログファイル名の接頭辞
const LOG_FILE_PREFIX: &str = "webalive.log";

/// デフォルトのフィルタ
const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// 環境変数からフィルタを組み立てる
fn env_filter() -> EnvFilter {
    get_env_with_fallback("WEBALIVE_LOG_LEVEL", "RUST_LOG")
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// グローバルなtracingサブスクライバーを初期化
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let stdout_layer = fmt::layer().with_target(false).boxed();

    let file_layer = std::env::var("WEBALIVE_LOG_DIR").ok().map(|dir| {
        fmt::layer()
            .with_writer(rolling::daily(dir, LOG_FILE_PREFIX))
            .with_ansi(false)
            .json()
            .boxed()
    });

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
