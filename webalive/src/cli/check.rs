//! check サブコマンド
//!
//! 1つのURLに1回だけプローブを送り、結果を表示します。

use crate::health::{HttpProber, Prober, PROBE_TIMEOUT_SECS};
use crate::types::{is_alive, ProbeOutcome, DEFAULT_EXPECTED_STATUS};
use clap::Args;

/// check サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// URL to probe
    pub url: String,

    /// Expected HTTP status code
    #[arg(short, long, default_value_t = DEFAULT_EXPECTED_STATUS)]
    pub expected_status: u16,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = PROBE_TIMEOUT_SECS)]
    pub timeout: u64,
}

/// プローブを実行して結果を表示する
///
/// 戻り値は死活（`true` = alive）。
pub async fn execute(args: &CheckArgs) -> anyhow::Result<bool> {
    let prober = HttpProber::with_timeout(args.timeout)?;
    let result = prober.probe(&args.url, args.expected_status).await;

    match &result {
        Ok(ProbeOutcome::Alive { status }) => {
            println!("{} is alive (HTTP {})", args.url, status);
        }
        Ok(ProbeOutcome::StatusMismatch { expected, actual }) => {
            println!(
                "{} is not alive (HTTP {}, expected {})",
                args.url, actual, expected
            );
        }
        Err(e) => {
            println!("{} could not be verified: {}", args.url, e);
        }
    }

    Ok(is_alive(&result))
}
