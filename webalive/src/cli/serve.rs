//! serve サブコマンド
//!
//! 設定ファイルを読み込んでチェッカーを起動し、Ctrl-C で停止します。

use crate::events::create_shared_event_bus;
use crate::health::{HttpProber, SystemClock};
use crate::orchestrator::Orchestrator;
use crate::registry::EntityRegistry;
use crate::{api, config::CheckerConfig};
use anyhow::Context;
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Path to the YAML configuration
    #[arg(short, long, default_value = "webalive.yaml", env = "WEBALIVE_CONFIG")]
    pub config: PathBuf,

    /// Status API listen port
    #[arg(short, long, default_value = "8123", env = "WEBALIVE_PORT")]
    pub port: u16,

    /// Status API bind address
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "WEBALIVE_HOST")]
    pub host: String,

    /// Do not start the status API
    #[arg(long, default_value_t = false)]
    pub no_api: bool,
}

impl ServeArgs {
    fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

/// チェッカーを起動して Ctrl-C を待つ
pub async fn execute(args: &ServeArgs) -> anyhow::Result<()> {
    let config = CheckerConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let events = create_shared_event_bus();
    let registry = EntityRegistry::new(config.time_zone.clone(), events);
    let prober = Arc::new(HttpProber::new()?);
    let mut orchestrator =
        Orchestrator::new(prober, Arc::new(SystemClock), Arc::new(registry.clone()));

    orchestrator.setup(&config).await?;

    let api_shutdown = CancellationToken::new();
    let api_task = if args.no_api {
        None
    } else {
        let addr = args.bind_addr()?;
        let registry = registry.clone();
        let token = api_shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = api::serve(addr, registry, token).await {
                error!(error = %e, "Status API stopped with error");
            }
        }))
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown requested");

    api_shutdown.cancel();
    orchestrator.shutdown().await;
    if let Some(task) = api_task {
        join_api_task(task).await;
    }
    Ok(())
}

/// APIタスクの終了を待つ（異常終了は警告ログに残す）
async fn join_api_task(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Status API task ended abnormally");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let args = ServeArgs {
            config: PathBuf::from("webalive.yaml"),
            port: 8123,
            host: "127.0.0.1".to_string(),
            no_api: false,
        };
        assert_eq!(args.bind_addr().unwrap().port(), 8123);

        let invalid = ServeArgs {
            host: "not a host".to_string(),
            ..args
        };
        assert!(invalid.bind_addr().is_err());
    }

    #[tokio::test]
    async fn test_join_api_task_reports_panic() {
        assert!(join_api_task(tokio::spawn(async {})).await);

        let panicked = tokio::spawn(async {
            panic!("api failure");
        });
        assert!(!join_api_task(panicked).await);
    }
}
