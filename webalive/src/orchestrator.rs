//! オーケストレーター
//!
//! 起動時に1度だけ構築され、結果キャッシュ・ホスト・稼働中のスケジューリング
//! グループをすべて所有する。セットアップとティアダウンの入口。

use crate::common::error::{SetupError, SetupResult};
use crate::config::CheckerConfig;
use crate::health::{BucketCache, CheckGroup, Clock, Prober, ResultCache};
use crate::registry::{AliveSensor, EntityHost};
use crate::types::is_alive;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 稼働中のスケジューリンググループ
struct ActiveGroup {
    targets: Vec<String>,
    interval: Duration,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveGroup {
    fn is_stopped(&self) -> bool {
        self.token.is_cancelled() || self.handle.is_finished()
    }
}

/// 稼働中グループの概要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    /// 対象名（登録順）
    pub targets: Vec<String>,
    /// チェック間隔
    pub interval: Duration,
    /// 停止済みか
    pub stopped: bool,
}

/// チェッカー全体のオーケストレーター
pub struct Orchestrator {
    cache: Arc<dyn ResultCache>,
    host: Arc<dyn EntityHost>,
    shutdown: CancellationToken,
    groups: Vec<ActiveGroup>,
    sensors: Vec<Arc<AliveSensor>>,
}

impl Orchestrator {
    /// プローバーと時計から `BucketCache` を組み立てて作成
    pub fn new(prober: Arc<dyn Prober>, clock: Arc<dyn Clock>, host: Arc<dyn EntityHost>) -> Self {
        let cache: Arc<dyn ResultCache> = Arc::new(BucketCache::new(prober, clock));
        Self::with_cache(cache, host)
    }

    /// キャッシュ実装を指定して作成
    pub fn with_cache(cache: Arc<dyn ResultCache>, host: Arc<dyn EntityHost>) -> Self {
        Self {
            cache,
            host,
            shutdown: CancellationToken::new(),
            groups: Vec::new(),
            sensors: Vec::new(),
        }
    }

    /// 設定に従ってセンサーを作成・登録し、タイマーを開始する
    ///
    /// 1. ホストのタイムゾーンを確認（未設定ならエンティティを登録せず失敗）
    /// 2. 対象ごとに1回プローブして初期状態を決める
    /// 3. ホストにエンティティを登録
    /// 4. スケジューリンググループを起動
    ///
    /// 複数回呼び出した場合、グループは追加されていく。
    pub async fn setup(&mut self, config: &CheckerConfig) -> SetupResult<Vec<Arc<AliveSensor>>> {
        if self.host.time_zone().is_none() {
            error!("Timezone is not set in host configuration");
            return Err(SetupError::MissingTimeZone);
        }
        if self.shutdown.is_cancelled() {
            return Err(SetupError::InvalidConfig(
                "orchestrator has already been shut down".to_string(),
            ));
        }

        let targets = config.targets()?;
        let active = self.active_targets();
        if let Some(existing) = targets
            .iter()
            .find(|t| active.iter().any(|name| name == t.name()))
        {
            return Err(SetupError::InvalidConfig(format!(
                "target '{}' is already active",
                existing.name()
            )));
        }

        let mut sensors = Vec::with_capacity(targets.len());
        for target in targets {
            let initial = match self.cache.get_or_probe(&target).await {
                Ok(result) => is_alive(&result),
                Err(e) => {
                    error!(
                        target_name = %target.name(),
                        error = %e,
                        "Initial probe failed"
                    );
                    false
                }
            };
            info!(target_name = %target.name(), alive = initial, "Initial state resolved");
            sensors.push(Arc::new(AliveSensor::new(target, initial)));
        }

        self.host.add_entities(sensors.clone());

        let groups = if config.group_targets {
            CheckGroup::group_by_interval(sensors.clone())
        } else {
            sensors.iter().cloned().map(CheckGroup::single).collect()
        };

        for group in groups {
            let token = self.shutdown.child_token();
            let targets = group.target_names();
            let interval = group.interval();
            let handle = group.spawn(self.cache.clone(), self.host.clone(), token.clone());
            self.groups.push(ActiveGroup {
                targets,
                interval,
                token,
                handle,
            });
        }

        info!(
            sensors = sensors.len(),
            groups = self.groups.len(),
            "Setup completed"
        );
        self.sensors.extend(sensors.iter().cloned());
        Ok(sensors)
    }

    /// 稼働中の全センサー（登録順）
    pub fn sensors(&self) -> &[Arc<AliveSensor>] {
        &self.sensors
    }

    /// 名前でセンサーを検索
    pub fn sensor(&self, name: &str) -> Option<&Arc<AliveSensor>> {
        self.sensors.iter().find(|s| s.target().name() == name)
    }

    /// 稼働中の対象名一覧
    ///
    /// キャンセル済み、またはタスクが終了したグループの対象は含まない。
    pub fn active_targets(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| !g.is_stopped())
            .flat_map(|g| g.targets.iter().cloned())
            .collect()
    }

    /// グループの概要一覧
    pub fn groups(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .map(|g| GroupSummary {
                targets: g.targets.clone(),
                interval: g.interval,
                stopped: g.is_stopped(),
            })
            .collect()
    }

    /// 指定対象を含むグループのタイマーを停止
    ///
    /// グルーピング有効時は同じグループの他の対象も止まる。停止したグループの
    /// センサーは管理対象から外れ、同じ名前で再度 [`setup`](Self::setup) できる。
    pub fn stop_target(&mut self, name: &str) -> bool {
        let Some(group) = self
            .groups
            .iter()
            .find(|g| !g.is_stopped() && g.targets.iter().any(|t| t == name))
        else {
            return false;
        };

        info!(target_name = %name, targets = ?group.targets, "Stopping check group");
        group.token.cancel();
        let stopped = group.targets.clone();
        self.sensors
            .retain(|s| !stopped.iter().any(|t| t == s.target().name()));
        true
    }

    /// 全タイマーを停止し、タスクの終了を待つ
    pub async fn shutdown(&mut self) {
        self.shutdown.cancel();
        for group in self.groups.drain(..) {
            if let Err(e) = group.handle.await {
                warn!(targets = ?group.targets, error = %e, "Check group task ended abnormally");
            }
        }
        info!("All check groups stopped");
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
