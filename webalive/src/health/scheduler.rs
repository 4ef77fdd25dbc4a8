//! チェックスケジューラー
//!
//! スケジューリンググループごとに自己再スケジュール型のタイマーを持ち、
//! 発火のたびにグループ内の全センサーを登録順に順番にリフレッシュする。
//!
//! 次回の発火時刻は「サイクル完了時刻 + 間隔」で決まる。元の予定時刻からは
//! 計算しないため、サイクル自体の所要時間ぶんだけずれが累積する。

use super::cache::ResultCache;
use crate::registry::{AliveSensor, EntityHost};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// `Instant` に加算できない間隔の代わりに使う待ち時間（約30年）
const FAR_FUTURE_SECS: u64 = 86400 * 365 * 30;

/// 次回チェックの予定
///
/// 毎サイクル作り直す（更新はしない）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledCheck {
    /// 発火時刻（単調時計）
    pub fire_at: Instant,
    /// 発火時刻（壁時計、ログ用）
    pub fire_time: DateTime<Utc>,
}

impl ScheduledCheck {
    /// 現在時刻 + `interval` の予定を作成
    ///
    /// 表現できない遠い未来は上限に丸める（実質的に発火しない）。
    pub fn after(interval: Duration) -> Self {
        let now = Instant::now();
        let fire_at = now
            .checked_add(interval)
            .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS));
        let fire_time = chrono::Duration::from_std(interval)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { fire_at, fire_time }
    }
}

/// 1本のタイマーを共有するセンサーの集まり
#[derive(Clone)]
pub struct CheckGroup {
    sensors: Vec<Arc<AliveSensor>>,
    interval: Duration,
}

impl CheckGroup {
    /// グループを作成
    pub fn new(sensors: Vec<Arc<AliveSensor>>, interval: Duration) -> Self {
        Self { sensors, interval }
    }

    /// 1つのセンサーだけのグループを作成
    pub fn single(sensor: Arc<AliveSensor>) -> Self {
        let interval = sensor.target().interval();
        Self::new(vec![sensor], interval)
    }

    /// センサーを間隔ごとにまとめる（登録順を維持）
    pub fn group_by_interval(sensors: Vec<Arc<AliveSensor>>) -> Vec<Self> {
        let mut groups: Vec<Self> = Vec::new();
        for sensor in sensors {
            let interval = sensor.target().interval();
            match groups.iter_mut().find(|g| g.interval == interval) {
                Some(group) => group.sensors.push(sensor),
                None => groups.push(Self::new(vec![sensor], interval)),
            }
        }
        groups
    }

    /// グループ内のセンサー
    pub fn sensors(&self) -> &[Arc<AliveSensor>] {
        &self.sensors
    }

    /// チェック間隔
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 対象名の一覧（登録順）
    pub fn target_names(&self) -> Vec<String> {
        self.sensors
            .iter()
            .map(|s| s.target().name().to_string())
            .collect()
    }

    /// 1回のプローブ＆公開サイクル
    ///
    /// 並列にはせず登録順に実行する。遅いプローブは後続を最大でタイムアウト分遅らせる。
    pub async fn run_cycle(&self, cache: &dyn ResultCache, host: &dyn EntityHost) {
        for sensor in &self.sensors {
            sensor.refresh(cache).await;
            host.schedule_update(sensor);
            sensor.mark_idle();
        }
    }

    /// バックグラウンドでタイマーチェーンを開始
    ///
    /// `token` がキャンセルされると、待機中でもサイクル完了後でも次の予定を立てずに終了する。
    pub fn spawn(
        self,
        cache: Arc<dyn ResultCache>,
        host: Arc<dyn EntityHost>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(cache.as_ref(), host.as_ref(), &token).await;
        })
    }

    async fn run(&self, cache: &dyn ResultCache, host: &dyn EntityHost, token: &CancellationToken) {
        let targets = self.target_names();
        info!(
            targets = ?targets,
            interval_secs = self.interval.as_secs(),
            "Check group started"
        );

        let mut next = ScheduledCheck::after(self.interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep_until(next.fire_at) => {}
            }

            self.run_cycle(cache, host).await;

            if token.is_cancelled() {
                break;
            }
            next = ScheduledCheck::after(self.interval);
            debug!(
                targets = ?targets,
                next_fire_time = %next.fire_time,
                "Next check scheduled"
            );
        }

        info!(targets = ?targets, "Check group stopped");
    }
}
