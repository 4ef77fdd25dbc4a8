//! プローブ結果キャッシュ
//!
//! 同じ時間バケット（10秒）内に同じ対象へ複数のチェックが重なったとき、
//! ネットワーク呼び出しを1回にまとめる。汎用のTTLキャッシュではない。
//!
//! キーは `(url, expected_status)`。異なる対象が同じバケット内でチェックされても
//! 結果を共有することはない。新しいバケットを初めて観測した時点で、
//! それより前のバケットのエントリはすべて破棄される。

use super::clock::Clock;
use super::prober::Prober;
use crate::common::error::CheckerError;
use crate::types::{ProbeResult, Target};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// バケットの粒度（秒）
pub const BUCKET_SECS: i64 = 10;

/// 結果キャッシュの抽象化
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// 現在のバケットにキャッシュ済みの結果があれば返し、なければプローブする
    async fn get_or_probe(&self, target: &Target) -> Result<ProbeResult, CheckerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    url: String,
    expected_status: u16,
}

impl CacheKey {
    fn for_target(target: &Target) -> Self {
        Self {
            url: target.url().to_string(),
            expected_status: target.expected_status(),
        }
    }
}

/// キーごとのスロット
///
/// プローブ中はこのロックを保持するため、同じバケット内の同時呼び出しは
/// 先行するプローブの完了を待ってその結果を受け取る。
type Slot = Arc<tokio::sync::Mutex<Option<ProbeResult>>>;

/// 時間バケット方式のインメモリキャッシュ
pub struct BucketCache {
    prober: Arc<dyn Prober>,
    clock: Arc<dyn Clock>,
    bucket_secs: i64,
    slots: Mutex<HashMap<CacheKey, (i64, Slot)>>,
}

impl BucketCache {
    /// 新しいキャッシュを作成（10秒バケット）
    pub fn new(prober: Arc<dyn Prober>, clock: Arc<dyn Clock>) -> Self {
        Self {
            prober,
            clock,
            bucket_secs: BUCKET_SECS,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// 時刻からバケットキーを計算
    pub fn bucket_for(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.bucket_secs)
    }

    /// 保持しているエントリ数
    pub fn len(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    /// エントリがないか
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 現在のバケット用のスロットを取得（古いバケットは破棄）
    ///
    /// 境界直前に時刻を読んだ呼び出しが後からロックを取った場合、`bucket` は
    /// 既に観測済みのバケットより古い。そのときは新しいエントリを残したまま、
    /// 同じキーに新しい結果があればそれを共有し、なければ登録しない使い捨ての
    /// スロットを返す。
    fn slot_for(&self, key: CacheKey, bucket: i64) -> Result<Slot, CheckerError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| CheckerError::CacheUnavailable(e.to_string()))?;

        let before = slots.len();
        slots.retain(|_, (slot_bucket, _)| *slot_bucket >= bucket);
        let evicted = before - slots.len();
        if evicted > 0 {
            debug!(bucket = bucket, evicted = evicted, "Evicted stale cache entries");
        }

        if let Some((_, slot)) = slots.get(&key) {
            return Ok(slot.clone());
        }
        let slot: Slot = Arc::new(tokio::sync::Mutex::new(None));
        if slots.values().any(|(slot_bucket, _)| *slot_bucket > bucket) {
            debug!(bucket = bucket, "Stale bucket observed; result will not be cached");
            return Ok(slot);
        }
        slots.insert(key, (bucket, slot.clone()));
        Ok(slot)
    }
}

#[async_trait]
impl ResultCache for BucketCache {
    async fn get_or_probe(&self, target: &Target) -> Result<ProbeResult, CheckerError> {
        let bucket = self.bucket_for(self.clock.now());
        let slot = self.slot_for(CacheKey::for_target(target), bucket)?;

        let mut entry = slot.lock().await;
        if let Some(result) = entry.as_ref() {
            debug!(target_name = %target.name(), bucket = bucket, "Cache hit");
            return Ok(result.clone());
        }

        let result = self
            .prober
            .probe(target.url(), target.expected_status())
            .await;
        *entry = Some(result.clone());
        Ok(result)
    }
}
