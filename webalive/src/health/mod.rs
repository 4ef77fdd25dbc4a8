//! ヘルスチェック
//!
//! 定期的に監視対象へHTTPリクエストを送り、死活を判定する。
//!
//! - [`prober`]: 1回のHTTPプローブ
//! - [`cache`]: 時間バケット単位でプローブ結果をまとめるキャッシュ
//! - [`scheduler`]: 自己再スケジュール型のタイマーチェーン

pub mod cache;
pub mod clock;
pub mod prober;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cache::{BucketCache, ResultCache, BUCKET_SECS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use prober::{HttpProber, Prober, PROBE_TIMEOUT_SECS};
pub use scheduler::{CheckGroup, ScheduledCheck};
