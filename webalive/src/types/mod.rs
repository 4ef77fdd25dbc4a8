//! 型定義

/// 監視対象・プローブ結果・センサー状態
pub mod target;

pub use target::{
    is_alive, slugify, ProbeOutcome, ProbeResult, SensorState, Target, DEFAULT_EXPECTED_STATUS, MAX_INTERVAL_SECS,
    DEFAULT_INTERVAL_SECS,
};
