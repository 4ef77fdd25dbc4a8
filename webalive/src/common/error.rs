//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! 境界ごとにエラー型を分けている。
//!
//! - [`ProbeError`]: 1回のHTTPプローブの失敗。公開時には `false` に変換される
//! - [`CheckerError`]: リフレッシュサイクル内の予期しない失敗。センサー境界で吸収される
//! - [`SetupError`]: セットアップ時の前提条件・設定エラー。セットアップのみ中断する

use thiserror::Error;

/// プローブ失敗（ネットワーク/プロトコル層）
///
/// 「死活を確認できなかった」ことを表す。ステータス不一致（「確認した結果、
/// 生きていない」）はエラーではなく [`crate::types::ProbeOutcome::StatusMismatch`] で表す。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// タイムアウト
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// 接続失敗（接続拒否・DNS解決失敗など）
    #[error("Connection failed: {0}")]
    Connect(String),

    /// リクエスト送信・レスポンスヘッダ受信の失敗
    #[error("Request failed: {0}")]
    Request(String),

    /// レスポンスボディの読み取り失敗
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl ProbeError {
    /// reqwestのエラーを分類する
    pub fn from_reqwest(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// リフレッシュサイクル内のエラー
#[derive(Debug, Error)]
pub enum CheckerError {
    /// キャッシュの内部状態が利用できない
    #[error("Result cache unavailable: {0}")]
    CacheUnavailable(String),
}

/// セットアップエラー
#[derive(Debug, Error)]
pub enum SetupError {
    /// ホスト設定にタイムゾーンがない
    #[error("Timezone is not set in host configuration")]
    MissingTimeZone,

    /// 設定値が不正
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 設定ファイルの読み込み失敗
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// YAMLのパース失敗
    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// セットアップ用Result型
pub type SetupResult<T> = Result<T, SetupError>;
