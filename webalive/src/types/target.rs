//! 監視対象・プローブ結果・センサー状態の型定義

use crate::common::error::{ProbeError, SetupError};
use std::collections::BTreeMap;
use std::time::Duration;

/// デフォルトのチェック間隔（秒）
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// デフォルトの期待ステータスコード
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

/// チェック間隔の上限（秒）
pub const MAX_INTERVAL_SECS: u64 = u32::MAX as u64;

/// 監視対象
///
/// 作成後は不変。`name` がレジストリ内での一意キーになる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    url: String,
    expected_status: u16,
    interval: Duration,
}

impl Target {
    /// 監視対象を作成
    ///
    /// `interval_secs` は1以上 [`MAX_INTERVAL_SECS`] 以下、`expected_status` は
    /// 有効なHTTPステータスコード（100〜999）でなければならない。
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        expected_status: u16,
        interval_secs: u64,
    ) -> Result<Self, SetupError> {
        let name = name.into();
        let url = url.into();

        if name.trim().is_empty() {
            return Err(SetupError::InvalidConfig(
                "target name must not be empty".to_string(),
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SetupError::InvalidConfig(format!(
                "target '{}': url must start with http:// or https:// (got '{}')",
                name, url
            )));
        }
        if !(100..=999).contains(&expected_status) {
            return Err(SetupError::InvalidConfig(format!(
                "target '{}': expected_status must be in 100..=999 (got {})",
                name, expected_status
            )));
        }
        if interval_secs == 0 {
            return Err(SetupError::InvalidConfig(format!(
                "target '{}': interval must be a positive number of seconds",
                name
            )));
        }
        if interval_secs > MAX_INTERVAL_SECS {
            return Err(SetupError::InvalidConfig(format!(
                "target '{}': interval must be at most {} seconds (got {})",
                name, MAX_INTERVAL_SECS, interval_secs
            )));
        }

        Ok(Self {
            name,
            url,
            expected_status,
            interval: Duration::from_secs(interval_secs),
        })
    }

    /// 対象名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// チェック対象URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 期待するステータスコード
    pub fn expected_status(&self) -> u16 {
        self.expected_status
    }

    /// チェック間隔
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// プローブ成功時の判定結果
///
/// レスポンスを受け取れた場合の結果。受け取れなかった場合は [`ProbeError`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// ステータスコードが期待値と一致
    Alive {
        /// 実際のステータスコード
        status: u16,
    },
    /// ステータスコードが期待値と不一致
    StatusMismatch {
        /// 期待値
        expected: u16,
        /// 実際の値
        actual: u16,
    },
}

impl ProbeOutcome {
    /// 期待値と実際のステータスから判定結果を作る
    pub fn from_status(expected: u16, actual: u16) -> Self {
        if expected == actual {
            Self::Alive { status: actual }
        } else {
            Self::StatusMismatch { expected, actual }
        }
    }

    /// 生存しているか
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive { .. })
    }
}

/// 1回のプローブの結果
///
/// 「確認できなかった」（`Err`）と「確認した結果、生きていない」
/// （`Ok(StatusMismatch)`）を区別する。公開する状態では両方とも `false`。
pub type ProbeResult = Result<ProbeOutcome, ProbeError>;

/// プローブ結果を公開用のbool値に変換
pub fn is_alive(result: &ProbeResult) -> bool {
    matches!(result, Ok(outcome) if outcome.is_alive())
}

/// センサー状態
#[derive(Debug, Clone, PartialEq)]
pub struct SensorState {
    /// 現在の値（alive）
    pub value: bool,
    /// 追加属性（現在は常に空）
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl SensorState {
    /// 初期値から状態を作成
    pub fn new(value: bool) -> Self {
        Self {
            value,
            attributes: BTreeMap::new(),
        }
    }
}

/// エンティティID用に名前をスラッグ化する
///
/// 英数字以外は `_` に置き換え、連続する `_` と前後の `_` を除去する。
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_underscore = true;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_underscore = false;
        } else if !last_underscore {
            slug.push('_');
            last_underscore = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug
    }
}
