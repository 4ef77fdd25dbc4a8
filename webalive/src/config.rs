//! 設定管理
//!
//! - 環境変数ヘルパー（旧名へのフォールバックと非推奨警告）
//! - 監視対象を記述するYAML設定ファイル
//!
//! ```yaml
//! time_zone: Asia/Tokyo
//! group_targets: false
//! sensors:
//!   my_site:
//!     name: My Site
//!     url: https://example.com
//!     interval: 300
//!     expected_status: 200
//! ```

use crate::common::error::{SetupError, SetupResult};
use crate::types::{Target, DEFAULT_EXPECTED_STATUS, DEFAULT_INTERVAL_SECS};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// 監視対象1件の設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SensorConfig {
    /// 設定ファイル上のキー（スラッグ）
    #[serde(skip)]
    pub key: String,
    /// 対象名（省略時はキー）
    #[serde(default)]
    pub name: Option<String>,
    /// チェック対象URL
    pub url: String,
    /// チェック間隔（秒）
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// 期待ステータスコード
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_expected_status() -> u16 {
    DEFAULT_EXPECTED_STATUS
}

impl SensorConfig {
    /// デフォルト値で設定を作成
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            url: url.into(),
            interval: DEFAULT_INTERVAL_SECS,
            expected_status: DEFAULT_EXPECTED_STATUS,
        }
    }

    /// 間隔を設定
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// 期待ステータスを設定
    pub fn with_expected_status(mut self, expected_status: u16) -> Self {
        self.expected_status = expected_status;
        self
    }

    /// 対象名（未設定・空ならキー）
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.key)
    }

    /// 監視対象に変換
    pub fn to_target(&self) -> SetupResult<Target> {
        Target::new(
            self.display_name(),
            self.url.clone(),
            self.expected_status,
            self.interval,
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    time_zone: Option<String>,
    #[serde(default)]
    group_targets: bool,
    #[serde(default)]
    sensors: serde_yaml::Mapping,
}

/// チェッカー全体の設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckerConfig {
    /// ホストのタイムゾーン（未設定ならセットアップは失敗する）
    pub time_zone: Option<String>,
    /// 同じ間隔の対象を1本のタイマーにまとめるか
    pub group_targets: bool,
    /// 監視対象（記述順 = 登録順）
    pub sensors: Vec<SensorConfig>,
}

impl CheckerConfig {
    /// タイムゾーンを指定して空の設定を作成
    pub fn new(time_zone: Option<String>) -> Self {
        Self {
            time_zone,
            group_targets: false,
            sensors: Vec::new(),
        }
    }

    /// 監視対象を追加
    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensors.push(sensor);
        self
    }

    /// グルーピングを設定
    pub fn with_group_targets(mut self, group_targets: bool) -> Self {
        self.group_targets = group_targets;
        self
    }

    /// YAML文字列から読み込み
    pub fn from_yaml_str(content: &str) -> SetupResult<Self> {
        let raw: RawConfig = serde_yaml::from_str(content)?;

        let mut sensors = Vec::with_capacity(raw.sensors.len());
        for (key, value) in raw.sensors {
            let key = key.as_str().map(str::to_string).ok_or_else(|| {
                SetupError::InvalidConfig(format!("sensor key must be a string: {:?}", key))
            })?;
            if !is_slug(&key) {
                return Err(SetupError::InvalidConfig(format!(
                    "sensor key '{}' must match [a-z0-9_]+",
                    key
                )));
            }
            let mut sensor: SensorConfig = serde_yaml::from_value(value)?;
            sensor.key = key;
            sensors.push(sensor);
        }

        Ok(Self {
            time_zone: raw.time_zone,
            group_targets: raw.group_targets,
            sensors,
        })
    }

    /// ファイルから読み込み
    pub fn load(path: impl AsRef<Path>) -> SetupResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// 監視対象一覧に変換（検証込み）
    ///
    /// 対象名の重複はエラー。
    pub fn targets(&self) -> SetupResult<Vec<Target>> {
        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(self.sensors.len());
        for sensor in &self.sensors {
            let target = sensor.to_target()?;
            if !seen.insert(target.name().to_string()) {
                return Err(SetupError::InvalidConfig(format!(
                    "duplicate target name '{}'",
                    target.name()
                )));
            }
            targets.push(target);
        }
        Ok(targets)
    }
}

fn is_slug(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
