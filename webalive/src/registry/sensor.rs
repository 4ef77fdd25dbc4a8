//! 死活センサー
//!
//! 監視対象の最新の死活結果をホストプラットフォームに公開するファサード。
//! 状態を変更するのはプローブ＆公開サイクル（[`AliveSensor::refresh`]）のみ。

use crate::health::cache::ResultCache;
use crate::types::{is_alive, slugify, SensorState, Target};
use std::collections::BTreeMap;
use std::sync::{OnceLock, RwLock};
use tracing::{error, info};

/// センサー種別（エンティティIDの接尾辞）
pub const SENSOR_TYPE_STATE: &str = "state";

/// センサーアイコン
pub const SENSOR_ICON: &str = "mdi:web";

/// エンティティIDのドメイン
pub const ENTITY_DOMAIN: &str = "sensor";

/// 1つの監視対象のチェック段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    /// 次のチェック待ち
    Idle,
    /// プローブ中
    Probing,
    /// 結果を公開済み（ホスト側の再描画待ち）
    Published,
}

/// 死活センサー
#[derive(Debug)]
pub struct AliveSensor {
    target: Target,
    entity_id: OnceLock<String>,
    state: RwLock<SensorState>,
    phase: RwLock<CheckPhase>,
}

impl AliveSensor {
    /// 初期値を指定してセンサーを作成
    pub fn new(target: Target, initial_value: bool) -> Self {
        info!(
            target_name = %target.name(),
            url = %target.url(),
            expected_status = target.expected_status(),
            interval_secs = target.interval().as_secs(),
            "AliveSensor created"
        );
        Self {
            target,
            entity_id: OnceLock::new(),
            state: RwLock::new(SensorState::new(initial_value)),
            phase: RwLock::new(CheckPhase::Idle),
        }
    }

    /// 監視対象
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// 名前から導出したエンティティID候補（`sensor.<slug>_state`）
    pub fn suggested_entity_id(&self) -> String {
        format!(
            "{}.{}_{}",
            ENTITY_DOMAIN,
            slugify(self.target.name()),
            SENSOR_TYPE_STATE
        )
    }

    /// エンティティID
    ///
    /// ホストに登録されるまでは候補IDを返す。
    pub fn entity_id(&self) -> String {
        self.entity_id
            .get()
            .cloned()
            .unwrap_or_else(|| self.suggested_entity_id())
    }

    /// ホストが割り当てたエンティティIDを設定（初回のみ有効）
    pub(crate) fn assign_entity_id(&self, entity_id: String) -> bool {
        self.entity_id.set(entity_id).is_ok()
    }

    /// 表示名
    pub fn display_name(&self) -> String {
        format!("{} {}", self.target.name(), SENSOR_TYPE_STATE)
    }

    /// アイコン
    pub fn icon(&self) -> &'static str {
        SENSOR_ICON
    }

    /// 現在の値（alive）
    pub fn value(&self) -> bool {
        self.state.read().unwrap_or_else(|e| e.into_inner()).value
    }

    /// 追加属性（現在は常に空）
    pub fn extra_attributes(&self) -> BTreeMap<String, serde_json::Value> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .attributes
            .clone()
    }

    /// 現在の状態のコピー
    pub fn state(&self) -> SensorState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 現在のチェック段階
    pub fn phase(&self) -> CheckPhase {
        *self.phase.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: CheckPhase) {
        *self.phase.write().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    pub(crate) fn mark_idle(&self) {
        self.set_phase(CheckPhase::Idle);
    }

    /// キャッシュ経由でプローブし、値を更新する
    ///
    /// エラーはここで吸収してログに残す。失敗時は直前の値を保持する。
    /// 戻り値はリフレッシュ後の値。
    pub async fn refresh(&self, cache: &dyn ResultCache) -> bool {
        self.set_phase(CheckPhase::Probing);

        match cache.get_or_probe(&self.target).await {
            Ok(result) => {
                let alive = is_alive(&result);
                self.state.write().unwrap_or_else(|e| e.into_inner()).value = alive;
                info!(
                    target_name = %self.target.name(),
                    alive = alive,
                    "Status updated"
                );
            }
            Err(e) => {
                error!(
                    target_name = %self.target.name(),
                    error = %e,
                    "Failed to refresh sensor; keeping previous value"
                );
            }
        }

        self.set_phase(CheckPhase::Published);
        self.value()
    }
}
