//! ホストプラットフォームとのエンティティ連携
//!
//! [`EntityHost`] はホスト側のエンティティ/状態レジストリへの境界。
//! [`EntityRegistry`] はプロセス内で完結するその実装で、スナップショットを保持し
//! 変化を [`SensorEvent`] として配信する。

use super::sensor::AliveSensor;
use crate::events::{SensorEvent, SharedEventBus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// ホストプラットフォームの境界
pub trait EntityHost: Send + Sync {
    /// ホストに設定されたタイムゾーン
    fn time_zone(&self) -> Option<String>;

    /// エンティティを登録
    fn add_entities(&self, sensors: Vec<Arc<AliveSensor>>);

    /// センサーの再描画（状態反映）を要求
    fn schedule_update(&self, sensor: &AliveSensor);
}

/// ホストに公開されるエンティティのスナップショット
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    /// エンティティID
    pub entity_id: String,
    /// 表示名
    pub name: String,
    /// アイコン
    pub icon: String,
    /// 状態（alive）
    pub state: bool,
    /// 追加属性
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// 最終更新日時
    pub last_updated: DateTime<Utc>,
}

impl EntitySnapshot {
    fn of(entity_id: String, sensor: &AliveSensor) -> Self {
        Self {
            entity_id,
            name: sensor.display_name(),
            icon: sensor.icon().to_string(),
            state: sensor.value(),
            attributes: sensor.extra_attributes(),
            last_updated: Utc::now(),
        }
    }
}

#[derive(Default)]
struct Inner {
    order: Vec<String>,
    entities: HashMap<String, EntitySnapshot>,
}

/// インメモリのエンティティレジストリ
#[derive(Clone)]
pub struct EntityRegistry {
    time_zone: Option<String>,
    inner: Arc<RwLock<Inner>>,
    events: SharedEventBus,
}

impl EntityRegistry {
    /// 新しいレジストリを作成
    ///
    /// 空文字のタイムゾーンは未設定として扱う。
    pub fn new(time_zone: Option<String>, events: SharedEventBus) -> Self {
        let time_zone = time_zone.filter(|tz| !tz.trim().is_empty());
        Self {
            time_zone,
            inner: Arc::new(RwLock::new(Inner::default())),
            events,
        }
    }

    /// イベントバス
    pub fn events(&self) -> &SharedEventBus {
        &self.events
    }

    /// 登録順のスナップショット一覧
    pub fn list(&self) -> Vec<EntitySnapshot> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .order
            .iter()
            .filter_map(|id| inner.entities.get(id).cloned())
            .collect()
    }

    /// 指定IDのスナップショット
    pub fn get(&self, entity_id: &str) -> Option<EntitySnapshot> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .entities
            .get(entity_id)
            .cloned()
    }

    /// 登録済みエンティティ数
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .order
            .len()
    }

    /// 登録済みエンティティがないか
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 既存IDと衝突しないエンティティIDを生成（`_2`, `_3` … を付与）
fn generate_entity_id(suggested: &str, existing: &HashMap<String, EntitySnapshot>) -> String {
    if !existing.contains_key(suggested) {
        return suggested.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", suggested, n))
        .find(|candidate| !existing.contains_key(candidate))
        .unwrap_or_else(|| suggested.to_string())
}

impl EntityHost for EntityRegistry {
    fn time_zone(&self) -> Option<String> {
        self.time_zone.clone()
    }

    fn add_entities(&self, sensors: Vec<Arc<AliveSensor>>) {
        let mut registered = Vec::with_capacity(sensors.len());
        {
            let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
            for sensor in sensors {
                let entity_id = generate_entity_id(&sensor.suggested_entity_id(), &inner.entities);
                if !sensor.assign_entity_id(entity_id.clone()) {
                    warn!(
                        entity_id = %sensor.entity_id(),
                        "Sensor is already registered; skipping"
                    );
                    continue;
                }
                let snapshot = EntitySnapshot::of(entity_id.clone(), &sensor);
                inner.order.push(entity_id.clone());
                inner.entities.insert(entity_id, snapshot.clone());
                registered.push(snapshot);
            }
        }

        for snapshot in registered {
            info!(
                entity_id = %snapshot.entity_id,
                state = snapshot.state,
                "Entity registered"
            );
            self.events.publish(SensorEvent::EntityRegistered {
                entity_id: snapshot.entity_id,
                name: snapshot.name,
                state: snapshot.state,
            });
        }
    }

    fn schedule_update(&self, sensor: &AliveSensor) {
        let entity_id = sensor.entity_id();
        let new_state = sensor.value();
        let at = Utc::now();

        let old_state = {
            let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
            let Some(snapshot) = inner.entities.get_mut(&entity_id) else {
                debug!(entity_id = %entity_id, "Update requested for unregistered entity");
                return;
            };
            let old_state = snapshot.state;
            snapshot.state = new_state;
            snapshot.attributes = sensor.extra_attributes();
            snapshot.last_updated = at;
            old_state
        };

        if old_state != new_state {
            info!(
                entity_id = %entity_id,
                old_state = old_state,
                new_state = new_state,
                "Entity state changed"
            );
            self.events.publish(SensorEvent::StateChanged {
                entity_id,
                old_state,
                new_state,
                at,
            });
        } else {
            self.events.publish(SensorEvent::StateRefreshed {
                entity_id,
                state: new_state,
                at,
            });
        }
    }
}
