//! センサーイベントバス
//!
//! エンティティ登録・状態変化・リフレッシュ完了などのイベントを
//! 購読者（ログ出力、外部連携など）にブロードキャストするための基盤

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// イベントバスのチャネル容量
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// センサーイベント
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SensorEvent {
    /// エンティティ登録イベント
    EntityRegistered {
        /// エンティティID
        entity_id: String,
        /// 表示名
        name: String,
        /// 初期状態
        state: bool,
    },
    /// 状態変化イベント
    StateChanged {
        /// エンティティID
        entity_id: String,
        /// 旧状態
        old_state: bool,
        /// 新状態
        new_state: bool,
        /// 更新日時
        at: DateTime<Utc>,
    },
    /// 状態は変わらず、リフレッシュだけが行われた
    StateRefreshed {
        /// エンティティID
        entity_id: String,
        /// 状態
        state: bool,
        /// 更新日時
        at: DateTime<Utc>,
    },
}

impl SensorEvent {
    /// イベント対象のエンティティID
    pub fn entity_id(&self) -> &str {
        match self {
            Self::EntityRegistered { entity_id, .. }
            | Self::StateChanged { entity_id, .. }
            | Self::StateRefreshed { entity_id, .. } => entity_id,
        }
    }
}

/// センサーイベントバス
#[derive(Clone)]
pub struct SensorEventBus {
    sender: broadcast::Sender<SensorEvent>,
}

impl Default for SensorEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorEventBus {
    /// 新しいイベントバスを作成
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// イベントバスを購読
    pub fn subscribe(&self) -> broadcast::Receiver<SensorEvent> {
        self.sender.subscribe()
    }

    /// イベントを発行
    ///
    /// 購読者がいない場合でもエラーにはならない
    pub fn publish(&self, event: SensorEvent) {
        let _ = self.sender.send(event);
    }

    /// 現在の購読者数を取得
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Arc でラップされたイベントバス
pub type SharedEventBus = Arc<SensorEventBus>;

/// 新しい共有イベントバスを作成
pub fn create_shared_event_bus() -> SharedEventBus {
    Arc::new(SensorEventBus::new())
}
