//! 監視対象レジストリ / センサーファサード
//!
//! 監視対象ごとの設定と最後に観測した状態を保持し、
//! プローブ結果をホストプラットフォームのエンティティモデルへ橋渡しする。

pub mod entities;
pub mod sensor;

pub use entities::{EntityHost, EntityRegistry, EntitySnapshot};
pub use sensor::{AliveSensor, CheckPhase};
