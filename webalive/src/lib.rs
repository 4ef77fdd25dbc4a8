//! Web alive checker
//!
//! 設定したURLへ定期的にHTTPリクエストを送り、期待したステータスコードが
//! 返るかどうか（alive）をホストプラットフォームのセンサーとして公開する。

#![warn(missing_docs)]

/// 共通定義（エラー型）
pub mod common;

/// 型定義
pub mod types;

/// 設定管理（環境変数ヘルパー・YAML設定）
pub mod config;

/// ヘルスチェック（プローバー・結果キャッシュ・スケジューラー）
pub mod health;

/// 監視対象レジストリ / センサーファサード
pub mod registry;

/// センサーイベントバス
pub mod events;

/// オーケストレーター（セットアップ・ティアダウン）
pub mod orchestrator;

/// 読み取り専用ステータスAPI
pub mod api;

/// ロギング初期化ユーティリティ
pub mod logging;

/// CLIインターフェース
pub mod cli;

pub use orchestrator::Orchestrator;
