//! 読み取り専用ステータスAPI
//!
//! ホストに公開しているエンティティのスナップショットをJSONで返す。

use crate::registry::{EntityRegistry, EntitySnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// APIエラー
#[derive(Debug)]
pub enum ApiError {
    /// エンティティが存在しない
    EntityNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::EntityNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Entity not found: {}", id),
            ),
        };
        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
            }
        }));
        (status, body).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_entities(State(registry): State<EntityRegistry>) -> Json<Vec<EntitySnapshot>> {
    Json(registry.list())
}

async fn get_entity(
    State(registry): State<EntityRegistry>,
    Path(entity_id): Path<String>,
) -> Result<Json<EntitySnapshot>, ApiError> {
    registry
        .get(&entity_id)
        .map(Json)
        .ok_or(ApiError::EntityNotFound(entity_id))
}

/// ルーターを作成
pub fn create_router(registry: EntityRegistry) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/entities", get(list_entities))
        .route("/api/entities/:entity_id", get(get_entity))
        .with_state(registry)
}

/// APIサーバーを起動し、`shutdown` がキャンセルされるまで待つ
pub async fn serve(
    addr: SocketAddr,
    registry: EntityRegistry,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Status API listening");
    axum::serve(listener, create_router(registry))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
