//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{ConnectionDto, HistoryDto, ServerStateDto},
    ui::state::AppState,
};
use hiroba_shared::time::timestamp_to_rfc3339;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint to get current registry and history state
pub async fn debug_server_state(State(state): State<Arc<AppState>>) -> Json<ServerStateDto> {
    let server_state = state.get_server_state_usecase.execute().await;

    // Domain Model から DTO への変換
    let dto = ServerStateDto {
        capacity: server_state.capacity,
        connections: server_state
            .connections
            .into_iter()
            .map(ConnectionDto::from)
            .collect(),
        history: HistoryDto {
            count: server_state.history_count,
            capacity: server_state.history_capacity,
            last_id: server_state.last_id.map(|id| id.value()),
        },
        server_time: timestamp_to_rfc3339(state.clock.now_unix_secs()),
    };

    Json(dto)
}
