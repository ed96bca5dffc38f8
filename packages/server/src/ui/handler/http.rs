//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    infrastructure::dto::http::{RecordingDto, StreamStatusDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Snapshot of the broadcast session, same shape as the `stream-status` event
pub async fn get_stream_status(State(state): State<Arc<AppState>>) -> Json<StreamStatusDto> {
    let status = state.get_stream_status_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(StreamStatusDto::from(&status))
}

/// Recordings tagged to lectures so far
pub async fn get_recordings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecordingDto>>, StatusCode> {
    match state.list_recordings_usecase.execute().await {
        Ok(recordings) => Ok(Json(recordings.iter().map(RecordingDto::from).collect())),
        Err(e) => {
            tracing::error!("Failed to list recordings: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
