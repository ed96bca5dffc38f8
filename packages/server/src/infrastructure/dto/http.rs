//! HTTP API response DTOs for the signaling server.

use serde::{Deserialize, Serialize};

/// Snapshot of the broadcast session.
///
/// Also used as the payload of the `stream-status` WebSocket event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatusDto {
    pub is_live: bool,
    pub session_id: Option<String>,
    /// Unix timestamp (milliseconds since epoch)
    pub started_at: Option<i64>,
    pub viewer_count: usize,
    pub is_recording: bool,
    pub lecture_id: Option<String>,
    pub recording_started_at: Option<i64>,
}

/// Recording tagged in the lecture catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingDto {
    pub lecture_id: String,
    pub session_id: String,
    pub started_at: String, // ISO 8601
    pub stopped_at: String, // ISO 8601
    pub duration_ms: i64,
}
