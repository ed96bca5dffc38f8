//! WebSocket event DTOs for the signaling server.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": {...}}`. Events
//! without a payload may omit `data`, send `null`, or send an object whose
//! fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::StreamStatusDto;

// ========================================
// Client → Server
// ========================================

/// Event sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEventDto {
    ConnectionEstablished(Option<EmptyPayload>),
    StartStream(Option<EmptyPayload>),
    StopStream(Option<EmptyPayload>),
    StartRecording(StartRecordingPayload),
    StopRecording(Option<EmptyPayload>),
    JoinStream(Option<JoinStreamPayload>),
    LeaveStream(Option<EmptyPayload>),
    ChatMessage(ChatMessagePayload),
    MicRequest(Option<MicRequestPayload>),
    WebrtcOffer(WebrtcOfferPayload),
    WebrtcAnswer(WebrtcAnswerPayload),
    IceCandidate(IceCandidatePayload),
    GetStreamStatus(Option<EmptyPayload>),
    Ping(Option<EmptyPayload>),
}

/// `data` of events that carry no payload; any fields are ignored
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmptyPayload {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingPayload {
    pub lecture_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStreamPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_info: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicRequestPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebrtcOfferPayload {
    pub target_viewer_id: String,
    pub offer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebrtcAnswerPayload {
    pub answer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidatePayload {
    pub candidate: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_viewer_id: Option<String>,
}

// ========================================
// Server → Client
// ========================================

/// Event sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEventDto {
    StreamStarted(StreamStartedPayload),
    StreamStopped(StreamStoppedPayload),
    ViewerJoined(ViewerJoinedPayload),
    ViewerLeft(ViewerLeftPayload),
    ViewerCountUpdated(ViewerCountPayload),
    WebrtcOffer(RelayedOfferPayload),
    WebrtcAnswer(RelayedAnswerPayload),
    IceCandidate(RelayedCandidatePayload),
    ChatMessage(ChatBroadcastPayload),
    MicRequest(MicRequestNoticePayload),
    RecordingStarted(RecordingStartedPayload),
    RecordingStopped(RecordingStoppedPayload),
    StreamStatus(StreamStatusDto),
    StreamError(ErrorPayload),
    ChatError(ErrorPayload),
    RecordingError(ErrorPayload),
    RateLimited(RateLimitedPayload),
    Pong(PongPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStartedPayload {
    pub session_id: String,
    /// Unix timestamp (milliseconds since epoch)
    pub started_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStoppedPayload {
    pub session_id: String,
    /// `stopped-by-admin` or `admin-disconnected`
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerJoinedPayload {
    pub connection_id: String,
    pub viewer_info: Option<Value>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerLeftPayload {
    pub connection_id: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerCountPayload {
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayedOfferPayload {
    pub offer: Value,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedAnswerPayload {
    pub connection_id: String,
    pub answer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayedCandidatePayload {
    pub candidate: Value,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBroadcastPayload {
    pub connection_id: String,
    pub message: String,
    pub user_info: Option<Value>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicRequestNoticePayload {
    pub connection_id: String,
    pub user_info: Option<Value>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStartedPayload {
    pub session_id: String,
    pub lecture_id: String,
    pub started_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStoppedPayload {
    pub lecture_id: String,
    pub session_id: String,
    /// Recording length in milliseconds
    pub duration: i64,
    pub stopped_at: i64,
}

/// Payload of `stream-error`, `chat-error` and `recording-error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Kebab-case error code
    pub r#type: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitedPayload {
    pub event: String,
    pub retry_after_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PongPayload {
    pub timestamp: i64,
}
