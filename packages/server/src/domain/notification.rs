//! Outbound notifications emitted by the coordinator.
//!
//! Transport-agnostic; the WebSocket pusher encodes them into wire DTOs.

use serde_json::Value;

use super::{
    ConnectionId, ErrorChannel, FinishedRecording, LectureId, SessionId, SignalingError,
    StreamStatus, Timestamp,
};

/// Why a broadcast session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StoppedByAdmin,
    AdminDisconnected,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StoppedByAdmin => "stopped-by-admin",
            Self::AdminDisconnected => "admin-disconnected",
        }
    }
}

/// One message to deliver to one or more connections
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    StreamStarted {
        session_id: SessionId,
        started_at: Timestamp,
    },
    StreamStopped {
        session_id: SessionId,
        reason: StopReason,
    },
    ViewerJoined {
        connection_id: ConnectionId,
        viewer_info: Option<Value>,
        count: usize,
    },
    ViewerLeft {
        connection_id: ConnectionId,
        count: usize,
    },
    ViewerCountUpdated {
        count: usize,
    },
    WebrtcOffer {
        from: ConnectionId,
        offer: Value,
    },
    WebrtcAnswer {
        connection_id: ConnectionId,
        answer: Value,
    },
    IceCandidate {
        from: ConnectionId,
        candidate: Value,
    },
    ChatMessage {
        connection_id: ConnectionId,
        message: String,
        user_info: Option<Value>,
        timestamp: Timestamp,
    },
    MicRequest {
        connection_id: ConnectionId,
        user_info: Option<Value>,
        timestamp: Timestamp,
    },
    RecordingStarted {
        session_id: SessionId,
        lecture_id: LectureId,
        started_at: Timestamp,
    },
    RecordingStopped(FinishedRecording),
    StreamStatus(StreamStatus),
    Error {
        channel: ErrorChannel,
        error: SignalingError,
    },
    RateLimited {
        event: &'static str,
        retry_after_ms: Option<i64>,
    },
    Pong {
        timestamp: Timestamp,
    },
}

impl Notification {
    /// Error notification for a failed command
    pub fn error(channel: ErrorChannel, error: SignalingError) -> Self {
        Self::Error { channel, error }
    }
}
