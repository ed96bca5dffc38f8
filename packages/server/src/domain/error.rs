//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,

    #[error("ConnectionId cannot exceed {max} characters (got {actual})")]
    ConnectionIdTooLong { max: usize, actual: usize },

    #[error("SessionId cannot be empty")]
    SessionIdEmpty,

    #[error("LectureId cannot be empty")]
    LectureIdEmpty,

    #[error("LectureId cannot exceed {max} characters (got {actual})")]
    LectureIdTooLong { max: usize, actual: usize },

    #[error("chat message cannot be empty")]
    ChatTextEmpty,

    #[error("chat message cannot exceed {max} characters (got {actual})")]
    ChatTextTooLong { max: usize, actual: usize },
}

/// Errors produced by the signaling state machine.
///
/// Every variant is reported back to the originating connection only; none of
/// them is fatal to the coordinator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalingError {
    /// The caller lacks the admin capability
    #[error("admin privileges are required to start a stream")]
    Unauthorized,

    /// The caller is not allowed to act on the current session
    #[error("{0}")]
    Forbidden(&'static str),

    /// A broadcast session is already live
    #[error("a stream is already active")]
    AlreadyActive,

    /// No broadcast session is live
    #[error("no stream is currently active")]
    NoActiveSession,

    /// Relay target is not a member of the active session
    #[error("viewer '{0}' is not connected to the stream")]
    TargetNotFound(String),

    /// Soft rejection by the rate limiter or a full pending-signal queue
    #[error("too many '{event}' events, slow down")]
    RateLimited { event: &'static str },

    /// Inbound event data did not match the expected shape
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Recording requested while one is already running
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// Recording stop requested while nothing is being recorded
    #[error("no recording is in progress")]
    NotRecording,

    /// The connection is not registered with the coordinator
    #[error("connection '{0}' is not registered")]
    UnknownConnection(String),
}

impl SignalingError {
    /// Wire-level error code carried in `*-error` notifications
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::AlreadyActive => "already-active",
            Self::NoActiveSession => "no-active-session",
            Self::TargetNotFound(_) => "target-not-found",
            Self::RateLimited { .. } => "rate-limited",
            Self::InvalidPayload(_) => "invalid-payload",
            Self::AlreadyRecording => "already-recording",
            Self::NotRecording => "not-recording",
            Self::UnknownConnection(_) => "unknown-connection",
        }
    }
}

impl From<ValueObjectError> for SignalingError {
    fn from(err: ValueObjectError) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

/// Errors raised by the lecture catalog collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("lecture catalog unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while resolving a principal from a bearer token
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthenticated")]
    Unauthenticated,
}

/// Errors related to pushing messages to clients
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessagePushError {
    /// Client not found in the pusher's registry
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Failed to push message to client
    #[error("Failed to push message: {0}")]
    PushFailed(String),

    /// Notification could not be encoded
    #[error("Failed to encode message: {0}")]
    EncodeFailed(String),
}
