//! Domain layer: value objects, the signaling state aggregate and the
//! interfaces it needs from the outside world.

pub mod auth;
pub mod command;
pub mod entity;
pub mod error;
pub mod factory;
pub mod message_pusher;
pub mod notification;
pub mod rate_limit;
pub mod repository;
pub mod signal_queue;
pub mod state;
pub mod value_object;

pub use auth::PrincipalResolver;
#[cfg(test)]
pub use auth::MockPrincipalResolver;
pub use command::{Command, ErrorChannel};
pub use entity::{
    BroadcastSession, Connection, ConnectionState, FinishedRecording, Principal, Recording,
    StreamStatus, ViewerMembership,
};
pub use error::{AuthError, CatalogError, MessagePushError, SignalingError, ValueObjectError};
pub use factory::{ConnectionIdFactory, SessionIdFactory};
pub use message_pusher::{MessagePusher, PusherChannel};
#[cfg(test)]
pub use message_pusher::MockMessagePusher;
pub use notification::{Notification, StopReason};
pub use rate_limit::{EventKind, RateDecision, RateLimitPolicy, RateLimitState};
pub use repository::{LectureCatalog, SignalingRepository};
pub use signal_queue::{PendingSignal, PendingSignalQueue};
pub use state::{
    Admission, DisconnectOutcome, EndedSession, ReadyOutcome, SignalingState, StartedRecording,
    StartedSession, StoppedRecording, SweepReport, ViewerArrival, ViewerDeparture,
};
pub use value_object::{ChatText, ConnectionId, LectureId, SessionId, Timestamp};
