//! Core domain models for the signaling coordinator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value_object::{ConnectionId, LectureId, SessionId, Timestamp};

/// Authenticated identity attached to a connection.
///
/// Resolved by the external principal resolver; the coordinator only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
}

impl Principal {
    /// Principal with the admin capability
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            is_admin: true,
        }
    }

    /// Principal without the admin capability
    pub fn viewer(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            is_admin: false,
        }
    }
}

/// Application-level readiness of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// One transport-level client connection
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub state: ConnectionState,
    pub principal: Option<Principal>,
    pub connected_at: Timestamp,
    pub last_activity: Timestamp,
}

impl Connection {
    /// Create a connection in the `connecting` state
    pub fn new(id: ConnectionId, principal: Option<Principal>, connected_at: Timestamp) -> Self {
        Self {
            id,
            state: ConnectionState::Connecting,
            principal,
            connected_at,
            last_activity: connected_at,
        }
    }

    /// Whether the connection reached the `connected` state
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether the attached principal carries the admin capability
    pub fn is_admin(&self) -> bool {
        self.principal.as_ref().is_some_and(|p| p.is_admin)
    }

    /// Transition `connecting → connected`.
    ///
    /// Returns `true` only when the transition actually happened.
    pub fn mark_ready(&mut self) -> bool {
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Connected;
            true
        } else {
            false
        }
    }

    /// Record activity at `now`
    pub fn touch(&mut self, now: Timestamp) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }
}

/// Membership of a viewer connection in the active session
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerMembership {
    pub connection_id: ConnectionId,
    pub joined_at: Timestamp,
    /// Caller-supplied display metadata, passed through untouched
    pub viewer_info: Option<Value>,
}

/// Recording sub-state of a live session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub lecture_id: LectureId,
    pub started_at: Timestamp,
}

/// A recording that has been stopped, with its measured duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishedRecording {
    pub lecture_id: LectureId,
    pub session_id: SessionId,
    pub started_at: Timestamp,
    pub stopped_at: Timestamp,
    pub duration_ms: i64,
}

/// The single admin-owned live broadcast
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastSession {
    pub id: SessionId,
    /// Owning admin connection; `None` once the session has ended
    pub admin: Option<ConnectionId>,
    pub created_at: Timestamp,
    pub active: bool,
    /// Viewer memberships in join order
    pub viewers: Vec<ViewerMembership>,
    pub recording: Option<Recording>,
}

impl BroadcastSession {
    /// Create a live session owned by `admin`
    pub fn start(id: SessionId, admin: ConnectionId, created_at: Timestamp) -> Self {
        Self {
            id,
            admin: Some(admin),
            created_at,
            active: true,
            viewers: Vec::new(),
            recording: None,
        }
    }

    /// Number of viewer memberships
    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    /// Whether `connection_id` owns this session and it is live
    pub fn is_owned_by(&self, connection_id: &ConnectionId) -> bool {
        self.active && self.admin.as_ref() == Some(connection_id)
    }

    /// Whether `connection_id` is a viewer of this session
    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.viewers
            .iter()
            .any(|m| &m.connection_id == connection_id)
    }

    /// Add or refresh a viewer membership.
    ///
    /// Returns `true` when the viewer was not a member before.
    pub fn add_viewer(&mut self, membership: ViewerMembership) -> bool {
        if let Some(existing) = self
            .viewers
            .iter_mut()
            .find(|m| m.connection_id == membership.connection_id)
        {
            existing.viewer_info = membership.viewer_info;
            return false;
        }
        self.viewers.push(membership);
        true
    }

    /// Remove a viewer membership. Returns `true` if it existed.
    pub fn remove_viewer(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.viewers.len();
        self.viewers.retain(|m| &m.connection_id != connection_id);
        self.viewers.len() != before
    }

    /// Stop the running recording at `now`
    pub fn finish_recording(&mut self, now: Timestamp) -> Option<FinishedRecording> {
        self.recording.take().map(|recording| FinishedRecording {
            lecture_id: recording.lecture_id,
            session_id: self.id.clone(),
            started_at: recording.started_at,
            stopped_at: now,
            duration_ms: now.millis_since(recording.started_at),
        })
    }

    /// Deactivate the session, dropping owner and memberships.
    ///
    /// Returns the viewers that were members at the time.
    pub fn end(&mut self) -> Vec<ConnectionId> {
        self.active = false;
        self.admin = None;
        self.recording = None;
        self.viewers
            .drain(..)
            .map(|m| m.connection_id)
            .collect()
    }
}

/// Snapshot of the stream state served to clients
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamStatus {
    pub is_live: bool,
    pub session_id: Option<SessionId>,
    pub started_at: Option<Timestamp>,
    pub viewer_count: usize,
    pub is_recording: bool,
    pub lecture_id: Option<LectureId>,
    pub recording_started_at: Option<Timestamp>,
}

impl StreamStatus {
    /// Build the snapshot for the given (possibly ended) session
    pub fn of(session: Option<&BroadcastSession>) -> Self {
        match session {
            Some(session) if session.active => Self {
                is_live: true,
                session_id: Some(session.id.clone()),
                started_at: Some(session.created_at),
                viewer_count: session.viewer_count(),
                is_recording: session.recording.is_some(),
                lecture_id: session.recording.as_ref().map(|r| r.lecture_id.clone()),
                recording_started_at: session.recording.as_ref().map(|r| r.started_at),
            },
            _ => Self::default(),
        }
    }
}
