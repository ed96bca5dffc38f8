//! The coordinator's state aggregate.
//!
//! `SignalingState` owns every piece of shared mutable state: connections, the
//! broadcast session with its memberships, rate-limit counters and pending
//! signal queues. All transitions are plain synchronous methods; the caller is
//! responsible for serializing access (the in-memory repository keeps it
//! behind a single mutex).

use std::collections::HashMap;

use serde_json::Value;

use super::{
    BroadcastSession, Command, Connection, ConnectionId, ConnectionState, EventKind,
    FinishedRecording, LectureId, PendingSignal, PendingSignalQueue, Principal, RateDecision,
    RateLimitPolicy, RateLimitState, Recording, SessionId, SignalingError, StreamStatus, Timestamp,
    ViewerMembership, signal_queue::DEFAULT_MAX_PENDING_SIGNALS,
};

/// What to do with an inbound command
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// The connection is ready; handle the command now
    Proceed(Command),
    /// The command was queued until the connection becomes ready
    Deferred,
}

/// Result of `mark_ready`
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyOutcome {
    pub newly_ready: bool,
    /// Commands to replay, in enqueue order
    pub replay: Vec<PendingSignal>,
}

/// A freshly started session
#[derive(Debug, Clone, PartialEq)]
pub struct StartedSession {
    pub session_id: SessionId,
    pub started_at: Timestamp,
    pub audience: Vec<ConnectionId>,
}

/// A session that was just deactivated
#[derive(Debug, Clone, PartialEq)]
pub struct EndedSession {
    pub session_id: SessionId,
    /// Viewers that were members when the session ended
    pub viewers: Vec<ConnectionId>,
    /// Recording finalised as part of ending the session
    pub recording: Option<FinishedRecording>,
    /// Every connection still registered
    pub audience: Vec<ConnectionId>,
}

/// A recording that was just started
#[derive(Debug, Clone, PartialEq)]
pub struct StartedRecording {
    pub session_id: SessionId,
    pub lecture_id: LectureId,
    pub started_at: Timestamp,
    pub audience: Vec<ConnectionId>,
}

/// A recording that was just stopped
#[derive(Debug, Clone, PartialEq)]
pub struct StoppedRecording {
    pub recording: FinishedRecording,
    pub audience: Vec<ConnectionId>,
}

/// A viewer joined (or re-joined) the active session
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerArrival {
    pub admin: ConnectionId,
    pub count: usize,
    pub newly_joined: bool,
    pub audience: Vec<ConnectionId>,
}

/// A viewer left the active session
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerDeparture {
    pub admin: Option<ConnectionId>,
    pub count: usize,
    pub audience: Vec<ConnectionId>,
}

/// Everything released when a connection goes away
#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectOutcome {
    /// The removed connection, in its terminal state
    pub connection: Connection,
    /// Set when the connection owned the active session
    pub ended_session: Option<EndedSession>,
    /// Set when the connection was a viewer of the active session
    pub departure: Option<ViewerDeparture>,
}

/// What a sweep removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub rate_limits_removed: usize,
    pub queues_removed: usize,
    pub signals_dropped: usize,
    pub sessions_removed: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Shared state of one signaling coordinator
#[derive(Debug, Clone)]
pub struct SignalingState {
    connections: HashMap<ConnectionId, Connection>,
    session: Option<BroadcastSession>,
    rate_limits: HashMap<ConnectionId, RateLimitState>,
    pending: HashMap<ConnectionId, PendingSignalQueue>,
    policy: RateLimitPolicy,
    max_pending_signals: usize,
}

impl SignalingState {
    pub fn new(policy: RateLimitPolicy, max_pending_signals: usize) -> Self {
        Self {
            connections: HashMap::new(),
            session: None,
            rate_limits: HashMap::new(),
            pending: HashMap::new(),
            policy,
            max_pending_signals,
        }
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Register a connection in the `connecting` state.
    ///
    /// Returns `false` if the id is already registered.
    pub fn register_connection(
        &mut self,
        id: ConnectionId,
        principal: Option<Principal>,
        now: Timestamp,
    ) -> bool {
        if self.connections.contains_key(&id) {
            return false;
        }
        self.connections
            .insert(id.clone(), Connection::new(id, principal, now));
        true
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().cloned().collect()
    }

    pub fn session(&self) -> Option<&BroadcastSession> {
        self.session.as_ref()
    }

    pub fn rate_limit_state(&self, id: &ConnectionId) -> Option<&RateLimitState> {
        self.rate_limits.get(id)
    }

    pub fn pending_len(&self, id: &ConnectionId) -> usize {
        self.pending.get(id).map_or(0, PendingSignalQueue::len)
    }

    /// Record activity on a connection
    pub fn touch(&mut self, id: &ConnectionId, now: Timestamp) {
        if let Some(connection) = self.connections.get_mut(id) {
            connection.touch(now);
        }
    }

    /// Transition a connection to `connected` and hand back its queued commands.
    ///
    /// Idempotent: a connection that is already ready gets an empty replay.
    pub fn mark_ready(
        &mut self,
        id: &ConnectionId,
        now: Timestamp,
    ) -> Result<ReadyOutcome, SignalingError> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| SignalingError::UnknownConnection(id.to_string()))?;
        let newly_ready = connection.mark_ready();
        connection.touch(now);

        let replay = self
            .pending
            .remove(id)
            .map(|mut queue| queue.drain())
            .unwrap_or_default();

        Ok(ReadyOutcome {
            newly_ready,
            replay,
        })
    }

    /// Decide whether a command runs now or waits for the connection to be ready.
    pub fn admit(
        &mut self,
        id: &ConnectionId,
        command: Command,
        now: Timestamp,
    ) -> Result<Admission, SignalingError> {
        let connection = self
            .connections
            .get(id)
            .ok_or_else(|| SignalingError::UnknownConnection(id.to_string()))?;
        if connection.is_ready() || !command.is_deferrable() {
            return Ok(Admission::Proceed(command));
        }

        let capacity = self.max_pending_signals;
        self.pending
            .entry(id.clone())
            .or_insert_with(|| PendingSignalQueue::new(capacity))
            .push(command, now)
            .map(|()| Admission::Deferred)
            .map_err(|rejected| SignalingError::RateLimited {
                event: rejected.name(),
            })
    }

    /// Count one rate-limited event for a connection
    pub fn check_rate(
        &mut self,
        id: &ConnectionId,
        kind: EventKind,
        now: Timestamp,
    ) -> RateDecision {
        let policy = &self.policy;
        self.rate_limits
            .entry(id.clone())
            .or_insert_with(|| RateLimitState::new(now))
            .check_and_consume(kind, now, policy)
    }

    /// Remove a connection and everything hanging off it.
    ///
    /// Ends the session when the connection owned it and drops its membership
    /// when it was a viewer. Returns `None` for unknown connections.
    pub fn remove_connection(
        &mut self,
        id: &ConnectionId,
        terminal: ConnectionState,
        now: Timestamp,
    ) -> Option<DisconnectOutcome> {
        let mut connection = self.connections.remove(id)?;
        connection.state = terminal;
        self.rate_limits.remove(id);
        self.pending.remove(id);

        let audience = self.connection_ids();
        let mut ended_session = None;
        let mut departure = None;

        if let Some(session) = self.session.as_mut().filter(|s| s.active) {
            if session.is_owned_by(id) {
                let recording = session.finish_recording(now);
                let viewers = session.end();
                ended_session = Some(EndedSession {
                    session_id: session.id.clone(),
                    viewers,
                    recording,
                    audience,
                });
            } else if session.remove_viewer(id) {
                departure = Some(ViewerDeparture {
                    admin: session.admin.clone(),
                    count: session.viewer_count(),
                    audience,
                });
            }
        }

        Some(DisconnectOutcome {
            connection,
            ended_session,
            departure,
        })
    }

    // ------------------------------------------------------------------
    // Stream lifecycle
    // ------------------------------------------------------------------

    pub fn start_stream(
        &mut self,
        id: &ConnectionId,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<StartedSession, SignalingError> {
        let connection = self.require_connection(id)?;
        if !connection.is_admin() {
            return Err(SignalingError::Unauthorized);
        }
        if !connection.is_ready() {
            return Err(SignalingError::Forbidden("connection is not ready yet"));
        }
        if self.session.as_ref().is_some_and(|s| s.active) {
            return Err(SignalingError::AlreadyActive);
        }

        self.session = Some(BroadcastSession::start(session_id.clone(), id.clone(), now));
        Ok(StartedSession {
            session_id,
            started_at: now,
            audience: self.connection_ids(),
        })
    }

    pub fn stop_stream(
        &mut self,
        id: &ConnectionId,
        now: Timestamp,
    ) -> Result<EndedSession, SignalingError> {
        let audience = self.connection_ids();
        let session = self.owned_session_mut(id)?;
        let recording = session.finish_recording(now);
        let viewers = session.end();
        Ok(EndedSession {
            session_id: session.id.clone(),
            viewers,
            recording,
            audience,
        })
    }

    pub fn start_recording(
        &mut self,
        id: &ConnectionId,
        lecture_id: LectureId,
        now: Timestamp,
    ) -> Result<StartedRecording, SignalingError> {
        let audience = self.connection_ids();
        let session = self.owned_session_mut(id)?;
        if session.recording.is_some() {
            return Err(SignalingError::AlreadyRecording);
        }
        session.recording = Some(Recording {
            lecture_id: lecture_id.clone(),
            started_at: now,
        });
        Ok(StartedRecording {
            session_id: session.id.clone(),
            lecture_id,
            started_at: now,
            audience,
        })
    }

    pub fn stop_recording(
        &mut self,
        id: &ConnectionId,
        now: Timestamp,
    ) -> Result<StoppedRecording, SignalingError> {
        let audience = self.connection_ids();
        let session = self.owned_session_mut(id)?;
        let recording = session
            .finish_recording(now)
            .ok_or(SignalingError::NotRecording)?;
        Ok(StoppedRecording {
            recording,
            audience,
        })
    }

    pub fn status(&self) -> StreamStatus {
        StreamStatus::of(self.session.as_ref())
    }

    // ------------------------------------------------------------------
    // Viewer membership & relay routing
    // ------------------------------------------------------------------

    pub fn join_stream(
        &mut self,
        id: &ConnectionId,
        viewer_info: Option<Value>,
        now: Timestamp,
    ) -> Result<ViewerArrival, SignalingError> {
        self.require_connection(id)?;
        let audience = self.connection_ids();
        let session = self
            .session
            .as_mut()
            .filter(|s| s.active)
            .ok_or(SignalingError::NoActiveSession)?;
        if session.is_owned_by(id) {
            return Err(SignalingError::Forbidden(
                "the stream owner cannot join as a viewer",
            ));
        }
        let admin = session
            .admin
            .clone()
            .ok_or(SignalingError::NoActiveSession)?;

        let newly_joined = session.add_viewer(ViewerMembership {
            connection_id: id.clone(),
            joined_at: now,
            viewer_info,
        });
        Ok(ViewerArrival {
            admin,
            count: session.viewer_count(),
            newly_joined,
            audience,
        })
    }

    /// Drop a viewer's membership; `None` when it was not a member
    pub fn leave_stream(&mut self, id: &ConnectionId) -> Option<ViewerDeparture> {
        let audience = self.connection_ids();
        let session = self.session.as_mut().filter(|s| s.active)?;
        if !session.remove_viewer(id) {
            return None;
        }
        Some(ViewerDeparture {
            admin: session.admin.clone(),
            count: session.viewer_count(),
            audience,
        })
    }

    /// Destination of an offer sent by the session owner
    pub fn route_offer(
        &self,
        from: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<ConnectionId, SignalingError> {
        let session = self.active_session()?;
        if !session.is_owned_by(from) {
            return Err(SignalingError::Forbidden(
                "only the stream owner may send offers",
            ));
        }
        if !session.is_member(target) {
            return Err(SignalingError::TargetNotFound(target.to_string()));
        }
        Ok(target.clone())
    }

    /// Destination of an answer sent by a viewer (always the session owner)
    pub fn route_answer(&self, from: &ConnectionId) -> Result<ConnectionId, SignalingError> {
        let session = self.active_session()?;
        if !session.is_member(from) {
            return Err(SignalingError::Forbidden(
                "join the stream before sending an answer",
            ));
        }
        session.admin.clone().ok_or(SignalingError::NoActiveSession)
    }

    /// Destination of an ICE candidate.
    ///
    /// The owner must name a member target; members always reach the owner.
    pub fn route_ice_candidate(
        &self,
        from: &ConnectionId,
        target: Option<&ConnectionId>,
    ) -> Result<ConnectionId, SignalingError> {
        let session = self.active_session()?;
        if session.is_owned_by(from) {
            let target = target.ok_or_else(|| {
                SignalingError::InvalidPayload(
                    "targetViewerId is required for candidates sent by the stream owner"
                        .to_string(),
                )
            })?;
            if !session.is_member(target) {
                return Err(SignalingError::TargetNotFound(target.to_string()));
            }
            return Ok(target.clone());
        }
        if !session.is_member(from) {
            return Err(SignalingError::Forbidden(
                "join the stream before sending candidates",
            ));
        }
        session.admin.clone().ok_or(SignalingError::NoActiveSession)
    }

    /// Destination of a microphone request (the session owner)
    pub fn route_mic_request(&self, from: &ConnectionId) -> Result<ConnectionId, SignalingError> {
        let session = self.active_session()?;
        if !session.is_member(from) {
            return Err(SignalingError::Forbidden(
                "join the stream before requesting the microphone",
            ));
        }
        session.admin.clone().ok_or(SignalingError::NoActiveSession)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Release per-connection state that has been idle for `stale_after_ms`.
    pub fn sweep(&mut self, now: Timestamp, stale_after_ms: i64) -> SweepReport {
        let cutoff = Timestamp::new(now.value().saturating_sub(stale_after_ms));
        let connections = &self.connections;
        let is_fresh = |id: &ConnectionId| {
            connections
                .get(id)
                .is_some_and(|c| c.last_activity >= cutoff)
        };
        let mut report = SweepReport::default();

        let before = self.rate_limits.len();
        self.rate_limits.retain(|id, _| is_fresh(id));
        report.rate_limits_removed = before - self.rate_limits.len();

        for queue in self.pending.values_mut() {
            report.signals_dropped += queue.prune_older_than(cutoff);
        }
        let before = self.pending.len();
        self.pending
            .retain(|id, queue| connections.contains_key(id) && !queue.is_empty());
        report.queues_removed = before - self.pending.len();

        if self
            .session
            .as_ref()
            .is_some_and(|s| !s.active && s.admin.is_none() && s.viewers.is_empty())
        {
            self.session = None;
            report.sessions_removed = 1;
        }

        report
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn require_connection(&self, id: &ConnectionId) -> Result<&Connection, SignalingError> {
        self.connections
            .get(id)
            .ok_or_else(|| SignalingError::UnknownConnection(id.to_string()))
    }

    fn active_session(&self) -> Result<&BroadcastSession, SignalingError> {
        self.session
            .as_ref()
            .filter(|s| s.active)
            .ok_or(SignalingError::NoActiveSession)
    }

    fn owned_session_mut(
        &mut self,
        id: &ConnectionId,
    ) -> Result<&mut BroadcastSession, SignalingError> {
        let session = self
            .session
            .as_mut()
            .filter(|s| s.active)
            .ok_or(SignalingError::NoActiveSession)?;
        if !session.is_owned_by(id) {
            return Err(SignalingError::Forbidden(
                "only the stream owner may do this",
            ));
        }
        Ok(session)
    }
}

impl Default for SignalingState {
    fn default() -> Self {
        Self::new(
            RateLimitPolicy::default(),
            DEFAULT_MAX_PENDING_SIGNALS,
        )
    }
}
