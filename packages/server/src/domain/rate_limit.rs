//! Fixed-window rate limiting for abuse-prone event types.

use std::collections::HashMap;
use std::fmt;

use super::Timestamp;

/// Default length of a counting window
pub const DEFAULT_WINDOW_MS: i64 = 60_000;

/// Event types that pass through the rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ChatMessage,
    MicRequest,
    WebrtcOffer,
    WebrtcAnswer,
    IceCandidate,
}

impl EventKind {
    /// All limited event kinds
    pub const ALL: [EventKind; 5] = [
        EventKind::ChatMessage,
        EventKind::MicRequest,
        EventKind::WebrtcOffer,
        EventKind::WebrtcAnswer,
        EventKind::IceCandidate,
    ];

    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatMessage => "chat-message",
            Self::MicRequest => "mic-request",
            Self::WebrtcOffer => "webrtc-offer",
            Self::WebrtcAnswer => "webrtc-answer",
            Self::IceCandidate => "ice-candidate",
        }
    }

    /// Limited kind named by a wire event, if any
    pub fn from_wire(event: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == event)
    }

    fn default_ceiling(&self) -> u32 {
        match self {
            Self::ChatMessage => 30,
            Self::MicRequest => 5,
            Self::WebrtcOffer => 30,
            Self::WebrtcAnswer => 30,
            // trickle ICE produces bursts of candidates per peer connection
            Self::IceCandidate => 50,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window length and per-kind ceilings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window_ms: i64,
    ceilings: HashMap<EventKind, u32>,
}

impl RateLimitPolicy {
    /// Policy with the given window and default ceilings
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms,
            ceilings: EventKind::ALL
                .iter()
                .map(|kind| (*kind, kind.default_ceiling()))
                .collect(),
        }
    }

    /// Override the ceiling of one event kind
    pub fn with_ceiling(mut self, kind: EventKind, ceiling: u32) -> Self {
        self.ceilings.insert(kind, ceiling);
        self
    }

    /// Events of `kind` accepted per window
    pub fn ceiling(&self, kind: EventKind) -> u32 {
        self.ceilings
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_ceiling())
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after_ms: i64 },
}

/// Per-connection counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitState {
    pub window_start: Timestamp,
    pub counts: HashMap<EventKind, u32>,
    pub accepted_total: u64,
    pub rejected_total: u64,
    pub last_seen: Timestamp,
}

impl RateLimitState {
    /// Fresh state whose first window starts at `now`
    pub fn new(now: Timestamp) -> Self {
        Self {
            window_start: now,
            counts: HashMap::new(),
            accepted_total: 0,
            rejected_total: 0,
            last_seen: now,
        }
    }

    /// Count one event of `kind` at `now` against `policy`.
    ///
    /// Rejected events do not consume quota.
    pub fn check_and_consume(
        &mut self,
        kind: EventKind,
        now: Timestamp,
        policy: &RateLimitPolicy,
    ) -> RateDecision {
        self.last_seen = now;
        if now.millis_since(self.window_start) >= policy.window_ms {
            self.window_start = now;
            self.counts.clear();
        }

        let count = self.counts.entry(kind).or_insert(0);
        if *count >= policy.ceiling(kind) {
            self.rejected_total += 1;
            let retry_after_ms = policy.window_ms - now.millis_since(self.window_start);
            return RateDecision::Denied {
                retry_after_ms: retry_after_ms.max(0),
            };
        }

        *count += 1;
        self.accepted_total += 1;
        RateDecision::Allowed
    }
}
