//! Runtime configuration of the signaling coordinator.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{
    EventKind, RateLimitPolicy, rate_limit::DEFAULT_WINDOW_MS,
    signal_queue::DEFAULT_MAX_PENDING_SIGNALS,
};

/// Default interval between two sweeps of stale state
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Default inactivity after which per-connection state counts as stale
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate limit window must be greater than zero")]
    ZeroRateWindow,

    #[error("sweep interval must be greater than zero")]
    ZeroSweepInterval,

    #[error("stale threshold must be greater than zero")]
    ZeroStaleAfter,

    #[error("pending signal queue must hold at least one entry")]
    ZeroPendingSignals,

    #[error("invalid token binding '{0}', expected TOKEN=USER_ID")]
    InvalidTokenBinding(String),
}

/// Tunables of one coordinator instance
#[derive(Debug, Clone, PartialEq)]
pub struct SignalingConfig {
    pub rate_limit: RateLimitPolicy,
    pub sweep_interval: Duration,
    pub stale_after: Duration,
    pub max_pending_signals: usize,
}

impl SignalingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.window_ms <= 0 {
            return Err(ConfigError::ZeroRateWindow);
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroSweepInterval);
        }
        if self.stale_after.is_zero() {
            return Err(ConfigError::ZeroStaleAfter);
        }
        if self.max_pending_signals == 0 {
            return Err(ConfigError::ZeroPendingSignals);
        }
        Ok(())
    }

    /// Stale threshold in milliseconds
    pub fn stale_after_ms(&self) -> i64 {
        i64::try_from(self.stale_after.as_millis()).unwrap_or(i64::MAX)
    }

    /// Summary line for startup logs
    pub fn describe(&self) -> String {
        let ceilings = EventKind::ALL
            .iter()
            .map(|kind| format!("{}={}", kind, self.rate_limit.ceiling(*kind)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "window={}ms [{}], sweep every {}s, stale after {}s, max {} pending signals",
            self.rate_limit.window_ms,
            ceilings,
            self.sweep_interval.as_secs(),
            self.stale_after.as_secs(),
            self.max_pending_signals
        )
    }
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitPolicy::new(DEFAULT_WINDOW_MS),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
            max_pending_signals: DEFAULT_MAX_PENDING_SIGNALS,
        }
    }
}

/// Parse a `TOKEN=USER_ID` pair given on the command line
pub fn parse_token_binding(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((token, user_id)) if !token.trim().is_empty() && !user_id.trim().is_empty() => {
            Ok((token.trim().to_string(), user_id.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidTokenBinding(raw.to_string())),
    }
}
