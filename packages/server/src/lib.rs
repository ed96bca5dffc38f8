//! Podium signaling server library.
//!
//! Coordinates a single live lecture broadcast: stream lifecycle, viewer
//! membership, WebRTC offer/answer/ICE relay, chat, rate limiting and cleanup
//! of stale per-connection state.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// configuration
pub mod config;
