//! HTTP / WebSocket front of the signaling coordinator.

mod handler;
mod server;
mod signal;
pub mod state;
mod sweeper;

pub use server::Server;
pub use signal::shutdown_signal;
