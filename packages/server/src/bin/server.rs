//! Podium signaling server.
//!
//! Coordinates one live lecture: the admin's broadcast session, viewer
//! membership, WebRTC signal relay, chat and recording bookkeeping.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin podium-server
//! cargo run --bin podium-server -- --host 0.0.0.0 --port 3000 --admin-token secret=lecturer
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use podium_server::{
    config::{ConfigError, SignalingConfig, parse_token_binding},
    domain::{EventKind, RateLimitPolicy},
    infrastructure::auth::StaticTokenResolver,
    ui::Server,
};
use podium_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "podium-server")]
#[command(about = "WebRTC signaling server for live lectures", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "PODIUM_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PODIUM_PORT", default_value = "8080")]
    port: u16,

    /// Length of a rate-limit window in seconds
    #[arg(long, env = "PODIUM_RATE_WINDOW_SECS", default_value = "60")]
    rate_window_secs: u64,

    /// chat-message events allowed per window
    #[arg(long, env = "PODIUM_CHAT_LIMIT", default_value = "30")]
    chat_limit: u32,

    /// mic-request events allowed per window
    #[arg(long, env = "PODIUM_MIC_LIMIT", default_value = "5")]
    mic_limit: u32,

    /// webrtc-offer events allowed per window
    #[arg(long, env = "PODIUM_OFFER_LIMIT", default_value = "30")]
    offer_limit: u32,

    /// webrtc-answer events allowed per window
    #[arg(long, env = "PODIUM_ANSWER_LIMIT", default_value = "30")]
    answer_limit: u32,

    /// ice-candidate events allowed per window
    #[arg(long, env = "PODIUM_ICE_LIMIT", default_value = "50")]
    ice_limit: u32,

    /// Seconds between two sweeps of stale state
    #[arg(long, env = "PODIUM_SWEEP_INTERVAL_SECS", default_value = "300")]
    sweep_interval_secs: u64,

    /// Inactivity in seconds after which rate-limit state and queued signals are dropped
    #[arg(long, env = "PODIUM_STALE_AFTER_SECS", default_value = "300")]
    stale_after_secs: u64,

    /// Commands a connection may queue before sending connection-established
    #[arg(long, env = "PODIUM_MAX_PENDING_SIGNALS", default_value = "64")]
    max_pending_signals: usize,

    /// Admin token binding, TOKEN=USER_ID (repeatable)
    #[arg(long = "admin-token", env = "PODIUM_ADMIN_TOKENS", value_delimiter = ',')]
    admin_tokens: Vec<String>,

    /// Viewer token binding, TOKEN=USER_ID (repeatable)
    #[arg(long = "viewer-token", env = "PODIUM_VIEWER_TOKENS", value_delimiter = ',')]
    viewer_tokens: Vec<String>,
}

impl Args {
    fn signaling_config(&self) -> SignalingConfig {
        let window_ms = i64::try_from(Duration::from_secs(self.rate_window_secs).as_millis())
            .unwrap_or(i64::MAX);
        let rate_limit = RateLimitPolicy::new(window_ms)
            .with_ceiling(EventKind::ChatMessage, self.chat_limit)
            .with_ceiling(EventKind::MicRequest, self.mic_limit)
            .with_ceiling(EventKind::WebrtcOffer, self.offer_limit)
            .with_ceiling(EventKind::WebrtcAnswer, self.answer_limit)
            .with_ceiling(EventKind::IceCandidate, self.ice_limit);

        SignalingConfig {
            rate_limit,
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            stale_after: Duration::from_secs(self.stale_after_secs),
            max_pending_signals: self.max_pending_signals,
        }
    }

    fn token_resolver(&self) -> Result<StaticTokenResolver, ConfigError> {
        let mut resolver = StaticTokenResolver::new();
        for binding in &self.admin_tokens {
            let (token, user_id) = parse_token_binding(binding)?;
            resolver = resolver.with_admin(token, user_id);
        }
        for binding in &self.viewer_tokens {
            let (token, user_id) = parse_token_binding(binding)?;
            resolver = resolver.with_viewer(token, user_id);
        }
        Ok(resolver)
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let config = args.signaling_config();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    let resolver = match args.token_resolver() {
        Ok(resolver) => resolver,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if resolver.is_empty() {
        tracing::warn!("No tokens configured; every connection joins as an anonymous viewer");
    }
    tracing::info!("Signaling config: {}", config.describe());
    tracing::info!("{} token(s) registered", resolver.len());

    let server = Server::in_memory(&config, Arc::new(resolver), Arc::new(SystemClock));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
