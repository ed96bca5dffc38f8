//! Server execution logic.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use podium_shared::time::Clock;
use tokio::{
    net::TcpListener,
    sync::{Mutex, watch},
};
use tower_http::trace::TraceLayer;

use crate::{
    config::SignalingConfig,
    domain::{PrincipalResolver, SignalingState},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryLectureCatalog, InMemorySignalingRepository},
    },
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, DispatchEventUseCase,
        GetStreamStatusUseCase, ListRecordingsUseCase, SendMessageUseCase,
        StreamLifecycleUseCase, SweepStaleStateUseCase, ViewerRelayUseCase,
    },
};

use super::{
    handler::{get_recordings, get_stream_status, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
    sweeper::spawn_sweeper,
};

/// WebRTC signaling server
///
/// This struct holds the wired use cases and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::in_memory(&SignalingConfig::default(), resolver, Arc::new(SystemClock));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    app_state: Arc<AppState>,
    /// SweepStaleStateUseCase（定期スイープのユースケース）
    sweep_usecase: Arc<SweepStaleStateUseCase>,
    sweep_interval: Duration,
}

impl Server {
    /// Create a new Server instance from already wired use cases
    pub fn new(
        app_state: AppState,
        sweep_usecase: Arc<SweepStaleStateUseCase>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            app_state: Arc::new(app_state),
            sweep_usecase,
            sweep_interval,
        }
    }

    /// Wire every use case against the in-memory repository, catalog and
    /// WebSocket pusher.
    ///
    /// Initialization order:
    /// 1. Repository / LectureCatalog
    /// 2. MessagePusher
    /// 3. UseCases
    /// 4. AppState
    pub fn in_memory(
        config: &SignalingConfig,
        principal_resolver: Arc<dyn PrincipalResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // 1. Repository（インメモリ）
        let state = SignalingState::new(config.rate_limit.clone(), config.max_pending_signals);
        let repository = Arc::new(InMemorySignalingRepository::new(Arc::new(Mutex::new(
            state,
        ))));
        let catalog = Arc::new(InMemoryLectureCatalog::default());

        // 2. MessagePusher（WebSocket 実装）
        let message_pusher = Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
            HashMap::new(),
        ))));

        // 3. UseCases
        let connect_client_usecase = Arc::new(ConnectClientUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            clock.clone(),
        ));
        let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            catalog.clone(),
            clock.clone(),
        ));
        let dispatch_event_usecase = Arc::new(DispatchEventUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            clock.clone(),
            StreamLifecycleUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                catalog.clone(),
                clock.clone(),
            ),
            ViewerRelayUseCase::new(repository.clone(), message_pusher.clone(), clock.clone()),
            SendMessageUseCase::new(repository.clone(), message_pusher.clone(), clock.clone()),
        ));
        let get_stream_status_usecase = Arc::new(GetStreamStatusUseCase::new(repository.clone()));
        let list_recordings_usecase = Arc::new(ListRecordingsUseCase::new(catalog));
        let sweep_usecase = Arc::new(SweepStaleStateUseCase::new(
            repository,
            clock,
            config.stale_after_ms(),
        ));

        // 4. AppState
        let app_state = AppState {
            principal_resolver,
            connect_client_usecase,
            disconnect_client_usecase,
            dispatch_event_usecase,
            get_stream_status_usecase,
            list_recordings_usecase,
        };

        Self::new(app_state, sweep_usecase, config.sweep_interval)
    }

    /// Routes served by the coordinator
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/stream/status", get(get_stream_status))
            .route("/api/recordings", get(get_recordings))
            .layer(TraceLayer::new_for_http())
            .with_state(self.app_state.clone())
    }

    /// Run the signaling server until Ctrl+C or SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Signaling server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// The stale-state sweeper runs for the lifetime of the server.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let sweeper = spawn_sweeper(self.sweep_usecase.clone(), self.sweep_interval, stop_rx);

        let app = self.router();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        let _ = stop_tx.send(true);
        if let Err(e) = sweeper.await {
            tracing::warn!("Sweeper task ended abnormally: {}", e);
        }
        result
    }
}
