//! Shared helpers for the in-process integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use podium_server::{
    config::SignalingConfig, infrastructure::auth::StaticTokenResolver,
    infrastructure::dto::websocket::ServerEventDto, ui::Server,
};
use podium_shared::time::SystemClock;
use serde_json::Value;
use tokio::{net::TcpStream, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub const ADMIN_TOKEN: &str = "admin-secret";
pub const VIEWER_TOKEN: &str = "viewer-secret";

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// Server bound to an ephemeral port, shut down on drop
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(SignalingConfig::default()).await
    }

    pub async fn start_with(config: SignalingConfig) -> Self {
        let resolver = StaticTokenResolver::new()
            .with_admin(ADMIN_TOKEN, "lecturer")
            .with_viewer(VIEWER_TOKEN, "student");
        let server = Server::in_memory(&config, Arc::new(resolver), Arc::new(SystemClock));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = server.serve(listener, shutdown).await {
                eprintln!("test server error: {}", e);
            }
        });

        Self {
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn ws_url(&self, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/ws?token={}", self.addr, token),
            None => format!("ws://{}/ws", self.addr),
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// One WebSocket client speaking the signaling protocol
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Open a connection; the initial `stream-status` snapshot is consumed.
    pub async fn connect(server: &TestServer, token: Option<&str>) -> Self {
        let (stream, _) = connect_async(server.ws_url(token))
            .await
            .expect("Failed to connect");
        let mut client = Self { stream };
        match client.recv().await {
            ServerEventDto::StreamStatus(_) => client,
            other => panic!("expected stream-status snapshot, got {:?}", other),
        }
    }

    /// Open a connection and send `connection-established`.
    pub async fn connect_ready(server: &TestServer, token: Option<&str>) -> Self {
        let mut client = Self::connect(server, token).await;
        client.ready().await;
        client
    }

    /// Send `connection-established` and wait until it has been processed
    pub async fn ready(&mut self) {
        self.send(serde_json::json!({"event": "connection-established"}))
            .await;
        self.send(serde_json::json!({"event": "ping"})).await;
        self.recv_matching(|event| matches!(event, ServerEventDto::Pong(_)))
            .await;
    }

    pub async fn send(&mut self, event: Value) {
        self.send_raw(&event.to_string()).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Next server event
    pub async fn recv(&mut self) -> ServerEventDto {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a server event")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str())
                    .unwrap_or_else(|e| panic!("Unexpected frame {}: {}", text.as_str(), e));
            }
        }
    }

    /// Skip events until one matches `predicate`
    pub async fn recv_matching<F>(&mut self, predicate: F) -> ServerEventDto
    where
        F: Fn(&ServerEventDto) -> bool,
    {
        loop {
            let event = self.recv().await;
            if predicate(&event) {
                return event;
            }
        }
    }

    /// Whether nothing arrives within `within`
    pub async fn is_silent(&mut self, within: Duration) -> bool {
        tokio::time::timeout(within, self.stream.next()).await.is_err()
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
