//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, ConnectionIdFactory, ConnectionState, ErrorChannel, Principal,
        SignalingError,
    },
    infrastructure::dto::conversion::{InvalidEvent, decode_client_event},
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Bearer token; anonymous viewers connect without one
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // トークンが提示された場合は、アップグレード前に解決する
    let principal = match query.token.as_deref().filter(|token| !token.is_empty()) {
        Some(token) => match state.principal_resolver.resolve(token).await {
            Ok(principal) => Some(principal),
            Err(e) => {
                tracing::warn!("Rejecting WebSocket upgrade: {}", e);
                return Err(StatusCode::UNAUTHORIZED);
            }
        },
        None => None,
    };

    let connection_id = match ConnectionIdFactory::generate() {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to generate connection id: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id, principal)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// Notifications for this connection arrive on `rx` from the MessagePusher
/// and leave in the order they were queued.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Reads inbound frames one at a time, so events of a connection are
/// handled in arrival order.
///
/// Returns the state the connection ended in.
async fn receive_loop(
    mut receiver: futures_util::stream::SplitStream<WebSocket>,
    state: Arc<AppState>,
    connection_id: ConnectionId,
) -> ConnectionState {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                return ConnectionState::Error;
            }
        };

        match msg {
            Message::Text(text) => {
                tracing::debug!("Received from '{}': {}", connection_id, text.as_str());
                match decode_client_event(text.as_str()) {
                    Ok(command) => {
                        state
                            .dispatch_event_usecase
                            .execute(&connection_id, command)
                            .await;
                    }
                    Err(InvalidEvent {
                        channel,
                        error,
                        kind,
                    }) => {
                        tracing::warn!("Invalid event from '{}': {}", connection_id, error);
                        state
                            .dispatch_event_usecase
                            .reject(&connection_id, kind, channel, error)
                            .await;
                    }
                }
            }
            Message::Binary(_) => {
                state
                    .dispatch_event_usecase
                    .reject(
                        &connection_id,
                        None,
                        ErrorChannel::Stream,
                        SignalingError::InvalidPayload("binary frames are not supported".into()),
                    )
                    .await;
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", connection_id);
                break;
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            _ => {}
        }
    }
    ConnectionState::Disconnected
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    principal: Option<Principal>,
) {
    let (tx, rx) = mpsc::unbounded_channel();

    // Use ConnectClientUseCase to register the connection
    // (register_client is called inside the UseCase)
    if let Err(e) = state
        .connect_client_usecase
        .execute(connection_id.clone(), principal, tx)
        .await
    {
        tracing::warn!("Rejecting connection: {}", e);
        return;
    }
    tracing::info!("Connection '{}' opened", connection_id);

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);
    let mut recv_task = tokio::spawn(receive_loop(
        receiver,
        state.clone(),
        connection_id.clone(),
    ));

    // If any one of the tasks completes, abort the other
    let terminal = tokio::select! {
        result = &mut recv_task => {
            send_task.abort();
            result.unwrap_or(ConnectionState::Error)
        }
        _ = &mut send_task => {
            recv_task.abort();
            ConnectionState::Disconnected
        }
    };

    // Use DisconnectClientUseCase to clean up unconditionally
    match state
        .disconnect_client_usecase
        .execute(connection_id.clone(), terminal)
        .await
    {
        Ok(outcome) => {
            tracing::info!(
                "Connection '{}' closed ({:?}){}",
                connection_id,
                terminal,
                if outcome.ended_session.is_some() {
                    ", stream ended"
                } else {
                    ""
                }
            );
        }
        Err(e) => {
            tracing::warn!("Failed to disconnect '{}': {}", connection_id, e);
        }
    }
}
