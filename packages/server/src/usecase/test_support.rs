//! Test doubles and fixtures shared by the use case tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use podium_shared::time::ManualClock;

use crate::{
    config::SignalingConfig,
    domain::{
        ConnectionId, MessagePushError, MessagePusher, Notification, Principal, PusherChannel,
        SignalingRepository, SignalingState, Timestamp,
    },
    infrastructure::repository::{InMemoryLectureCatalog, InMemorySignalingRepository},
};

use super::{
    ConnectClientUseCase, DisconnectClientUseCase, DispatchEventUseCase, SendMessageUseCase,
    StreamLifecycleUseCase, ViewerRelayUseCase,
};

/// Start time of the manual clock
pub const T0: i64 = 1_700_000_000_000;

/// MessagePusher that records every delivered notification
#[derive(Default)]
pub struct RecordingPusher {
    registered: Mutex<Vec<ConnectionId>>,
    sent: Mutex<Vec<(ConnectionId, Notification)>>,
}

impl RecordingPusher {
    /// Notifications delivered to one connection, in order
    pub fn sent_to(&self, id: &ConnectionId) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(target, _)| target == id)
            .map(|(_, n)| n.clone())
            .collect()
    }

    /// Every delivery as `(target, notification)`
    pub fn sent(&self) -> Vec<(ConnectionId, Notification)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn is_registered(&self, id: &ConnectionId) -> bool {
        self.registered.lock().unwrap().contains(id)
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_client(&self, connection_id: ConnectionId, _sender: PusherChannel) {
        self.registered.lock().unwrap().push(connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        self.registered.lock().unwrap().retain(|id| id != connection_id);
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        if !self.is_registered(connection_id) {
            return Err(MessagePushError::ClientNotFound(connection_id.to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((connection_id.clone(), notification.clone()));
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        for target in targets {
            if self.is_registered(&target) {
                self.sent
                    .lock()
                    .unwrap()
                    .push((target, notification.clone()));
            }
        }
        Ok(())
    }
}

/// In-memory coordinator wired with test doubles
pub struct Harness {
    pub repository: Arc<InMemorySignalingRepository>,
    pub pusher: Arc<RecordingPusher>,
    pub catalog: Arc<InMemoryLectureCatalog>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&SignalingConfig::default())
    }

    pub fn with_config(config: &SignalingConfig) -> Self {
        let state = SignalingState::new(config.rate_limit.clone(), config.max_pending_signals);
        Self {
            repository: Arc::new(InMemorySignalingRepository::new(Arc::new(
                tokio::sync::Mutex::new(state),
            ))),
            pusher: Arc::new(RecordingPusher::default()),
            catalog: Arc::new(InMemoryLectureCatalog::default()),
            clock: Arc::new(ManualClock::new(T0)),
        }
    }

    pub fn connect_usecase(&self) -> ConnectClientUseCase {
        ConnectClientUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
        )
    }

    pub fn disconnect_usecase(&self) -> DisconnectClientUseCase {
        DisconnectClientUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.catalog.clone(),
            self.clock.clone(),
        )
    }

    pub fn stream_usecase(&self) -> StreamLifecycleUseCase {
        StreamLifecycleUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.catalog.clone(),
            self.clock.clone(),
        )
    }

    pub fn relay_usecase(&self) -> ViewerRelayUseCase {
        ViewerRelayUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
        )
    }

    pub fn message_usecase(&self) -> SendMessageUseCase {
        SendMessageUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
        )
    }

    pub fn dispatch_usecase(&self) -> DispatchEventUseCase {
        DispatchEventUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
            self.stream_usecase(),
            self.relay_usecase(),
            self.message_usecase(),
        )
    }

    /// Register a connection without marking it ready
    pub async fn register(&self, id: &str, principal: Option<Principal>) -> ConnectionId {
        let id = ConnectionId::new(id.to_string()).unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        self.connect_usecase()
            .execute(id.clone(), principal, tx)
            .await
            .unwrap();
        id
    }

    /// Register a connection and mark it ready; clears the delivery log
    pub async fn connect(&self, id: &str, principal: Option<Principal>) -> ConnectionId {
        let id = self.register(id, principal).await;
        self.repository
            .mark_ready(&id, Timestamp::new(T0))
            .await
            .unwrap();
        self.pusher.clear();
        id
    }

    /// Ready admin that is live, plus ready viewers that joined
    pub async fn live(&self, viewers: &[&str]) -> (ConnectionId, Vec<ConnectionId>) {
        let admin = self.connect("admin", Some(Principal::admin("lecturer"))).await;
        self.stream_usecase().start_stream(&admin).await.unwrap();
        let mut joined = Vec::new();
        for viewer in viewers {
            let id = self.connect(viewer, None).await;
            self.relay_usecase().join_stream(&id, None).await.unwrap();
            joined.push(id);
        }
        self.pusher.clear();
        (admin, joined)
    }
}
