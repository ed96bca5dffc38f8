//! InMemory Signaling Repository 実装
//!
//! ドメイン層が定義する SignalingRepository trait の具体的な実装。
//! `SignalingState` 集約を 1 つの Mutex で保護し、各メソッドを 1 つの
//! クリティカルセクションとして実行します。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::{
    Admission, Command, Connection, ConnectionId, ConnectionState, DisconnectOutcome,
    EndedSession, EventKind, LectureId, Principal, RateDecision, ReadyOutcome, SessionId,
    SignalingError, SignalingRepository, SignalingState, StartedRecording, StartedSession,
    StoppedRecording, StreamStatus, SweepReport, Timestamp, ViewerArrival, ViewerDeparture,
};

/// インメモリ Signaling Repository 実装
pub struct InMemorySignalingRepository {
    /// コーディネーターの状態集約
    state: Arc<Mutex<SignalingState>>,
}

impl InMemorySignalingRepository {
    /// 新しい InMemorySignalingRepository を作成
    pub fn new(state: Arc<Mutex<SignalingState>>) -> Self {
        Self { state }
    }
}

impl Default for InMemorySignalingRepository {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(SignalingState::default())))
    }
}

#[async_trait]
impl SignalingRepository for InMemorySignalingRepository {
    async fn register_connection(
        &self,
        id: ConnectionId,
        principal: Option<Principal>,
        now: Timestamp,
    ) -> bool {
        let mut state = self.state.lock().await;
        state.register_connection(id, principal, now)
    }

    async fn mark_ready(
        &self,
        id: &ConnectionId,
        now: Timestamp,
    ) -> Result<ReadyOutcome, SignalingError> {
        let mut state = self.state.lock().await;
        state.mark_ready(id, now)
    }

    async fn admit(
        &self,
        id: &ConnectionId,
        command: Command,
        now: Timestamp,
    ) -> Result<Admission, SignalingError> {
        let mut state = self.state.lock().await;
        state.admit(id, command, now)
    }

    async fn check_rate(
        &self,
        id: &ConnectionId,
        kind: EventKind,
        now: Timestamp,
    ) -> RateDecision {
        let mut state = self.state.lock().await;
        state.check_rate(id, kind, now)
    }

    async fn touch(&self, id: &ConnectionId, now: Timestamp) {
        let mut state = self.state.lock().await;
        state.touch(id, now);
    }

    async fn remove_connection(
        &self,
        id: &ConnectionId,
        terminal: ConnectionState,
        now: Timestamp,
    ) -> Option<DisconnectOutcome> {
        let mut state = self.state.lock().await;
        state.remove_connection(id, terminal, now)
    }

    async fn start_stream(
        &self,
        id: &ConnectionId,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<StartedSession, SignalingError> {
        let mut state = self.state.lock().await;
        state.start_stream(id, session_id, now)
    }

    async fn stop_stream(
        &self,
        id: &ConnectionId,
        now: Timestamp,
    ) -> Result<EndedSession, SignalingError> {
        let mut state = self.state.lock().await;
        state.stop_stream(id, now)
    }

    async fn start_recording(
        &self,
        id: &ConnectionId,
        lecture_id: LectureId,
        now: Timestamp,
    ) -> Result<StartedRecording, SignalingError> {
        let mut state = self.state.lock().await;
        state.start_recording(id, lecture_id, now)
    }

    async fn stop_recording(
        &self,
        id: &ConnectionId,
        now: Timestamp,
    ) -> Result<StoppedRecording, SignalingError> {
        let mut state = self.state.lock().await;
        state.stop_recording(id, now)
    }

    async fn join_stream(
        &self,
        id: &ConnectionId,
        viewer_info: Option<Value>,
        now: Timestamp,
    ) -> Result<ViewerArrival, SignalingError> {
        let mut state = self.state.lock().await;
        state.join_stream(id, viewer_info, now)
    }

    async fn leave_stream(&self, id: &ConnectionId) -> Option<ViewerDeparture> {
        let mut state = self.state.lock().await;
        state.leave_stream(id)
    }

    async fn route_offer(
        &self,
        from: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<ConnectionId, SignalingError> {
        let state = self.state.lock().await;
        state.route_offer(from, target)
    }

    async fn route_answer(&self, from: &ConnectionId) -> Result<ConnectionId, SignalingError> {
        let state = self.state.lock().await;
        state.route_answer(from)
    }

    async fn route_ice_candidate(
        &self,
        from: &ConnectionId,
        target: Option<&ConnectionId>,
    ) -> Result<ConnectionId, SignalingError> {
        let state = self.state.lock().await;
        state.route_ice_candidate(from, target)
    }

    async fn route_mic_request(
        &self,
        from: &ConnectionId,
    ) -> Result<ConnectionId, SignalingError> {
        let state = self.state.lock().await;
        state.route_mic_request(from)
    }

    async fn get_connection(&self, id: &ConnectionId) -> Option<Connection> {
        let state = self.state.lock().await;
        state.connection(id).cloned()
    }

    async fn get_all_connection_ids(&self) -> Vec<ConnectionId> {
        let state = self.state.lock().await;
        state.connection_ids()
    }

    async fn get_stream_status(&self) -> StreamStatus {
        let state = self.state.lock().await;
        state.status()
    }

    async fn sweep(&self, now: Timestamp, stale_after_ms: i64) -> SweepReport {
        let mut state = self.state.lock().await;
        state.sweep(now, stale_after_ms)
    }
}
