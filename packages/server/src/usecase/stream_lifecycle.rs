//! UseCase: 配信・録画のライフサイクル
//!
//! `idle → live → idle` の状態遷移と、live 中にのみ有効な録画サブ状態を扱います。

use std::sync::Arc;

use podium_shared::time::Clock;

use crate::domain::{
    ConnectionId, EndedSession, FinishedRecording, LectureCatalog, LectureId, MessagePusher,
    Notification, SessionIdFactory, SignalingError, SignalingRepository, StartedRecording,
    StartedSession, StopReason, Timestamp,
};

use super::notify::{announce_session_end, broadcast_or_log, tag_or_log};

/// 配信ライフサイクルのユースケース
pub struct StreamLifecycleUseCase {
    repository: Arc<dyn SignalingRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    catalog: Arc<dyn LectureCatalog>,
    clock: Arc<dyn Clock>,
}

impl StreamLifecycleUseCase {
    pub fn new(
        repository: Arc<dyn SignalingRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        catalog: Arc<dyn LectureCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            catalog,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// 配信を開始し、全員に `stream-started` を送る
    pub async fn start_stream(
        &self,
        admin: &ConnectionId,
    ) -> Result<StartedSession, SignalingError> {
        let now = self.now();
        let session_id = SessionIdFactory::generate(now)?;
        let started = self.repository.start_stream(admin, session_id, now).await?;
        tracing::info!("Stream '{}' started by '{}'", started.session_id, admin);

        broadcast_or_log(
            self.message_pusher.as_ref(),
            started.audience.clone(),
            &Notification::StreamStarted {
                session_id: started.session_id.clone(),
                started_at: started.started_at,
            },
        )
        .await;
        Ok(started)
    }

    /// 配信を停止し、全員に `stream-stopped` を送る
    pub async fn stop_stream(&self, admin: &ConnectionId) -> Result<EndedSession, SignalingError> {
        let ended = self.repository.stop_stream(admin, self.now()).await?;
        tracing::info!(
            "Stream '{}' stopped by '{}' ({} viewers released)",
            ended.session_id,
            admin,
            ended.viewers.len()
        );

        announce_session_end(
            self.message_pusher.as_ref(),
            self.catalog.as_ref(),
            &ended,
            StopReason::StoppedByAdmin,
        )
        .await;
        Ok(ended)
    }

    /// 録画を開始する
    pub async fn start_recording(
        &self,
        admin: &ConnectionId,
        lecture_id: LectureId,
    ) -> Result<StartedRecording, SignalingError> {
        let started = self
            .repository
            .start_recording(admin, lecture_id, self.now())
            .await?;
        tracing::info!(
            "Recording of lecture '{}' started in stream '{}'",
            started.lecture_id,
            started.session_id
        );

        broadcast_or_log(
            self.message_pusher.as_ref(),
            started.audience.clone(),
            &Notification::RecordingStarted {
                session_id: started.session_id.clone(),
                lecture_id: started.lecture_id.clone(),
                started_at: started.started_at,
            },
        )
        .await;
        Ok(started)
    }

    /// 録画を停止し、講義カタログに紐づける
    pub async fn stop_recording(
        &self,
        admin: &ConnectionId,
    ) -> Result<FinishedRecording, SignalingError> {
        let stopped = self.repository.stop_recording(admin, self.now()).await?;
        let recording = stopped.recording;
        tracing::info!(
            "Recording of lecture '{}' stopped after {} ms",
            recording.lecture_id,
            recording.duration_ms
        );

        broadcast_or_log(
            self.message_pusher.as_ref(),
            stopped.audience,
            &Notification::RecordingStopped(recording.clone()),
        )
        .await;
        tag_or_log(self.catalog.as_ref(), recording.clone()).await;
        Ok(recording)
    }
}
