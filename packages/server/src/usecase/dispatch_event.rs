//! UseCase: 受信イベントのディスパッチ
//!
//! 1 つの接続から届いた検証済みコマンドを処理します。
//!
//! 1. 最終アクティビティ時刻を更新
//! 2. レート制限対象ならクォータを消費（超過時は `rate-limited` を返して破棄）
//! 3. 接続が準備完了前なら保留キューに積む
//! 4. 各ユースケースに振り分け、失敗は操作に対応する `*-error` で送信者にだけ返す

use std::sync::Arc;

use podium_shared::time::Clock;

use crate::domain::{
    Admission, Command, ConnectionId, ErrorChannel, EventKind, MessagePusher, Notification,
    RateDecision, SignalingError, SignalingRepository, Timestamp,
};

use super::{
    SendMessageUseCase, StreamLifecycleUseCase, ViewerRelayUseCase, notify::push_or_log,
};

/// Result of dispatching one command
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The command ran successfully
    Handled,
    /// `connection-established` was processed
    Established { newly_ready: bool, replayed: usize },
    /// Queued until the connection is ready
    Deferred,
    /// Dropped by the rate limiter or a full pending queue
    RateLimited,
    /// Rejected; the error was reported to the sender
    Failed(SignalingError),
}

/// イベントディスパッチのユースケース
pub struct DispatchEventUseCase {
    repository: Arc<dyn SignalingRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    stream: StreamLifecycleUseCase,
    relay: ViewerRelayUseCase,
    messages: SendMessageUseCase,
}

impl DispatchEventUseCase {
    pub fn new(
        repository: Arc<dyn SignalingRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        stream: StreamLifecycleUseCase,
        relay: ViewerRelayUseCase,
        messages: SendMessageUseCase,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
            stream,
            relay,
            messages,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Handle one inbound command from `from`
    pub async fn execute(&self, from: &ConnectionId, command: Command) -> DispatchOutcome {
        let now = self.now();
        self.repository.touch(from, now).await;

        if let Some(kind) = command.rate_limit_kind() {
            if !self.charge(from, kind, now).await {
                return DispatchOutcome::RateLimited;
            }
        }

        let channel = command.error_channel();
        match self.repository.admit(from, command, now).await {
            Ok(Admission::Proceed(Command::ConnectionEstablished)) => self.establish(from).await,
            Ok(Admission::Proceed(command)) => self.handle(from, command).await,
            Ok(Admission::Deferred) => {
                tracing::debug!("Deferred event from '{}' until it is ready", from);
                DispatchOutcome::Deferred
            }
            Err(SignalingError::RateLimited { event }) => {
                tracing::warn!("Pending queue of '{}' is full, dropped '{}'", from, event);
                self.notify(
                    from,
                    &Notification::RateLimited {
                        event,
                        retry_after_ms: None,
                    },
                )
                .await;
                DispatchOutcome::RateLimited
            }
            Err(error) => self.fail(from, channel, error).await,
        }
    }

    /// `connection-established`: mark ready and replay deferred commands in order
    pub async fn establish(&self, from: &ConnectionId) -> DispatchOutcome {
        let ready = match self.repository.mark_ready(from, self.now()).await {
            Ok(ready) => ready,
            Err(error) => return self.fail(from, ErrorChannel::Stream, error).await,
        };
        if ready.newly_ready {
            tracing::info!("Connection '{}' is ready", from);
        }

        let replayed = ready.replay.len();
        if replayed > 0 {
            tracing::debug!("Replaying {} deferred events for '{}'", replayed, from);
        }
        for signal in ready.replay {
            self.handle(from, signal.command).await;
        }

        DispatchOutcome::Established {
            newly_ready: ready.newly_ready,
            replayed,
        }
    }

    /// Report a command that could not be decoded
    ///
    /// A frame naming a rate-limited event is charged against that limit
    /// first, so malformed frames cannot bypass it.
    pub async fn reject(
        &self,
        from: &ConnectionId,
        kind: Option<EventKind>,
        channel: ErrorChannel,
        error: SignalingError,
    ) -> DispatchOutcome {
        let now = self.now();
        self.repository.touch(from, now).await;
        if let Some(kind) = kind {
            if !self.charge(from, kind, now).await {
                return DispatchOutcome::RateLimited;
            }
        }
        self.fail(from, channel, error).await
    }

    /// Consume one unit of `kind`; sends rate-limited and returns false when denied
    async fn charge(&self, from: &ConnectionId, kind: EventKind, now: Timestamp) -> bool {
        let RateDecision::Denied { retry_after_ms } =
            self.repository.check_rate(from, kind, now).await
        else {
            return true;
        };
        tracing::warn!(
            "Rate limited '{}' from '{}', retry after {} ms",
            kind,
            from,
            retry_after_ms
        );
        self.notify(
            from,
            &Notification::RateLimited {
                event: kind.as_str(),
                retry_after_ms: Some(retry_after_ms),
            },
        )
        .await;
        false
    }

    async fn handle(&self, from: &ConnectionId, command: Command) -> DispatchOutcome {
        let channel = command.error_channel();
        let result = match command {
            Command::ConnectionEstablished => {
                // 保留キューには積まれないため、リプレイ中に現れることはない
                tracing::debug!("Ignoring nested connection-established from '{}'", from);
                Ok(())
            }
            Command::StartStream => self.stream.start_stream(from).await.map(drop),
            Command::StopStream => self.stream.stop_stream(from).await.map(drop),
            Command::StartRecording { lecture_id } => self
                .stream
                .start_recording(from, lecture_id)
                .await
                .map(drop),
            Command::StopRecording => self.stream.stop_recording(from).await.map(drop),
            Command::JoinStream { viewer_info } => {
                self.relay.join_stream(from, viewer_info).await.map(drop)
            }
            Command::LeaveStream => {
                self.relay.leave_stream(from).await;
                Ok(())
            }
            Command::ChatMessage { message, user_info } => self
                .messages
                .send_chat(from, message, user_info)
                .await
                .map(drop),
            Command::MicRequest { user_info } => {
                self.messages.request_mic(from, user_info).await.map(drop)
            }
            Command::WebrtcOffer { target, offer } => {
                self.relay.relay_offer(from, &target, offer).await.map(drop)
            }
            Command::WebrtcAnswer { answer } => {
                self.relay.relay_answer(from, answer).await.map(drop)
            }
            Command::IceCandidate { candidate, target } => self
                .relay
                .relay_ice_candidate(from, candidate, target.as_ref())
                .await
                .map(drop),
            Command::GetStreamStatus => {
                let status = self.repository.get_stream_status().await;
                self.notify(from, &Notification::StreamStatus(status)).await;
                Ok(())
            }
            Command::Ping => {
                let timestamp = self.now();
                self.notify(from, &Notification::Pong { timestamp }).await;
                Ok(())
            }
        };

        match result {
            Ok(()) => DispatchOutcome::Handled,
            Err(error) => self.fail(from, channel, error).await,
        }
    }

    async fn fail(
        &self,
        from: &ConnectionId,
        channel: ErrorChannel,
        error: SignalingError,
    ) -> DispatchOutcome {
        tracing::debug!("Event from '{}' rejected: {}", from, error);
        self.notify(from, &Notification::error(channel, error.clone()))
            .await;
        DispatchOutcome::Failed(error)
    }

    async fn notify(&self, to: &ConnectionId, notification: &Notification) {
        push_or_log(self.message_pusher.as_ref(), to, notification).await;
    }
}
