//! Conversion logic between DTOs and domain models.

use serde::Deserialize;

use crate::domain::{
    ChatText, Command, ConnectionId, ErrorChannel, EventKind, FinishedRecording, LectureId,
    MessagePushError, Notification, SignalingError, StreamStatus,
};
use crate::infrastructure::dto::{http, websocket as dto};
use podium_shared::time::timestamp_to_rfc3339;

/// A client event that could not be turned into a command
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidEvent {
    /// Error event the rejection is reported on
    pub channel: ErrorChannel,
    pub error: SignalingError,
    /// Rate-limited kind the frame claimed to be, charged even though it was rejected
    pub kind: Option<EventKind>,
}

impl InvalidEvent {
    fn on(channel: ErrorChannel, error: impl Into<SignalingError>) -> Self {
        Self {
            channel,
            error: error.into(),
            kind: None,
        }
    }
}

/// Only the `event` field of a frame
#[derive(Deserialize)]
struct EventName {
    event: String,
}

/// Parse one text frame into a validated command
pub fn decode_client_event(text: &str) -> Result<Command, InvalidEvent> {
    serde_json::from_str::<dto::ClientEventDto>(text)
        .map_err(|e| {
            InvalidEvent::on(
                ErrorChannel::Stream,
                SignalingError::InvalidPayload(e.to_string()),
            )
        })
        .and_then(Command::try_from)
        .map_err(|invalid| InvalidEvent {
            kind: claimed_kind(text),
            ..invalid
        })
}

fn claimed_kind(text: &str) -> Option<EventKind> {
    let name: EventName = serde_json::from_str(text).ok()?;
    EventKind::from_wire(&name.event)
}

/// Encode a notification as a JSON text frame
pub fn encode_notification(notification: &Notification) -> Result<String, MessagePushError> {
    serde_json::to_string(&dto::ServerEventDto::from(notification))
        .map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
}

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<dto::ClientEventDto> for Command {
    type Error = InvalidEvent;

    fn try_from(event: dto::ClientEventDto) -> Result<Self, Self::Error> {
        use dto::ClientEventDto as E;

        let command = match event {
            E::ConnectionEstablished(_) => Command::ConnectionEstablished,
            E::StartStream(_) => Command::StartStream,
            E::StopStream(_) => Command::StopStream,
            E::StartRecording(payload) => Command::StartRecording {
                lecture_id: LectureId::new(payload.lecture_id)
                    .map_err(|e| InvalidEvent::on(ErrorChannel::Recording, e))?,
            },
            E::StopRecording(_) => Command::StopRecording,
            E::JoinStream(payload) => Command::JoinStream {
                viewer_info: payload.and_then(|p| p.viewer_info),
            },
            E::LeaveStream(_) => Command::LeaveStream,
            E::ChatMessage(payload) => Command::ChatMessage {
                message: ChatText::new(payload.message)
                    .map_err(|e| InvalidEvent::on(ErrorChannel::Chat, e))?,
                user_info: payload.user_info,
            },
            E::MicRequest(payload) => Command::MicRequest {
                user_info: payload.and_then(|p| p.user_info),
            },
            E::WebrtcOffer(payload) => Command::WebrtcOffer {
                target: ConnectionId::new(payload.target_viewer_id)
                    .map_err(|e| InvalidEvent::on(ErrorChannel::Stream, e))?,
                offer: payload.offer,
            },
            E::WebrtcAnswer(payload) => Command::WebrtcAnswer {
                answer: payload.answer,
            },
            E::IceCandidate(payload) => Command::IceCandidate {
                candidate: payload.candidate,
                target: payload
                    .target_viewer_id
                    .map(ConnectionId::new)
                    .transpose()
                    .map_err(|e| InvalidEvent::on(ErrorChannel::Stream, e))?,
            },
            E::GetStreamStatus(_) => Command::GetStreamStatus,
            E::Ping(_) => Command::Ping,
        };
        Ok(command)
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&StreamStatus> for http::StreamStatusDto {
    fn from(status: &StreamStatus) -> Self {
        Self {
            is_live: status.is_live,
            session_id: status.session_id.as_ref().map(|id| id.as_str().to_string()),
            started_at: status.started_at.map(|t| t.value()),
            viewer_count: status.viewer_count,
            is_recording: status.is_recording,
            lecture_id: status.lecture_id.as_ref().map(|id| id.as_str().to_string()),
            recording_started_at: status.recording_started_at.map(|t| t.value()),
        }
    }
}

impl From<&FinishedRecording> for http::RecordingDto {
    fn from(recording: &FinishedRecording) -> Self {
        Self {
            lecture_id: recording.lecture_id.as_str().to_string(),
            session_id: recording.session_id.as_str().to_string(),
            started_at: timestamp_to_rfc3339(recording.started_at.value()),
            stopped_at: timestamp_to_rfc3339(recording.stopped_at.value()),
            duration_ms: recording.duration_ms,
        }
    }
}

fn error_payload(error: &SignalingError) -> dto::ErrorPayload {
    dto::ErrorPayload {
        r#type: error.code().to_string(),
        message: error.to_string(),
    }
}

impl From<&Notification> for dto::ServerEventDto {
    fn from(notification: &Notification) -> Self {
        use dto::ServerEventDto as E;

        match notification {
            Notification::StreamStarted {
                session_id,
                started_at,
            } => E::StreamStarted(dto::StreamStartedPayload {
                session_id: session_id.as_str().to_string(),
                started_at: started_at.value(),
            }),
            Notification::StreamStopped { session_id, reason } => {
                E::StreamStopped(dto::StreamStoppedPayload {
                    session_id: session_id.as_str().to_string(),
                    reason: reason.as_str().to_string(),
                })
            }
            Notification::ViewerJoined {
                connection_id,
                viewer_info,
                count,
            } => E::ViewerJoined(dto::ViewerJoinedPayload {
                connection_id: connection_id.as_str().to_string(),
                viewer_info: viewer_info.clone(),
                count: *count,
            }),
            Notification::ViewerLeft {
                connection_id,
                count,
            } => E::ViewerLeft(dto::ViewerLeftPayload {
                connection_id: connection_id.as_str().to_string(),
                count: *count,
            }),
            Notification::ViewerCountUpdated { count } => {
                E::ViewerCountUpdated(dto::ViewerCountPayload { count: *count })
            }
            Notification::WebrtcOffer { from, offer } => {
                E::WebrtcOffer(dto::RelayedOfferPayload {
                    offer: offer.clone(),
                    from: from.as_str().to_string(),
                })
            }
            Notification::WebrtcAnswer {
                connection_id,
                answer,
            } => E::WebrtcAnswer(dto::RelayedAnswerPayload {
                connection_id: connection_id.as_str().to_string(),
                answer: answer.clone(),
            }),
            Notification::IceCandidate { from, candidate } => {
                E::IceCandidate(dto::RelayedCandidatePayload {
                    candidate: candidate.clone(),
                    from: from.as_str().to_string(),
                })
            }
            Notification::ChatMessage {
                connection_id,
                message,
                user_info,
                timestamp,
            } => E::ChatMessage(dto::ChatBroadcastPayload {
                connection_id: connection_id.as_str().to_string(),
                message: message.clone(),
                user_info: user_info.clone(),
                timestamp: timestamp.value(),
            }),
            Notification::MicRequest {
                connection_id,
                user_info,
                timestamp,
            } => E::MicRequest(dto::MicRequestNoticePayload {
                connection_id: connection_id.as_str().to_string(),
                user_info: user_info.clone(),
                timestamp: timestamp.value(),
            }),
            Notification::RecordingStarted {
                session_id,
                lecture_id,
                started_at,
            } => E::RecordingStarted(dto::RecordingStartedPayload {
                session_id: session_id.as_str().to_string(),
                lecture_id: lecture_id.as_str().to_string(),
                started_at: started_at.value(),
            }),
            Notification::RecordingStopped(recording) => {
                E::RecordingStopped(dto::RecordingStoppedPayload {
                    lecture_id: recording.lecture_id.as_str().to_string(),
                    session_id: recording.session_id.as_str().to_string(),
                    duration: recording.duration_ms,
                    stopped_at: recording.stopped_at.value(),
                })
            }
            Notification::StreamStatus(status) => E::StreamStatus(status.into()),
            Notification::Error { channel, error } => match channel {
                ErrorChannel::Stream => E::StreamError(error_payload(error)),
                ErrorChannel::Chat => E::ChatError(error_payload(error)),
                ErrorChannel::Recording => E::RecordingError(error_payload(error)),
            },
            Notification::RateLimited {
                event,
                retry_after_ms,
            } => E::RateLimited(dto::RateLimitedPayload {
                event: event.to_string(),
                retry_after_ms: *retry_after_ms,
            }),
            Notification::Pong { timestamp } => E::Pong(dto::PongPayload {
                timestamp: timestamp.value(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionId, StopReason, Timestamp};

    #[test]
    fn test_decode_chat_message() {
        // テスト項目: chat-message が検証済みコマンドに変換される
        // when (操作):
        let command = decode_client_event(
            r#"{"event":"chat-message","data":{"message":"hi","userInfo":{"name":"Ann"}}}"#,
        )
        .unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            Command::ChatMessage {
                message: ChatText::new("hi".to_string()).unwrap(),
                user_info: Some(serde_json::json!({"name": "Ann"})),
            }
        );
    }

    #[test]
    fn test_decode_blank_chat_is_reported_on_chat_channel() {
        // テスト項目: 空白だけのチャットは chat-error チャネルの InvalidPayload になる
        // when (操作):
        let result = decode_client_event(r#"{"event":"chat-message","data":{"message":"   "}}"#);

        // then (期待する結果):
        let invalid = result.unwrap_err();
        assert_eq!(invalid.channel, ErrorChannel::Chat);
        assert_eq!(invalid.error.code(), "invalid-payload");
    }

    #[test]
    fn test_decode_malformed_frame_is_reported_on_stream_channel() {
        // テスト項目: 不正なフレームは stream-error チャネルの InvalidPayload になる
        // when (操作):
        let result = decode_client_event(r#"{"event":"webrtc-offer","data":{}}"#);

        // then (期待する結果):
        let invalid = result.unwrap_err();
        assert_eq!(invalid.channel, ErrorChannel::Stream);
        assert!(matches!(invalid.error, SignalingError::InvalidPayload(_)));
    }

    #[test]
    fn test_decode_ice_candidate_without_target() {
        // テスト項目: 宛先なしの ICE 候補は target が None のコマンドになる
        // when (操作):
        let command = decode_client_event(
            r#"{"event":"ice-candidate","data":{"candidate":{"candidate":"c1"}}}"#,
        )
        .unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            Command::IceCandidate {
                candidate: serde_json::json!({"candidate": "c1"}),
                target: None,
            }
        );
    }

    #[test]
    fn test_decode_payloadless_event_with_empty_data() {
        // テスト項目: ペイロードを持たないイベントは空オブジェクトの data を受け付ける
        // when (操作):
        let commands: Vec<Command> = [
            r#"{"event":"start-stream","data":{}}"#,
            r#"{"event":"stop-recording","data":{}}"#,
            r#"{"event":"leave-stream","data":{"reason":"tab closed"}}"#,
        ]
        .into_iter()
        .map(|text| decode_client_event(text).unwrap())
        .collect();

        // then (期待する結果):
        assert_eq!(
            commands,
            vec![Command::StartStream, Command::StopRecording, Command::LeaveStream]
        );
    }

    #[test]
    fn test_rejected_frame_keeps_claimed_rate_limited_kind() {
        // テスト項目: 検証に失敗したフレームでも、レート制限対象のイベント名が分かれば種別を保持する
        // when (操作):
        let malformed_ice = decode_client_event(r#"{"event":"ice-candidate","data":42}"#);
        let blank_chat = decode_client_event(r#"{"event":"chat-message","data":{"message":""}}"#);
        let malformed_start = decode_client_event(r#"{"event":"start-stream","data":"now"}"#);
        let not_json = decode_client_event("ice-candidate");

        // then (期待する結果):
        assert_eq!(malformed_ice.unwrap_err().kind, Some(EventKind::IceCandidate));
        assert_eq!(blank_chat.unwrap_err().kind, Some(EventKind::ChatMessage));
        assert_eq!(malformed_start.unwrap_err().kind, None);
        assert_eq!(not_json.unwrap_err().kind, None);
    }

    #[test]
    fn test_encode_error_notification() {
        // テスト項目: エラー通知はチャネルに応じたイベント名と type/message を持つ
        // given (前提条件):
        let notification =
            Notification::error(ErrorChannel::Recording, SignalingError::NotRecording);

        // when (操作):
        let json: serde_json::Value =
            serde_json::from_str(&encode_notification(&notification).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(json["event"], "recording-error");
        assert_eq!(json["data"]["type"], "not-recording");
        assert_eq!(json["data"]["message"], "no recording is in progress");
    }

    #[test]
    fn test_encode_stream_stopped() {
        // テスト項目: stream-stopped に停止理由が含まれる
        // given (前提条件):
        let notification = Notification::StreamStopped {
            session_id: SessionId::new("s1".to_string()).unwrap(),
            reason: StopReason::AdminDisconnected,
        };

        // when (操作):
        let json: serde_json::Value =
            serde_json::from_str(&encode_notification(&notification).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({
                "event": "stream-stopped",
                "data": {"sessionId": "s1", "reason": "admin-disconnected"}
            })
        );
    }

    #[test]
    fn test_recording_dto_uses_rfc3339() {
        // テスト項目: 録画 DTO の時刻は RFC 3339 で出力される
        // given (前提条件):
        let recording = FinishedRecording {
            lecture_id: LectureId::new("L1".to_string()).unwrap(),
            session_id: SessionId::new("s1".to_string()).unwrap(),
            started_at: Timestamp::new(0),
            stopped_at: Timestamp::new(1_500),
            duration_ms: 1_500,
        };

        // when (操作):
        let dto = http::RecordingDto::from(&recording);

        // then (期待する結果):
        assert_eq!(dto.started_at, "1970-01-01T00:00:00+00:00");
        assert_eq!(dto.duration_ms, 1_500);
    }
}
