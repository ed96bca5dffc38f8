//! Validated inbound commands.
//!
//! Wire payloads are decoded and checked at the transport boundary; the
//! coordinator only ever sees these typed commands.

use serde_json::Value;

use super::{ChatText, ConnectionId, EventKind, LectureId};

/// One inbound event from a connection
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ConnectionEstablished,
    StartStream,
    StopStream,
    StartRecording {
        lecture_id: LectureId,
    },
    StopRecording,
    JoinStream {
        viewer_info: Option<Value>,
    },
    LeaveStream,
    ChatMessage {
        message: ChatText,
        user_info: Option<Value>,
    },
    MicRequest {
        user_info: Option<Value>,
    },
    WebrtcOffer {
        target: ConnectionId,
        offer: Value,
    },
    WebrtcAnswer {
        answer: Value,
    },
    IceCandidate {
        candidate: Value,
        target: Option<ConnectionId>,
    },
    GetStreamStatus,
    Ping,
}

/// Which `*-error` event a failed command is reported on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorChannel {
    Stream,
    Chat,
    Recording,
}

impl Command {
    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished => "connection-established",
            Self::StartStream => "start-stream",
            Self::StopStream => "stop-stream",
            Self::StartRecording { .. } => "start-recording",
            Self::StopRecording => "stop-recording",
            Self::JoinStream { .. } => "join-stream",
            Self::LeaveStream => "leave-stream",
            Self::ChatMessage { .. } => "chat-message",
            Self::MicRequest { .. } => "mic-request",
            Self::WebrtcOffer { .. } => "webrtc-offer",
            Self::WebrtcAnswer { .. } => "webrtc-answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::GetStreamStatus => "get-stream-status",
            Self::Ping => "ping",
        }
    }

    /// Rate-limited kind of this command, if any
    pub fn rate_limit_kind(&self) -> Option<EventKind> {
        match self {
            Self::ChatMessage { .. } => Some(EventKind::ChatMessage),
            Self::MicRequest { .. } => Some(EventKind::MicRequest),
            Self::WebrtcOffer { .. } => Some(EventKind::WebrtcOffer),
            Self::WebrtcAnswer { .. } => Some(EventKind::WebrtcAnswer),
            Self::IceCandidate { .. } => Some(EventKind::IceCandidate),
            _ => None,
        }
    }

    /// Whether the command waits in the pending queue until the connection is ready
    pub fn is_deferrable(&self) -> bool {
        !matches!(
            self,
            Self::ConnectionEstablished | Self::GetStreamStatus | Self::Ping
        )
    }

    /// Error event used when this command fails
    pub fn error_channel(&self) -> ErrorChannel {
        match self {
            Self::ChatMessage { .. } | Self::MicRequest { .. } => ErrorChannel::Chat,
            Self::StartRecording { .. } | Self::StopRecording => ErrorChannel::Recording,
            _ => ErrorChannel::Stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_relay_and_chat_are_rate_limited() {
        // テスト項目: レート制限対象はリレー・チャット・マイク要求のみ
        // given (前提条件):
        let limited = Command::IceCandidate {
            candidate: serde_json::json!({}),
            target: None,
        };
        let unlimited = Command::JoinStream { viewer_info: None };

        // then (期待する結果):
        assert_eq!(limited.rate_limit_kind(), Some(EventKind::IceCandidate));
        assert_eq!(unlimited.rate_limit_kind(), None);
    }

    #[test]
    fn test_control_commands_are_not_deferred() {
        // テスト項目: ping / ステータス取得 / 接続確立はキューに積まれない
        // then (期待する結果):
        assert!(!Command::Ping.is_deferrable());
        assert!(!Command::GetStreamStatus.is_deferrable());
        assert!(!Command::ConnectionEstablished.is_deferrable());
        assert!(Command::LeaveStream.is_deferrable());
    }

    #[test]
    fn test_error_channel_by_command() {
        // テスト項目: コマンドの種類に応じたエラーイベントが選ばれる
        // then (期待する結果):
        assert_eq!(Command::StopRecording.error_channel(), ErrorChannel::Recording);
        assert_eq!(
            Command::MicRequest { user_info: None }.error_channel(),
            ErrorChannel::Chat
        );
        assert_eq!(Command::StartStream.error_channel(), ErrorChannel::Stream);
    }
}
