//! UseCase: チャットとマイク要求
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::send_chat() / request_mic()
//!
//! ### なぜこのテストが必要か
//! - チャットは送信者を含む全接続に届く
//! - マイク要求は配信者にのみ届く
//!
//! ### どのような状況を想定しているか
//! - 正常系：チャットのブロードキャスト、マイク要求の転送
//! - 異常系：配信がない・メンバーでない場合のマイク要求

use std::sync::Arc;

use podium_shared::time::Clock;
use serde_json::Value;

use crate::domain::{
    ChatText, ConnectionId, MessagePusher, Notification, SignalingError, SignalingRepository,
    Timestamp,
};

use super::notify::{broadcast_or_log, push_or_log};

/// チャット・マイク要求のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SignalingRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn SignalingRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// チャットメッセージを全接続にブロードキャストする
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ConnectionId>)` - ブロードキャスト対象の接続 ID リスト
    pub async fn send_chat(
        &self,
        from: &ConnectionId,
        message: ChatText,
        user_info: Option<Value>,
    ) -> Result<Vec<ConnectionId>, SignalingError> {
        let timestamp = Timestamp::new(self.clock.now_millis());

        // 送信者自身にもエコーする
        let targets = self.repository.get_all_connection_ids().await;
        if !targets.contains(from) {
            return Err(SignalingError::UnknownConnection(from.to_string()));
        }
        tracing::debug!(
            "Broadcasting chat from '{}' to {} connections",
            from,
            targets.len()
        );

        broadcast_or_log(
            self.message_pusher.as_ref(),
            targets.clone(),
            &Notification::ChatMessage {
                connection_id: from.clone(),
                message: message.into_string(),
                user_info,
                timestamp,
            },
        )
        .await;
        Ok(targets)
    }

    /// マイク要求を配信者へ転送する
    pub async fn request_mic(
        &self,
        from: &ConnectionId,
        user_info: Option<Value>,
    ) -> Result<ConnectionId, SignalingError> {
        let timestamp = Timestamp::new(self.clock.now_millis());
        let admin = self.repository.route_mic_request(from).await?;
        tracing::info!("Viewer '{}' requested the microphone", from);

        push_or_log(
            self.message_pusher.as_ref(),
            &admin,
            &Notification::MicRequest {
                connection_id: from.clone(),
                user_info,
                timestamp,
            },
        )
        .await;
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{Harness, T0};
    use serde_json::json;

    #[tokio::test]
    async fn test_send_chat_reaches_every_connection() {
        // テスト項目: チャットが送信者を含む全接続に届く
        // given (前提条件):
        let harness = Harness::new();
        let alice = harness.connect("alice", None).await;
        let bob = harness.connect("bob", None).await;
        let carol = harness.connect("carol", None).await;

        // when (操作):
        let targets = harness
            .message_usecase()
            .send_chat(
                &alice,
                ChatText::new("Hello!".to_string()).unwrap(),
                Some(json!({"name": "Alice"})),
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(targets.len(), 3);
        let expected = Notification::ChatMessage {
            connection_id: alice.clone(),
            message: "Hello!".to_string(),
            user_info: Some(json!({"name": "Alice"})),
            timestamp: Timestamp::new(T0),
        };
        for id in [&alice, &bob, &carol] {
            assert_eq!(harness.pusher.sent_to(id), vec![expected.clone()]);
        }
    }

    #[tokio::test]
    async fn test_request_mic_goes_to_admin_only() {
        // テスト項目: マイク要求は配信者にのみ届く
        // given (前提条件):
        let harness = Harness::new();
        let (admin, viewers) = harness.live(&["v1", "v2"]).await;

        // when (操作):
        let routed = harness
            .message_usecase()
            .request_mic(&viewers[0], None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(routed, admin);
        assert_eq!(
            harness.pusher.sent_to(&admin),
            vec![Notification::MicRequest {
                connection_id: viewers[0].clone(),
                user_info: None,
                timestamp: Timestamp::new(T0),
            }]
        );
        assert!(harness.pusher.sent_to(&viewers[1]).is_empty());
    }

    #[tokio::test]
    async fn test_request_mic_without_stream() {
        // テスト項目: 配信がないときのマイク要求は NoActiveSession
        // given (前提条件):
        let harness = Harness::new();
        let viewer = harness.connect("v1", None).await;

        // when (操作):
        let result = harness.message_usecase().request_mic(&viewer, None).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), SignalingError::NoActiveSession);
    }
}
