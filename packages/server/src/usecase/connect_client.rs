//! UseCase: 接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectClientUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 新しい接続は `connecting` 状態で登録され、送信チャネルが MessagePusher に登録される
//! - 接続直後に現在の配信状態が届くことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続（配信なし・配信中）
//! - 異常系：重複した接続 ID

use std::sync::Arc;

use podium_shared::time::Clock;

use crate::domain::{
    ConnectionId, MessagePusher, Notification, Principal, PusherChannel, SignalingRepository,
    Timestamp,
};

use super::{error::ConnectError, notify::push_or_log};

/// 接続のユースケース
pub struct ConnectClientUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SignalingRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
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

    /// 接続を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 新しい接続の ID
    /// * `principal` - トークンから解決された Principal（匿名視聴者なら None）
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Timestamp)` - 接続時刻
    /// * `Err(ConnectError)` - 接続 ID が重複している
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        principal: Option<Principal>,
        sender: PusherChannel,
    ) -> Result<Timestamp, ConnectError> {
        let connected_at = Timestamp::new(self.clock.now_millis());

        // 1. Repository に接続を登録
        if !self
            .repository
            .register_connection(connection_id.clone(), principal, connected_at)
            .await
        {
            return Err(ConnectError::DuplicateConnectionId(
                connection_id.to_string(),
            ));
        }

        // 2. MessagePusher に送信チャネルを登録
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;

        // 3. 現在の配信状態を送る
        let status = self.repository.get_stream_status().await;
        push_or_log(
            self.message_pusher.as_ref(),
            &connection_id,
            &Notification::StreamStatus(status),
        )
        .await;

        Ok(connected_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::ConnectionState, usecase::test_support::{Harness, T0}};

    #[tokio::test]
    async fn test_connect_registers_connecting_client() {
        // テスト項目: 新しい接続が connecting 状態で登録され、配信状態が送られる
        // given (前提条件):
        let harness = Harness::new();

        // when (操作):
        let id = harness.register("c1", None).await;

        // then (期待する結果):
        let connection = harness.repository.get_connection(&id).await.unwrap();
        assert_eq!(connection.state, ConnectionState::Connecting);
        assert_eq!(connection.connected_at, Timestamp::new(T0));
        assert!(harness.pusher.is_registered(&id));
        let sent = harness.pusher.sent_to(&id);
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Notification::StreamStatus(s) if !s.is_live));
    }

    #[tokio::test]
    async fn test_connect_during_live_stream_reports_live_status() {
        // テスト項目: 配信中に接続すると is_live=true の状態が届く
        // given (前提条件):
        let harness = Harness::new();
        harness.live(&["v1"]).await;

        // when (操作):
        let id = harness.register("late", None).await;

        // then (期待する結果):
        let sent = harness.pusher.sent_to(&id);
        assert!(matches!(
            &sent[0],
            Notification::StreamStatus(s) if s.is_live && s.viewer_count == 1
        ));
    }

    #[tokio::test]
    async fn test_connect_duplicate_id() {
        // テスト項目: 重複した接続 ID は DuplicateConnectionId エラーになる
        // given (前提条件):
        let harness = Harness::new();
        let id = harness.register("c1", None).await;
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        // when (操作):
        let result = harness.connect_usecase().execute(id, None, tx).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::DuplicateConnectionId("c1".to_string()))
        );
    }
}
