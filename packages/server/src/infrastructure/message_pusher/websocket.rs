//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - `Notification` を JSON にエンコードして送信（push_to, broadcast）
//!
//! WebSocket の受付と sender の生成は UI 層（`ui/handler/websocket.rs`）で行われ、
//! この実装は受け取った sender をメッセージ送信にのみ使用します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, Notification, PusherChannel},
    infrastructure::dto::conversion::encode_notification,
};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        clients.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let content = encode_notification(notification)?;
        let clients = self.clients.lock().await;

        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        sender
            .send(content)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::trace!("Pushed message to connection '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let content = encode_notification(notification)?;
        let clients = self.clients.lock().await;

        for target in targets {
            match clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(content.clone()) {
                        tracing::warn!("Failed to push message to connection '{}': {}", target, e);
                    }
                }
                None => {
                    tracing::debug!(
                        "Connection '{}' not found during broadcast, skipping",
                        target
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - push_to: 特定の接続への送信と、未登録の接続へのエラー
    // - broadcast: 複数接続への送信と部分失敗の許容
    //
    // 【なぜこのテストが必要か】
    // - 通知の配送はベストエフォートであり、1 件の失敗が他の配送を止めてはならない
    // ========================================

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn pong() -> Notification {
        Notification::Pong {
            timestamp: Timestamp::new(42),
        }
    }

    const PONG_JSON: &str = r#"{"event":"pong","data":{"timestamp":42}}"#;

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定の接続に JSON エンコードされた通知を送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_client(conn("alice"), tx).await;

        // when (操作):
        let result = pusher.push_to(&conn("alice"), &pong()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some(PONG_JSON.to_string()));
    }

    #[tokio::test]
    async fn test_push_to_client_not_found() {
        // テスト項目: 存在しない接続への送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();

        // when (操作):
        let result = pusher.push_to(&conn("nobody"), &pong()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }

    #[tokio::test]
    async fn test_push_to_closed_channel() {
        // テスト項目: 受信側が閉じた接続への送信は PushFailed になる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();
        let (tx, rx) = mpsc::unbounded_channel();
        pusher.register_client(conn("alice"), tx).await;
        drop(rx);

        // when (操作):
        let result = pusher.push_to(&conn("alice"), &pong()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::PushFailed(_))));
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure() {
        // テスト項目: 一部の接続が存在しない・閉じていても他の接続には届く
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        let (tx3, mut rx3) = mpsc::unbounded_channel();
        pusher.register_client(conn("alice"), tx1).await;
        pusher.register_client(conn("bob"), tx2).await;
        pusher.register_client(conn("carol"), tx3).await;
        drop(rx2);

        // when (操作):
        let targets = vec![conn("alice"), conn("bob"), conn("ghost"), conn("carol")];
        let result = pusher.broadcast(targets, &pong()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx1.recv().await, Some(PONG_JSON.to_string()));
        assert_eq!(rx3.recv().await, Some(PONG_JSON.to_string()));
    }

    #[tokio::test]
    async fn test_unregister_client() {
        // テスト項目: 登録解除後の接続には送信できない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        pusher.register_client(conn("alice"), tx).await;

        // when (操作):
        pusher.unregister_client(&conn("alice")).await;

        // then (期待する結果):
        let result = pusher.push_to(&conn("alice"), &pong()).await;
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }
}
