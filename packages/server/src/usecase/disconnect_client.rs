//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 切断時のクリーンアップは無条件で行われ、通知の失敗で止まってはならない
//! - 配信者の切断でセッションが終了し、全員に通知されることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：視聴者の切断、配信者の切断（録画中を含む）
//! - 異常系：存在しない接続の切断

use std::sync::Arc;

use podium_shared::time::Clock;

use crate::domain::{
    ConnectionId, ConnectionState, DisconnectOutcome, LectureCatalog, MessagePusher,
    SignalingRepository, StopReason, Timestamp,
};

use super::{
    error::DisconnectError,
    notify::{announce_departure, announce_session_end},
};

/// 切断のユースケース
pub struct DisconnectClientUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SignalingRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 録画の紐づけ先
    catalog: Arc<dyn LectureCatalog>,
    clock: Arc<dyn Clock>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
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

    /// 切断を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 切断する接続の ID
    /// * `terminal` - 終了状態（`Disconnected` または `Error`）
    ///
    /// # Returns
    ///
    /// * `Ok(DisconnectOutcome)` - 解放した状態
    /// * `Err(DisconnectError)` - 接続が登録されていない
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        terminal: ConnectionState,
    ) -> Result<DisconnectOutcome, DisconnectError> {
        // 1. 送信チャネルを登録解除（以降の通知はこの接続に届かない）
        self.message_pusher.unregister_client(&connection_id).await;

        // 2. 状態を原子的に解放
        let now = Timestamp::new(self.clock.now_millis());
        let outcome = self
            .repository
            .remove_connection(&connection_id, terminal, now)
            .await
            .ok_or_else(|| DisconnectError::ConnectionNotFound(connection_id.to_string()))?;

        // 3. 通知（失敗してもクリーンアップには影響しない）
        if let Some(ended) = &outcome.ended_session {
            tracing::info!(
                "Stream '{}' ended because its owner '{}' disconnected ({} viewers released)",
                ended.session_id,
                connection_id,
                ended.viewers.len()
            );
            announce_session_end(
                self.message_pusher.as_ref(),
                self.catalog.as_ref(),
                ended,
                StopReason::AdminDisconnected,
            )
            .await;
        }
        if let Some(departure) = &outcome.departure {
            announce_departure(self.message_pusher.as_ref(), &connection_id, departure).await;
        }

        Ok(outcome)
    }
}
