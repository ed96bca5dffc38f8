//! UseCase: 視聴者の参加・退出と WebRTC シグナリングの中継
//!
//! オファーは配信者から特定の視聴者へ、アンサーは視聴者から配信者へ、
//! ICE 候補は双方向に 1 対 1 で中継されます。

use std::sync::Arc;

use podium_shared::time::Clock;
use serde_json::Value;

use crate::domain::{
    ConnectionId, MessagePusher, Notification, SignalingError, SignalingRepository, Timestamp,
    ViewerArrival, ViewerDeparture,
};

use super::notify::{announce_departure, broadcast_or_log, push_or_log};

/// 視聴者メンバーシップと中継のユースケース
pub struct ViewerRelayUseCase {
    repository: Arc<dyn SignalingRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ViewerRelayUseCase {
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

    /// 視聴者として配信に参加する
    ///
    /// 再参加はメタデータのみ更新し、通知は送らない。
    pub async fn join_stream(
        &self,
        viewer: &ConnectionId,
        viewer_info: Option<Value>,
    ) -> Result<ViewerArrival, SignalingError> {
        let now = Timestamp::new(self.clock.now_millis());
        let arrival = self
            .repository
            .join_stream(viewer, viewer_info.clone(), now)
            .await?;
        if !arrival.newly_joined {
            tracing::debug!("Viewer '{}' re-joined, metadata refreshed", viewer);
            return Ok(arrival);
        }
        tracing::info!("Viewer '{}' joined ({} watching)", viewer, arrival.count);

        push_or_log(
            self.message_pusher.as_ref(),
            &arrival.admin,
            &Notification::ViewerJoined {
                connection_id: viewer.clone(),
                viewer_info,
                count: arrival.count,
            },
        )
        .await;
        broadcast_or_log(
            self.message_pusher.as_ref(),
            arrival.audience.clone(),
            &Notification::ViewerCountUpdated {
                count: arrival.count,
            },
        )
        .await;
        Ok(arrival)
    }

    /// 配信から退出する（メンバーでなければ何もしない）
    pub async fn leave_stream(&self, viewer: &ConnectionId) -> Option<ViewerDeparture> {
        let departure = self.repository.leave_stream(viewer).await?;
        tracing::info!("Viewer '{}' left ({} watching)", viewer, departure.count);
        announce_departure(self.message_pusher.as_ref(), viewer, &departure).await;
        Some(departure)
    }

    /// 配信者のオファーを視聴者へ中継する
    pub async fn relay_offer(
        &self,
        from: &ConnectionId,
        target: &ConnectionId,
        offer: Value,
    ) -> Result<ConnectionId, SignalingError> {
        let target = self.repository.route_offer(from, target).await?;
        push_or_log(
            self.message_pusher.as_ref(),
            &target,
            &Notification::WebrtcOffer {
                from: from.clone(),
                offer,
            },
        )
        .await;
        Ok(target)
    }

    /// 視聴者のアンサーを配信者へ中継する
    pub async fn relay_answer(
        &self,
        from: &ConnectionId,
        answer: Value,
    ) -> Result<ConnectionId, SignalingError> {
        let admin = self.repository.route_answer(from).await?;
        push_or_log(
            self.message_pusher.as_ref(),
            &admin,
            &Notification::WebrtcAnswer {
                connection_id: from.clone(),
                answer,
            },
        )
        .await;
        Ok(admin)
    }

    /// ICE 候補を相手側へ中継する
    pub async fn relay_ice_candidate(
        &self,
        from: &ConnectionId,
        candidate: Value,
        target: Option<&ConnectionId>,
    ) -> Result<ConnectionId, SignalingError> {
        let target = self.repository.route_ice_candidate(from, target).await?;
        push_or_log(
            self.message_pusher.as_ref(),
            &target,
            &Notification::IceCandidate {
                from: from.clone(),
                candidate,
            },
        )
        .await;
        Ok(target)
    }
}
