//! UseCase: 古くなった接続ごとの状態の掃除

use std::sync::Arc;

use podium_shared::time::Clock;

use crate::domain::{SignalingRepository, SweepReport, Timestamp};

/// 定期スイープのユースケース
pub struct SweepStaleStateUseCase {
    repository: Arc<dyn SignalingRepository>,
    clock: Arc<dyn Clock>,
    /// この時間（ミリ秒）以上非アクティブな状態を削除する
    stale_after_ms: i64,
}

impl SweepStaleStateUseCase {
    pub fn new(
        repository: Arc<dyn SignalingRepository>,
        clock: Arc<dyn Clock>,
        stale_after_ms: i64,
    ) -> Self {
        Self {
            repository,
            clock,
            stale_after_ms,
        }
    }

    pub async fn execute(&self) -> SweepReport {
        let now = Timestamp::new(self.clock.now_millis());
        let report = self.repository.sweep(now, self.stale_after_ms).await;
        if report.is_empty() {
            tracing::debug!("Sweep found no stale state");
        } else {
            tracing::info!(
                "Sweep removed {} rate-limit states, {} queues ({} signals), {} sessions",
                report.rate_limits_removed,
                report.queues_removed,
                report.signals_dropped,
                report.sessions_removed
            );
        }
        report
    }
}
