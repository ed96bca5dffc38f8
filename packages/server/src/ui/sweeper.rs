//! Background task that periodically drops stale per-connection state.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::usecase::SweepStaleStateUseCase;

/// Run `usecase` every `every` until `shutdown` flips to true or its sender is dropped.
pub fn spawn_sweeper(
    usecase: Arc<SweepStaleStateUseCase>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    usecase.execute().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("Sweeper stopped");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionId, EventKind, SignalingRepository, SignalingState, Timestamp},
        infrastructure::repository::InMemorySignalingRepository,
    };
    use podium_shared::time::ManualClock;
    use tokio::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval_and_stops_on_shutdown() {
        // テスト項目: 一定間隔でスイープが実行され、停止シグナルでタスクが終了する
        // given (前提条件):
        let state = Arc::new(Mutex::new(SignalingState::default()));
        let repository = Arc::new(InMemorySignalingRepository::new(state.clone()));
        let clock = Arc::new(ManualClock::new(0));
        let usecase = Arc::new(SweepStaleStateUseCase::new(
            repository.clone(),
            clock.clone(),
            1_000,
        ));
        let viewer = ConnectionId::new("viewer".to_string()).unwrap();
        repository
            .register_connection(viewer.clone(), None, Timestamp::new(0))
            .await;
        repository
            .check_rate(&viewer, EventKind::ChatMessage, Timestamp::new(0))
            .await;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // when (操作):
        let handle = spawn_sweeper(usecase, Duration::from_secs(10), shutdown_rx);
        clock.advance(5_000);
        tokio::time::sleep(Duration::from_secs(11)).await;

        // then (期待する結果):
        assert!(state.lock().await.rate_limit_state(&viewer).is_none());
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
