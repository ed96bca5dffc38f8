//! UseCase: 配信状態の取得

use std::sync::Arc;

use crate::domain::{SignalingRepository, StreamStatus};

pub struct GetStreamStatusUseCase {
    repository: Arc<dyn SignalingRepository>,
}

impl GetStreamStatusUseCase {
    pub fn new(repository: Arc<dyn SignalingRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> StreamStatus {
        self.repository.get_stream_status().await
    }
}
