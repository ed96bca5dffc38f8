//! UseCase: 録画一覧の取得

use std::sync::Arc;

use crate::domain::{FinishedRecording, LectureCatalog};

use super::error::ListRecordingsError;

pub struct ListRecordingsUseCase {
    catalog: Arc<dyn LectureCatalog>,
}

impl ListRecordingsUseCase {
    pub fn new(catalog: Arc<dyn LectureCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn execute(&self) -> Result<Vec<FinishedRecording>, ListRecordingsError> {
        Ok(self.catalog.list_recordings().await?)
    }
}
