//! InMemory Lecture Catalog 実装
//!
//! 終了した録画を講義 ID と紐づけてメモリ上に保持します。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{CatalogError, FinishedRecording, LectureCatalog};

/// インメモリ Lecture Catalog 実装
#[derive(Default)]
pub struct InMemoryLectureCatalog {
    /// 紐づけ済みの録画（古い順）
    recordings: Arc<Mutex<Vec<FinishedRecording>>>,
}

impl InMemoryLectureCatalog {
    pub fn new(recordings: Arc<Mutex<Vec<FinishedRecording>>>) -> Self {
        Self { recordings }
    }
}

#[async_trait]
impl LectureCatalog for InMemoryLectureCatalog {
    async fn tag_recording(&self, recording: FinishedRecording) -> Result<(), CatalogError> {
        let mut recordings = self.recordings.lock().await;
        tracing::debug!(
            "Tagged recording of lecture '{}' ({} ms)",
            recording.lecture_id,
            recording.duration_ms
        );
        recordings.push(recording);
        Ok(())
    }

    async fn list_recordings(&self) -> Result<Vec<FinishedRecording>, CatalogError> {
        let recordings = self.recordings.lock().await;
        Ok(recordings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LectureId, SessionId, Timestamp};

    #[tokio::test]
    async fn test_tag_and_list_recordings() {
        // テスト項目: 紐づけた録画が古い順に一覧できる
        // given (前提条件):
        let catalog = InMemoryLectureCatalog::default();
        let recording = |lecture: &str, started: i64| FinishedRecording {
            lecture_id: LectureId::new(lecture.to_string()).unwrap(),
            session_id: SessionId::new("s1".to_string()).unwrap(),
            started_at: Timestamp::new(started),
            stopped_at: Timestamp::new(started + 10),
            duration_ms: 10,
        };

        // when (操作):
        catalog.tag_recording(recording("L1", 0)).await.unwrap();
        catalog.tag_recording(recording("L2", 100)).await.unwrap();

        // then (期待する結果):
        let listed = catalog.list_recordings().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].lecture_id.as_str(), "L1");
        assert_eq!(listed[1].lecture_id.as_str(), "L2");
    }
}
