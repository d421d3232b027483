// In-memory recording repository
use crate::application::recording_repository::RecordingRepository;
use crate::domain::recording::{Recording, RecordingSummary};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    recordings: RwLock<HashMap<String, Arc<Recording>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordingRepository for InMemoryRepository {
    async fn list_recordings(&self) -> Result<Vec<RecordingSummary>> {
        let recordings = self.recordings.read().await;
        let mut summaries: Vec<RecordingSummary> = recordings.values().map(|r| r.summary()).collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        tracing::debug!("Listing {} recordings", summaries.len());
        Ok(summaries)
    }

    async fn get_recording(&self, id: &str) -> Result<Option<Arc<Recording>>> {
        Ok(self.recordings.read().await.get(id).cloned())
    }

    async fn save_recording(&self, recording: Recording) -> Result<()> {
        let mut recordings = self.recordings.write().await;
        if recordings.contains_key(&recording.id) {
            tracing::debug!("Replacing recording {}", recording.id);
        }
        recordings.insert(recording.id.clone(), Arc::new(recording));
        Ok(())
    }
}
