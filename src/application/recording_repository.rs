// Repository trait for recording storage
use crate::domain::recording::{Recording, RecordingSummary};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait RecordingRepository: Send + Sync {
    /// Summaries of all stored recordings, oldest first
    async fn list_recordings(&self) -> anyhow::Result<Vec<RecordingSummary>>;

    /// Fetch one recording by id
    async fn get_recording(&self, id: &str) -> anyhow::Result<Option<Arc<Recording>>>;

    /// Store a recording, replacing any previous one with the same id
    async fn save_recording(&self, recording: Recording) -> anyhow::Result<()>;
}
