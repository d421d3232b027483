// Recording service - Use cases for listing and storing recordings
use crate::application::recording_repository::RecordingRepository;
use crate::domain::recording::{Recording, RecordingSummary};
use std::sync::Arc;

#[derive(Clone)]
pub struct RecordingService {
    repository: Arc<dyn RecordingRepository>,
}

impl RecordingService {
    pub fn new(repository: Arc<dyn RecordingRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_recordings(&self) -> anyhow::Result<Vec<RecordingSummary>> {
        self.repository.list_recordings().await
    }

    /// Validate and store a finalized recording. Timeline errors surface
    /// as `RecordingError` inside the returned error.
    pub async fn store_recording(&self, recording: Recording) -> anyhow::Result<RecordingSummary> {
        recording.validate_timeline()?;
        let summary = recording.summary();

        tracing::debug!(
            "Storing recording {}: {} frames, {} motion samples",
            summary.id,
            summary.frame_count,
            summary.motion_sample_count
        );
        self.repository.save_recording(recording).await?;
        Ok(summary)
    }
}
