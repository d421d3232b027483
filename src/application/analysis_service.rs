// Analysis service - Use cases for jump detection, charts and balance stats
use crate::application::recording_repository::RecordingRepository;
use crate::domain::balance::{BalanceReport, BalanceStatsEngine};
use crate::domain::chart::{ChartKind, SeriesData};
use crate::domain::downsample::downsample;
use crate::domain::error::RecordingError;
use crate::domain::jump::{JumpEvent, JumpPhaseDetector};
use crate::domain::recording::Recording;
use crate::domain::series::{ChartPoint, VideoFrame};
use crate::domain::smoothing::update_keypoint_velocity;
use std::sync::Arc;

#[derive(Clone)]
pub struct AnalysisService {
    repository: Arc<dyn RecordingRepository>,
    detector: JumpPhaseDetector,
    balance: BalanceStatsEngine,
    velocity_window: usize,
}

impl AnalysisService {
    pub fn new(
        repository: Arc<dyn RecordingRepository>,
        detector: JumpPhaseDetector,
        balance: BalanceStatsEngine,
        velocity_window: usize,
    ) -> Self {
        Self {
            repository,
            detector,
            balance,
            velocity_window,
        }
    }

    pub async fn load(&self, recording_id: &str) -> anyhow::Result<Arc<Recording>> {
        self.repository
            .get_recording(recording_id)
            .await?
            .ok_or_else(|| RecordingError::NotFound(recording_id.to_string()).into())
    }

    pub async fn detect_jumps(&self, recording_id: &str, joint: &str) -> anyhow::Result<Vec<JumpEvent>> {
        let recording = self.load(recording_id).await?;
        Ok(self.jumps_for(&recording, joint))
    }

    pub async fn flexion_chart(
        &self,
        recording_id: &str,
        joint: &str,
        max_points: usize,
    ) -> anyhow::Result<SeriesData> {
        let recording = self.load(recording_id).await?;
        Ok(self.flexion_series(&recording, joint, max_points))
    }

    pub async fn balance(&self, recording_id: &str) -> anyhow::Result<Option<BalanceReport>> {
        let recording = self.load(recording_id).await?;
        Ok(self.balance_for(&recording))
    }

    pub fn jumps_for(&self, recording: &Recording, joint: &str) -> Vec<JumpEvent> {
        let events = self.detector.detect(&recording.frames, joint);
        tracing::debug!(
            "Detected {} jumps for joint {} in recording {}",
            events.len(),
            joint,
            recording.id
        );
        events
    }

    /// Smoothed flexion of `joint` over video time, reduced to `max_points`.
    pub fn flexion_series(&self, recording: &Recording, joint: &str, max_points: usize) -> SeriesData {
        let points: Vec<ChartPoint> = self
            .detector
            .smoothed_series(&recording.frames, joint)
            .iter()
            .map(ChartPoint::from)
            .collect();

        SeriesData::new(
            joint.to_string(),
            ChartKind::Flexion,
            points.len(),
            downsample(&points, max_points),
        )
    }

    /// Smoothed speed of `keypoint` over video time, reduced to `max_points`.
    pub fn speed_series(&self, recording: &Recording, keypoint: &str, max_points: usize) -> SeriesData {
        let points = keypoint_speeds(&recording.frames, keypoint, self.velocity_window);
        SeriesData::new(
            keypoint.to_string(),
            ChartKind::Speed,
            points.len(),
            downsample(&points, max_points),
        )
    }

    pub fn balance_for(&self, recording: &Recording) -> Option<BalanceReport> {
        self.balance.analyze(&recording.motion)
    }
}

/// Replays the streaming velocity smoother over a finished recording.
/// Frames missing the keypoint end the current track.
fn keypoint_speeds(frames: &[VideoFrame], keypoint: &str, window: usize) -> Vec<ChartPoint> {
    let mut state = None;
    let mut points = Vec::new();

    for frame in frames {
        let Some(kp) = frame.keypoint(keypoint) else {
            state = None;
            continue;
        };
        let next = update_keypoint_velocity(state.take(), kp.position, frame.video_time, window);
        points.push(ChartPoint::new(frame.video_time, next.velocity_in_pixels));
        state = Some(next);
    }

    points
}
