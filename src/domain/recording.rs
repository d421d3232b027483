// Recording domain model
use super::balance::MotionSample;
use super::error::RecordingError;
use super::series::VideoFrame;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct Recording {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub frames: Vec<VideoFrame>,
    pub motion: Vec<MotionSample>,
}

impl Recording {
    pub fn new(id: String, frames: Vec<VideoFrame>, motion: Vec<MotionSample>) -> Self {
        let name = Self::format_name(&id);
        Self {
            id,
            name,
            created_at: Utc::now(),
            frames,
            motion,
        }
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    fn format_name(id: &str) -> String {
        // "cmj_trial_" -> "Cmj trial"
        let spaced = id.trim_end_matches('_').replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => spaced,
        }
    }

    /// Frames and motion samples must not go back in time.
    pub fn validate_timeline(&self) -> Result<(), RecordingError> {
        for (index, pair) in self.frames.windows(2).enumerate() {
            if pair[1].video_time < pair[0].video_time {
                return Err(RecordingError::NonMonotonicTimeline {
                    index: index + 1,
                    video_time: pair[1].video_time,
                    previous: pair[0].video_time,
                });
            }
        }
        for (index, pair) in self.motion.windows(2).enumerate() {
            if pair[1].timestamp_ms < pair[0].timestamp_ms {
                return Err(RecordingError::NonMonotonicMotion {
                    index: index + 1,
                    timestamp_ms: pair[1].timestamp_ms,
                    previous: pair[0].timestamp_ms,
                });
            }
        }
        Ok(())
    }

    /// Joints with at least one angle reading, sorted.
    pub fn joints(&self) -> Vec<String> {
        self.frames
            .iter()
            .flat_map(|frame| {
                frame
                    .joint_data
                    .iter()
                    .filter(|(_, reading)| reading.angle.is_some())
                    .map(|(joint, _)| joint.clone())
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn duration_s(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.video_time - first.video_time,
            _ => 0.0,
        }
    }

    pub fn summary(&self) -> RecordingSummary {
        RecordingSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            frame_count: self.frames.len(),
            motion_sample_count: self.motion.len(),
            duration_s: self.duration_s(),
            joints: self.joints(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub frame_count: usize,
    pub motion_sample_count: usize,
    pub duration_s: f64,
    pub joints: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::fixtures::frames_for;

    #[test]
    fn test_format_name() {
        let recording = Recording::new("cmj_trial_".to_string(), vec![], vec![]);
        assert_eq!(recording.name, "Cmj trial");

        let recording = Recording::new("session_72".to_string(), vec![], vec![]);
        assert_eq!(recording.name, "Session 72");
    }

    #[test]
    fn test_validate_timeline() {
        let mut frames = frames_for("left_knee", &[Some(170.0), Some(160.0), Some(150.0)]);
        let recording = Recording::new("ok".to_string(), frames.clone(), vec![]);
        assert!(recording.validate_timeline().is_ok());

        frames[2].video_time = 0.0;
        let recording = Recording::new("bad".to_string(), frames, vec![]);
        assert!(matches!(
            recording.validate_timeline(),
            Err(RecordingError::NonMonotonicTimeline { index: 2, .. })
        ));
    }

    #[test]
    fn test_joints_and_duration() {
        let mut frames = frames_for("left_knee", &[Some(170.0), None, Some(150.0)]);
        frames.extend(frames_for("right_hip", &[None]));
        frames[3].video_time = 0.1;
        let recording = Recording::new("r".to_string(), frames, vec![]);

        assert_eq!(recording.joints(), vec!["left_knee".to_string()]);
        assert!((recording.duration_s() - 0.1).abs() < 1e-12);
    }
}
