// Live tracker - Streaming smoothing of incoming frames per session
use crate::domain::series::{flexion_from_included, VideoFrame};
use crate::domain::smoothing::{smooth, update_keypoint_velocity, KeypointVelocityState, SmoothingConfig};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone, PartialEq)]
pub struct LiveReadout {
    pub video_time: f64,
    /// Smoothed flexion per joint present in the frame.
    pub flexion: BTreeMap<String, f64>,
    /// Smoothed speed in px/s per tracked keypoint present in the frame.
    pub speed: BTreeMap<String, f64>,
    /// Frames ingested by the session, this one included.
    pub frames_seen: u64,
}

/// State owned by a single live session.
#[derive(Debug, Default)]
pub struct LiveSession {
    angle_histories: HashMap<String, VecDeque<f64>>,
    velocities: HashMap<String, KeypointVelocityState>,
    frames_seen: u64,
    last_seen: Option<Instant>,
}

impl LiveSession {
    pub fn ingest(&mut self, frame: &VideoFrame, tracked: &[String], config: &SmoothingConfig) -> LiveReadout {
        self.frames_seen += 1;
        self.last_seen = Some(Instant::now());

        let mut flexion = BTreeMap::new();
        for joint in frame.joint_data.keys() {
            let Some(angle) = frame.joint_angle(joint) else {
                continue;
            };
            let history = self.angle_histories.remove(joint).unwrap_or_default();
            let (value, history) = smooth(history, flexion_from_included(angle), config.angle_window);
            self.angle_histories.insert(joint.clone(), history);
            flexion.insert(joint.clone(), value);
        }

        let mut speed = BTreeMap::new();
        for name in tracked {
            let Some(kp) = frame.keypoint(name) else {
                // Tracking lost, start over on the next sighting
                self.velocities.remove(name);
                continue;
            };
            let state = update_keypoint_velocity(
                self.velocities.remove(name),
                kp.position,
                frame.video_time,
                config.velocity_window,
            );
            speed.insert(name.clone(), state.velocity_in_pixels);
            self.velocities.insert(name.clone(), state);
        }

        LiveReadout {
            video_time: frame.video_time,
            flexion,
            speed,
            frames_seen: self.frames_seen,
        }
    }

    fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        self.last_seen
            .is_some_and(|seen| now.saturating_duration_since(seen) >= timeout)
    }
}

/// Registry of live sessions. Each session is behind its own mutex so a
/// quantity's history only ever has one writer.
pub struct LiveTracker {
    config: SmoothingConfig,
    tracked_keypoints: Vec<String>,
    idle_timeout: Option<Duration>,
    sessions: RwLock<HashMap<String, Arc<Mutex<LiveSession>>>>,
}

impl LiveTracker {
    pub fn new(config: SmoothingConfig, tracked_keypoints: Vec<String>) -> Self {
        let idle_timeout = (config.idle_timeout_secs > 0)
            .then(|| Duration::from_secs(config.idle_timeout_secs));
        Self {
            config,
            tracked_keypoints,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn session(&self, session_id: &str) -> Arc<Mutex<LiveSession>> {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Starting live session {}", session_id);
                Arc::new(Mutex::new(LiveSession::default()))
            })
            .clone()
    }

    pub async fn ingest(&self, session_id: &str, frame: &VideoFrame) -> LiveReadout {
        self.evict_idle(Instant::now()).await;
        let session = self.session(session_id).await;
        let mut session = session.lock().await;
        session.ingest(frame, &self.tracked_keypoints, &self.config)
    }

    /// Drop a session and all of its smoothing state.
    pub async fn reset(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::debug!("Discarded live session {}", session_id);
        }
        removed
    }

    /// Drop sessions that have not received a frame within the idle
    /// timeout as of `now`. Sessions busy ingesting are kept.
    pub async fn evict_idle(&self, now: Instant) -> usize {
        let Some(timeout) = self.idle_timeout else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| match session.try_lock() {
            Ok(state) if state.is_idle(now, timeout) => {
                tracing::debug!("Evicting idle live session {}", id);
                false
            }
            _ => true,
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::fixtures::frames_for;

    fn tracker(angle_window: usize) -> LiveTracker {
        LiveTracker::new(
            SmoothingConfig {
                angle_window,
                velocity_window: 3,
                idle_timeout_secs: 60,
            },
            vec!["left_knee".to_string()],
        )
    }

    #[tokio::test]
    async fn test_ingest_smooths_flexion() {
        let tracker = tracker(2);
        let frames = frames_for("left_knee", &[Some(170.0), Some(150.0), Some(130.0)]);

        let readouts = [
            tracker.ingest("s1", &frames[0]).await,
            tracker.ingest("s1", &frames[1]).await,
            tracker.ingest("s1", &frames[2]).await,
        ];

        assert_eq!(readouts[0].flexion["left_knee"], 10.0);
        assert_eq!(readouts[1].flexion["left_knee"], 20.0);
        assert_eq!(readouts[2].flexion["left_knee"], 40.0);
        assert!((readouts[2].speed["left_knee"] - 30.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_zero_window_passes_raw_values() {
        let tracker = tracker(0);
        let frames = frames_for("left_knee", &[Some(170.0), Some(150.0)]);
        tracker.ingest("s1", &frames[0]).await;
        let readout = tracker.ingest("s1", &frames[1]).await;
        assert_eq!(readout.flexion["left_knee"], 30.0);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let tracker = tracker(5);
        let frames = frames_for("left_knee", &[Some(170.0), Some(90.0)]);

        tracker.ingest("a", &frames[0]).await;
        let b = tracker.ingest("b", &frames[1]).await;
        assert_eq!(b.flexion["left_knee"], 90.0);
        assert_eq!(b.speed["left_knee"], 0.0);
    }

    #[tokio::test]
    async fn test_reset_discards_state() {
        let tracker = tracker(5);
        let frames = frames_for("left_knee", &[Some(170.0), Some(90.0)]);

        tracker.ingest("a", &frames[0]).await;
        assert!(tracker.reset("a").await);
        assert!(!tracker.reset("a").await);

        let readout = tracker.ingest("a", &frames[1]).await;
        assert_eq!(readout.flexion["left_knee"], 90.0);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let tracker = tracker(5);
        let frames = frames_for("left_knee", &[Some(170.0), Some(90.0)]);

        tracker.ingest("idle", &frames[0]).await;
        tracker.ingest("other", &frames[0]).await;

        let now = Instant::now();
        assert_eq!(tracker.evict_idle(now + Duration::from_secs(10)).await, 0);
        assert_eq!(tracker.evict_idle(now + Duration::from_secs(61)).await, 2);
        assert!(!tracker.reset("idle").await);

        // An evicted session starts over with fresh smoothing state.
        let readout = tracker.ingest("idle", &frames[1]).await;
        assert_eq!(readout.flexion["left_knee"], 90.0);
        assert_eq!(readout.frames_seen, 1);
    }

    #[tokio::test]
    async fn test_zero_timeout_keeps_sessions() {
        let tracker = LiveTracker::new(
            SmoothingConfig {
                idle_timeout_secs: 0,
                ..SmoothingConfig::default()
            },
            vec![],
        );
        let frames = frames_for("left_knee", &[Some(170.0)]);
        tracker.ingest("s", &frames[0]).await;

        let far_future = Instant::now() + Duration::from_secs(86_400);
        assert_eq!(tracker.evict_idle(far_future).await, 0);
        assert!(tracker.reset("s").await);
    }

    #[tokio::test]
    async fn test_frames_seen_counts_per_session() {
        let tracker = tracker(5);
        let frames = frames_for("left_knee", &[Some(170.0), Some(160.0)]);

        tracker.ingest("a", &frames[0]).await;
        let second = tracker.ingest("a", &frames[1]).await;
        let other = tracker.ingest("b", &frames[0]).await;

        assert_eq!(second.frames_seen, 2);
        assert_eq!(other.frames_seen, 1);
    }

    #[test]
    fn test_lost_keypoint_restarts_velocity() {
        let mut session = LiveSession::default();
        let config = SmoothingConfig::default();
        let tracked = vec!["left_knee".to_string()];
        let mut frames = frames_for("left_knee", &[Some(170.0), Some(160.0), Some(150.0)]);
        frames[1].keypoints.clear();

        session.ingest(&frames[0], &tracked, &config);
        let gap = session.ingest(&frames[1], &tracked, &config);
        let after = session.ingest(&frames[2], &tracked, &config);

        assert!(gap.speed.is_empty());
        assert_eq!(after.speed["left_knee"], 0.0);
        assert_eq!(after.frames_seen, 3);
    }
}
