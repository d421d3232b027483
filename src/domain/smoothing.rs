// Moving-average smoothing for angle and keypoint velocity signals
use super::series::{AnglePoint, Position};
use serde::Deserialize;
use std::collections::VecDeque;

/// Trailing window sizes for live readouts. Zero disables smoothing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub angle_window: usize,
    pub velocity_window: usize,
    /// Live sessions without frames for this long are discarded. Zero keeps
    /// them until reset.
    pub idle_timeout_secs: u64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            angle_window: 5,
            velocity_window: 5,
            idle_timeout_secs: 300,
        }
    }
}

/// Append `sample` to `history`, keep the newest `window` entries and
/// return their mean. A zero window bypasses smoothing and clears the
/// history.
pub fn smooth(mut history: VecDeque<f64>, sample: f64, window: usize) -> (f64, VecDeque<f64>) {
    if window == 0 {
        history.clear();
        return (sample, history);
    }

    history.push_back(sample);
    while history.len() > window {
        history.pop_front();
    }

    let mean = history.iter().sum::<f64>() / history.len() as f64;
    (mean, history)
}

/// Centered sliding-window mean over a finite series. Each output point
/// keeps the index and timestamp of its source point; `angle` and
/// `y_value` are replaced by the window means.
pub fn smooth_centered(points: &[AnglePoint], window: usize) -> Vec<AnglePoint> {
    let n = points.len();
    if window <= 1 {
        return points.to_vec();
    }

    let before = window / 2;
    let after = window.div_ceil(2);

    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let slice = &points[i.saturating_sub(before)..(i + after).min(n)];
            let count = slice.len() as f64;
            let angle = slice.iter().map(|p| p.angle).sum::<f64>() / count;
            let y_value = slice.iter().map(|p| p.y_value).sum::<f64>() / count;
            AnglePoint::new(point.index, angle, y_value, point.video_time)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeypointVelocityState {
    pub position: Position,
    /// Seconds.
    pub last_timestamp: f64,
    /// Smoothed speed in pixels per second.
    pub velocity_in_pixels: f64,
    pub velocity_in_pixels_history: VecDeque<f64>,
}

impl KeypointVelocityState {
    pub fn new(position: Position, timestamp: f64) -> Self {
        Self {
            position,
            last_timestamp: timestamp,
            velocity_in_pixels: 0.0,
            velocity_in_pixels_history: VecDeque::new(),
        }
    }
}

/// Advance a keypoint's velocity state by one observation.
///
/// The raw speed is the pixel distance travelled since the previous
/// observation divided by the elapsed time; the reported speed is the
/// trailing mean of the last `window` raw speeds. An observation whose
/// timestamp does not advance leaves the state untouched.
pub fn update_keypoint_velocity(
    state: Option<KeypointVelocityState>,
    position: Position,
    timestamp: f64,
    window: usize,
) -> KeypointVelocityState {
    let Some(previous) = state else {
        return KeypointVelocityState::new(position, timestamp);
    };

    let elapsed = timestamp - previous.last_timestamp;
    if elapsed <= 0.0 {
        return previous;
    }

    let raw = previous.position.distance_to(&position) / elapsed;
    let (velocity, history) = smooth(previous.velocity_in_pixels_history, raw, window);

    KeypointVelocityState {
        position,
        last_timestamp: timestamp,
        velocity_in_pixels: velocity,
        velocity_in_pixels_history: history,
    }
}
