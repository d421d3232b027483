// Series domain models - frames, angle points and chart points
use std::collections::HashMap;

/// Included joint angle of a fully extended joint, in degrees.
pub const FULL_EXTENSION_DEG: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub position: Position,
    pub score: Option<f64>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, score: Option<f64>) -> Self {
        Self {
            position: Position::new(x, y),
            score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointReading {
    /// Included angle between the two limb segments, in degrees.
    pub angle: Option<f64>,
}

/// One pose-inference result. Joints and keypoints share identifiers
/// such as `"left_knee"`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub video_time: f64,
    pub keypoints: HashMap<String, Keypoint>,
    pub joint_data: HashMap<String, JointReading>,
}

impl VideoFrame {
    pub fn new(
        video_time: f64,
        keypoints: HashMap<String, Keypoint>,
        joint_data: HashMap<String, JointReading>,
    ) -> Self {
        Self {
            video_time,
            keypoints,
            joint_data,
        }
    }

    pub fn joint_angle(&self, joint: &str) -> Option<f64> {
        self.joint_data
            .get(joint)
            .and_then(|reading| reading.angle)
            .filter(|angle| angle.is_finite())
    }

    pub fn keypoint(&self, name: &str) -> Option<&Keypoint> {
        self.keypoints.get(name)
    }
}

/// A sample of a joint's flexion series. `angle` is flexion in degrees
/// (0 = fully extended).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnglePoint {
    pub index: usize,
    pub angle: f64,
    pub y_value: f64,
    pub video_time: f64,
}

impl AnglePoint {
    pub fn new(index: usize, angle: f64, y_value: f64, video_time: f64) -> Self {
        Self {
            index,
            angle,
            y_value,
            video_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

impl ChartPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<&AnglePoint> for ChartPoint {
    fn from(point: &AnglePoint) -> Self {
        Self::new(point.video_time, point.angle)
    }
}

pub fn flexion_from_included(angle: f64) -> f64 {
    FULL_EXTENSION_DEG - angle
}

/// Build the valid-angle series of one joint. Frames without an angle for
/// the joint are dropped and indices are assigned densely over the rest.
/// A missing keypoint leaves `y_value` at 0.
pub fn build_angle_series(frames: &[VideoFrame], joint: &str) -> Vec<AnglePoint> {
    frames
        .iter()
        .filter_map(|frame| {
            let angle = frame.joint_angle(joint)?;
            let y_value = frame
                .keypoint(joint)
                .map(|kp| kp.position.y)
                .unwrap_or_default();
            Some((flexion_from_included(angle), y_value, frame.video_time))
        })
        .enumerate()
        .map(|(index, (angle, y_value, video_time))| {
            AnglePoint::new(index, angle, y_value, video_time)
        })
        .collect()
}
