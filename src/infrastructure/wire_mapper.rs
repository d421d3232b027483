// Mapper between domain models and JSON wire types
use crate::application::live_tracker::LiveReadout;
use crate::application::streaming_service::AnalysisMessage;
use crate::domain::balance::{AxisStats, BalanceReport, MotionSample, Orientation, Vector3};
use crate::domain::chart::{ChartKind, SeriesData};
use crate::domain::jump::JumpEvent;
use crate::domain::recording::{Recording, RecordingSummary};
use crate::domain::series::{AnglePoint, ChartPoint, JointReading, Keypoint, VideoFrame};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ---- Inbound ----

#[derive(Debug, Deserialize)]
pub struct WireKeypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WireFrame {
    pub video_time: f64,
    #[serde(default)]
    pub keypoints: HashMap<String, WireKeypoint>,
    /// Included joint angles in degrees; `null` when the joint was not resolved.
    #[serde(default)]
    pub joints: HashMap<String, Option<f64>>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct WireVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Deserialize, Default)]
pub struct WireRotation {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

#[derive(Debug, Deserialize)]
pub struct WireMotionSample {
    pub timestamp_ms: f64,
    #[serde(default)]
    pub acceleration: WireVector,
    #[serde(default)]
    pub acceleration_including_gravity: WireVector,
    #[serde(default)]
    pub rotation: WireRotation,
}

#[derive(Debug, Deserialize)]
pub struct WireRecording {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub frames: Vec<WireFrame>,
    #[serde(default)]
    pub motion: Vec<WireMotionSample>,
}

pub fn frame_from_wire(frame: WireFrame) -> VideoFrame {
    let keypoints = frame
        .keypoints
        .into_iter()
        .map(|(name, kp)| (name, Keypoint::new(kp.x, kp.y, kp.score)))
        .collect();
    let joint_data = frame
        .joints
        .into_iter()
        .map(|(name, angle)| (name, JointReading { angle }))
        .collect();
    VideoFrame::new(frame.video_time, keypoints, joint_data)
}

fn vector_from_wire(v: WireVector) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

fn motion_from_wire(sample: WireMotionSample) -> MotionSample {
    MotionSample {
        timestamp_ms: sample.timestamp_ms,
        acceleration: vector_from_wire(sample.acceleration),
        acceleration_including_gravity: vector_from_wire(sample.acceleration_including_gravity),
        rotation: Orientation {
            alpha: sample.rotation.alpha,
            beta: sample.rotation.beta,
            gamma: sample.rotation.gamma,
        },
    }
}

pub fn recording_from_wire(id: String, wire: WireRecording) -> Recording {
    let frames = wire.frames.into_iter().map(frame_from_wire).collect();
    let motion = wire.motion.into_iter().map(motion_from_wire).collect();
    let recording = Recording::new(id, frames, motion);
    match wire.name {
        Some(name) => recording.with_name(name),
        None => recording,
    }
}

// ---- Outbound ----

#[derive(Debug, Serialize)]
pub struct WireRecordingSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub frame_count: usize,
    pub motion_sample_count: usize,
    pub duration_s: f64,
    pub joints: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct WireAnglePoint {
    pub index: usize,
    pub angle: f64,
    pub y_value: f64,
    pub video_time: f64,
}

#[derive(Debug, Serialize)]
pub struct WireJumpEvent {
    pub impulse_point: WireAnglePoint,
    pub takeoff_point: WireAnglePoint,
    pub apex_point: WireAnglePoint,
    pub landing_point: WireAnglePoint,
    pub cushion_point: WireAnglePoint,
    pub flight_time_s: f64,
    pub jump_height_m: f64,
    pub crouch_depth_deg: f64,
}

#[derive(Debug, Serialize)]
pub struct WirePoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct WireSeries {
    pub id: String,
    pub kind: &'static str,
    pub unit: &'static str,
    pub source_len: usize,
    pub points: Vec<WirePoint>,
}

#[derive(Debug, Serialize)]
pub struct WireAxisStats {
    pub mean: f64,
    pub variance: f64,
    pub rms: f64,
    pub jerk: f64,
    pub dominant_frequency_hz: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct WireMotionStats {
    pub x: WireAxisStats,
    pub y: WireAxisStats,
    pub z: WireAxisStats,
    pub magnitude: WireAxisStats,
    pub sample_rate_hz: f64,
    pub duration_s: f64,
}

#[derive(Debug, Serialize)]
pub struct WireEllipse {
    pub semi_major: f64,
    pub semi_minor: f64,
    pub angle_deg: f64,
    pub area: f64,
}

#[derive(Debug, Serialize)]
pub struct WireCopStats {
    pub mean_x: f64,
    pub mean_y: f64,
    pub rms_distance: f64,
    pub path_length: f64,
    pub mean_velocity: f64,
    pub ellipse: WireEllipse,
    pub boundary: Vec<WirePoint>,
}

#[derive(Debug, Serialize)]
pub struct WireBalanceReport {
    pub motion: WireMotionStats,
    pub cop: WireCopStats,
}

#[derive(Debug, Serialize)]
pub struct WireLiveReadout {
    pub video_time: f64,
    pub flexion: BTreeMap<String, f64>,
    pub speed: BTreeMap<String, f64>,
    pub frames_seen: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireStreamMessage {
    Skeleton {
        recording: WireRecordingSummary,
        flexion_charts: Vec<String>,
        speed_charts: Vec<String>,
        max_points: usize,
    },
    ChartUpdate {
        series: WireSeries,
    },
    JumpUpdate {
        joint: String,
        events: Vec<WireJumpEvent>,
    },
    BalanceUpdate {
        report: Option<WireBalanceReport>,
    },
    Complete {
        widgets: usize,
        duration_ms: i64,
    },
    Failed {
        message: String,
    },
}

pub fn summary_to_wire(summary: RecordingSummary) -> WireRecordingSummary {
    WireRecordingSummary {
        id: summary.id,
        name: summary.name,
        created_at: summary.created_at,
        frame_count: summary.frame_count,
        motion_sample_count: summary.motion_sample_count,
        duration_s: summary.duration_s,
        joints: summary.joints,
    }
}

fn angle_point_to_wire(point: &AnglePoint) -> WireAnglePoint {
    WireAnglePoint {
        index: point.index,
        angle: point.angle,
        y_value: point.y_value,
        video_time: point.video_time,
    }
}

pub fn jump_to_wire(event: &JumpEvent) -> WireJumpEvent {
    WireJumpEvent {
        impulse_point: angle_point_to_wire(&event.impulse_point),
        takeoff_point: angle_point_to_wire(&event.takeoff_point),
        apex_point: angle_point_to_wire(&event.apex_point),
        landing_point: angle_point_to_wire(&event.landing_point),
        cushion_point: angle_point_to_wire(&event.cushion_point),
        flight_time_s: event.flight_time(),
        jump_height_m: event.jump_height_m(),
        crouch_depth_deg: event.crouch_depth(),
    }
}

fn point_to_wire(point: &ChartPoint) -> WirePoint {
    WirePoint {
        x: point.x,
        y: point.y,
    }
}

pub fn series_to_wire(series: SeriesData) -> WireSeries {
    let kind = match series.kind {
        ChartKind::Flexion => "flexion",
        ChartKind::Speed => "speed",
    };
    WireSeries {
        id: series.id,
        kind,
        unit: series.kind.unit(),
        source_len: series.source_len,
        points: series.points.iter().map(point_to_wire).collect(),
    }
}

fn axis_to_wire(axis: &AxisStats) -> WireAxisStats {
    WireAxisStats {
        mean: axis.mean,
        variance: axis.variance,
        rms: axis.rms,
        jerk: axis.jerk,
        dominant_frequency_hz: axis.dominant_frequency_hz,
    }
}

pub fn balance_to_wire(report: &BalanceReport) -> WireBalanceReport {
    let motion = &report.motion;
    let cop = &report.cop;
    WireBalanceReport {
        motion: WireMotionStats {
            x: axis_to_wire(&motion.x),
            y: axis_to_wire(&motion.y),
            z: axis_to_wire(&motion.z),
            magnitude: axis_to_wire(&motion.magnitude),
            sample_rate_hz: motion.sample_rate_hz,
            duration_s: motion.duration_s,
        },
        cop: WireCopStats {
            mean_x: cop.mean_x,
            mean_y: cop.mean_y,
            rms_distance: cop.rms_distance,
            path_length: cop.path_length,
            mean_velocity: cop.mean_velocity,
            ellipse: WireEllipse {
                semi_major: cop.ellipse.semi_major,
                semi_minor: cop.ellipse.semi_minor,
                angle_deg: cop.ellipse.angle_deg,
                area: cop.ellipse.area,
            },
            boundary: cop.boundary.iter().map(point_to_wire).collect(),
        },
    }
}

pub fn readout_to_wire(readout: LiveReadout) -> WireLiveReadout {
    WireLiveReadout {
        video_time: readout.video_time,
        flexion: readout.flexion,
        speed: readout.speed,
        frames_seen: readout.frames_seen,
    }
}

pub fn message_to_wire(message: AnalysisMessage) -> WireStreamMessage {
    match message {
        AnalysisMessage::Skeleton {
            recording,
            flexion_charts,
            speed_charts,
            max_points,
        } => WireStreamMessage::Skeleton {
            recording: summary_to_wire(recording),
            flexion_charts,
            speed_charts,
            max_points,
        },
        AnalysisMessage::ChartUpdate(series) => WireStreamMessage::ChartUpdate {
            series: series_to_wire(series),
        },
        AnalysisMessage::JumpUpdate { joint, events } => WireStreamMessage::JumpUpdate {
            joint,
            events: events.iter().map(jump_to_wire).collect(),
        },
        AnalysisMessage::BalanceUpdate(report) => WireStreamMessage::BalanceUpdate {
            report: report.as_ref().map(balance_to_wire),
        },
        AnalysisMessage::Complete { widgets, duration_ms } => {
            WireStreamMessage::Complete { widgets, duration_ms }
        }
        AnalysisMessage::Failed { message } => WireStreamMessage::Failed { message },
    }
}
