// Jump phase segmentation over a joint's flexion series
use super::error::{check_threshold, check_window, ConfigError};
use super::series::{build_angle_series, AnglePoint, VideoFrame};
use super::smoothing::smooth_centered;
use serde::Deserialize;

const GRAVITY: f64 = 9.81;

/// Detector thresholds. Angles are flexion degrees, windows are sample
/// counts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JumpPhaseConfig {
    pub min_jump_trending_flexion: f64,
    pub min_flight_trending_flexion: f64,
    pub min_flight_flexion: f64,
    pub min_single_step_flexion: f64,
    pub max_landing_flexion: f64,
    pub min_flexion_before_jump: f64,
    pub min_flexion_after_landing: f64,
    pub sliding_avg_window: usize,
    pub search_window: usize,
    pub trend_window: usize,
}

impl Default for JumpPhaseConfig {
    fn default() -> Self {
        Self {
            min_jump_trending_flexion: 15.0,
            min_flight_trending_flexion: 10.0,
            min_flight_flexion: 20.0,
            min_single_step_flexion: 5.0,
            max_landing_flexion: 60.0,
            min_flexion_before_jump: 45.0,
            min_flexion_after_landing: 30.0,
            sliding_avg_window: 3,
            search_window: 30,
            trend_window: 3,
        }
    }
}

impl JumpPhaseConfig {
    /// The detector assumes a valid configuration; callers run this first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("min_jump_trending_flexion", self.min_jump_trending_flexion)?;
        check_threshold("min_flight_trending_flexion", self.min_flight_trending_flexion)?;
        check_threshold("min_flight_flexion", self.min_flight_flexion)?;
        check_threshold("min_single_step_flexion", self.min_single_step_flexion)?;
        check_threshold("max_landing_flexion", self.max_landing_flexion)?;
        check_threshold("min_flexion_before_jump", self.min_flexion_before_jump)?;
        check_threshold("min_flexion_after_landing", self.min_flexion_after_landing)?;
        check_window("sliding_avg_window", self.sliding_avg_window, 1)?;
        check_window("trend_window", self.trend_window, 1)?;
        check_window("search_window", self.search_window, self.trend_window + 1)?;

        if self.max_landing_flexion < self.min_flight_flexion {
            return Err(ConfigError::Inconsistent(format!(
                "max_landing_flexion ({}) is below min_flight_flexion ({})",
                self.max_landing_flexion, self.min_flight_flexion
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpEvent {
    pub impulse_point: AnglePoint,
    pub takeoff_point: AnglePoint,
    pub apex_point: AnglePoint,
    pub landing_point: AnglePoint,
    pub cushion_point: AnglePoint,
}

impl JumpEvent {
    /// Seconds between takeoff and landing.
    pub fn flight_time(&self) -> f64 {
        self.landing_point.video_time - self.takeoff_point.video_time
    }

    /// Jump height in metres estimated from flight time.
    pub fn jump_height_m(&self) -> f64 {
        let t = self.flight_time().max(0.0);
        GRAVITY * t * t / 8.0
    }

    pub fn crouch_depth(&self) -> f64 {
        self.impulse_point.angle - self.apex_point.angle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    NoImpulse,
    NoCushion,
    OverlapsPrevious,
    ShallowCrouch,
    ShallowCushion,
    LowAmplitude,
    NoTakeoff,
    NoLanding,
}

#[derive(Debug, Clone, Copy)]
struct Phases {
    impulse: usize,
    takeoff: usize,
    apex: usize,
    landing: usize,
    cushion: usize,
}

#[derive(Debug, Clone)]
pub struct JumpPhaseDetector {
    config: JumpPhaseConfig,
}

impl JumpPhaseDetector {
    pub fn new(config: JumpPhaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JumpPhaseConfig {
        &self.config
    }

    /// Smoothed flexion series of `joint`, the detector's working input.
    pub fn smoothed_series(&self, frames: &[VideoFrame], joint: &str) -> Vec<AnglePoint> {
        let valid = build_angle_series(frames, joint);
        smooth_centered(&valid, self.config.sliding_avg_window)
    }

    pub fn detect(&self, frames: &[VideoFrame], joint: &str) -> Vec<JumpEvent> {
        let smoothed = self.smoothed_series(frames, joint);
        self.detect_in_series(&smoothed)
    }

    /// Scan an already smoothed series for jumps, ordered by apex.
    pub fn detect_in_series(&self, series: &[AnglePoint]) -> Vec<JumpEvent> {
        let n = series.len();
        let mut events = Vec::new();
        let mut last_cushion: Option<usize> = None;

        let mut i = 1;
        while i + 1 < n {
            if !self.is_apex_candidate(series, i) {
                i += 1;
                continue;
            }

            match self.evaluate_candidate(series, i, last_cushion) {
                Ok(phases) => {
                    tracing::debug!(
                        "Jump detected: impulse={} takeoff={} apex={} landing={} cushion={}",
                        phases.impulse,
                        phases.takeoff,
                        phases.apex,
                        phases.landing,
                        phases.cushion
                    );
                    events.push(JumpEvent {
                        impulse_point: series[phases.impulse],
                        takeoff_point: series[phases.takeoff],
                        apex_point: series[phases.apex],
                        landing_point: series[phases.landing],
                        cushion_point: series[phases.cushion],
                    });
                    last_cushion = Some(phases.cushion);
                    i += self.config.search_window + 1;
                }
                Err(reason) => {
                    tracing::trace!("Apex candidate {} rejected: {:?}", i, reason);
                    i += 1;
                }
            }
        }

        events
    }

    fn is_apex_candidate(&self, series: &[AnglePoint], i: usize) -> bool {
        let angle = series[i].angle;
        angle < series[i - 1].angle
            && angle < series[i + 1].angle
            && angle < self.config.min_flight_flexion
    }

    fn evaluate_candidate(
        &self,
        series: &[AnglePoint],
        apex: usize,
        last_cushion: Option<usize>,
    ) -> Result<Phases, Rejection> {
        let cfg = &self.config;
        let window_start = apex.saturating_sub(cfg.search_window);
        let window_end = (apex + cfg.search_window).min(series.len() - 1);

        let impulse = find_impulse_point(series, window_start, apex, cfg.trend_window)
            .ok_or(Rejection::NoImpulse)?;
        let cushion = find_cushion_point(series, apex, window_end, cfg.trend_window)
            .ok_or(Rejection::NoCushion)?;

        if last_cushion.is_some_and(|previous| impulse <= previous) {
            return Err(Rejection::OverlapsPrevious);
        }

        let impulse_angle = series[impulse].angle;
        if impulse_angle < cfg.min_flexion_before_jump {
            return Err(Rejection::ShallowCrouch);
        }
        if series[cushion].angle < cfg.min_flexion_after_landing {
            return Err(Rejection::ShallowCushion);
        }
        if (impulse_angle - series[apex].angle).abs() < cfg.min_jump_trending_flexion {
            return Err(Rejection::LowAmplitude);
        }

        let takeoff = self
            .find_takeoff_point(series, impulse, apex)
            .ok_or(Rejection::NoTakeoff)?;
        let landing = self
            .find_landing_point(series, apex, cushion)
            .ok_or(Rejection::NoLanding)?;

        Ok(Phases {
            impulse,
            takeoff,
            apex,
            landing,
            cushion,
        })
    }

    /// Last point before the apex that is still above flight flexion,
    /// has extended far enough from the crouch and is still falling.
    fn find_takeoff_point(&self, series: &[AnglePoint], impulse: usize, apex: usize) -> Option<usize> {
        let cfg = &self.config;
        let impulse_angle = series[impulse].angle;

        (impulse + 1..apex).rev().find(|&j| {
            let angle = series[j].angle;
            let reference = series[j.saturating_sub(cfg.trend_window).max(impulse)].angle;
            angle >= cfg.min_flight_flexion
                && impulse_angle - angle >= cfg.min_flight_trending_flexion
                && angle < reference
        })
    }

    /// First point after the apex that bends back above flight flexion by
    /// at least one step, is still short of a stand-up, leaves room to
    /// absorb before the cushion and is rising.
    fn find_landing_point(&self, series: &[AnglePoint], apex: usize, cushion: usize) -> Option<usize> {
        let cfg = &self.config;
        let apex_angle = series[apex].angle;
        let cushion_angle = series[cushion].angle;

        (apex + 1..cushion).find(|&k| {
            let angle = series[k].angle;
            let reference = series[k.saturating_sub(cfg.trend_window).max(apex)].angle;
            angle >= cfg.min_flight_flexion
                && angle - apex_angle >= cfg.min_single_step_flexion
                && angle <= cfg.max_landing_flexion
                && cushion_angle - angle >= cfg.min_flight_trending_flexion
                && angle > reference
        })
    }
}

fn is_local_max(series: &[AnglePoint], j: usize) -> bool {
    let angle = series[j].angle;
    let left = j == 0 || angle >= series[j - 1].angle;
    let right = j + 1 >= series.len() || angle >= series[j + 1].angle;
    left && right
}

/// Nearest local maximum before the apex followed by `trend` strictly
/// falling samples.
fn find_impulse_point(series: &[AnglePoint], start: usize, apex: usize, trend: usize) -> Option<usize> {
    (start..apex).rev().find(|&j| {
        j + trend <= apex
            && is_local_max(series, j)
            && (j..j + trend).all(|k| series[k].angle > series[k + 1].angle)
    })
}

/// Nearest local maximum after the apex reached through `trend` strictly
/// rising samples.
fn find_cushion_point(series: &[AnglePoint], apex: usize, end: usize, trend: usize) -> Option<usize> {
    (apex + 1..=end).find(|&k| {
        k >= apex + trend
            && is_local_max(series, k)
            && (k - trend..k).all(|m| series[m].angle < series[m + 1].angle)
    })
}
