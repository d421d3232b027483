// Balance statistics over accelerometer/gyroscope streams
use super::error::{check_threshold, check_window, ConfigError};
use super::series::ChartPoint;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::Deserialize;

/// Chi-square value for two degrees of freedom at 95%.
const CHI2_95_2DOF: f64 = 5.991;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Device orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub timestamp_ms: f64,
    pub acceleration: Vector3,
    pub acceleration_including_gravity: Vector3,
    pub rotation: Orientation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Height of the centre of mass above the support surface.
    pub com_height_cm: f64,
    pub min_fft_samples: usize,
    pub min_frequency_hz: f64,
    pub max_frequency_hz: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            com_height_cm: 100.0,
            min_fft_samples: 32,
            min_frequency_hz: 0.1,
            max_frequency_hz: 10.0,
        }
    }
}

impl BalanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("com_height_cm", self.com_height_cm)?;
        check_threshold("min_frequency_hz", self.min_frequency_hz)?;
        check_threshold("max_frequency_hz", self.max_frequency_hz)?;
        check_window("min_fft_samples", self.min_fft_samples, 4)?;
        if self.max_frequency_hz <= self.min_frequency_hz {
            return Err(ConfigError::Inconsistent(format!(
                "max_frequency_hz ({}) must exceed min_frequency_hz ({})",
                self.max_frequency_hz, self.min_frequency_hz
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStats {
    pub mean: f64,
    pub variance: f64,
    pub rms: f64,
    /// Mean absolute rate of change, per second.
    pub jerk: f64,
    pub dominant_frequency_hz: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionStats {
    pub x: AxisStats,
    pub y: AxisStats,
    pub z: AxisStats,
    pub magnitude: AxisStats,
    pub sample_rate_hz: f64,
    pub duration_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceEllipse {
    pub semi_major: f64,
    pub semi_minor: f64,
    /// Orientation of the major axis from the x axis.
    pub angle_deg: f64,
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopStats {
    pub mean_x: f64,
    pub mean_y: f64,
    pub rms_distance: f64,
    pub path_length: f64,
    pub mean_velocity: f64,
    pub ellipse: ConfidenceEllipse,
    /// Convex hull of the trace, counter-clockwise.
    pub boundary: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    pub motion: MotionStats,
    pub cop: CopStats,
}

#[derive(Debug, Clone)]
pub struct BalanceStatsEngine {
    config: BalanceConfig,
}

impl BalanceStatsEngine {
    pub fn new(config: BalanceConfig) -> Self {
        Self { config }
    }

    /// Summarise a recording's motion samples. Needs at least two samples
    /// spanning a positive duration.
    pub fn analyze(&self, samples: &[MotionSample]) -> Option<BalanceReport> {
        let (first, last) = (samples.first()?, samples.last()?);
        let duration_s = (last.timestamp_ms - first.timestamp_ms) / 1000.0;
        if samples.len() < 2 || duration_s <= 0.0 {
            return None;
        }

        let times: Vec<f64> = samples.iter().map(|s| s.timestamp_ms / 1000.0).collect();
        let sample_rate_hz = estimate_sample_rate(&times)?;

        let axis = |f: fn(&MotionSample) -> f64| {
            let values: Vec<f64> = samples.iter().map(f).collect();
            self.axis_stats(&values, &times, sample_rate_hz)
        };

        let motion = MotionStats {
            x: axis(|s| s.acceleration.x),
            y: axis(|s| s.acceleration.y),
            z: axis(|s| s.acceleration.z),
            magnitude: axis(|s| s.acceleration.magnitude()),
            sample_rate_hz,
            duration_s,
        };

        let trace: Vec<ChartPoint> = samples.iter().map(|s| self.center_of_pressure(s)).collect();
        let cop = cop_stats(&trace, duration_s);

        Some(BalanceReport { motion, cop })
    }

    /// Inverted-pendulum projection of the device tilt onto the floor.
    pub fn center_of_pressure(&self, sample: &MotionSample) -> ChartPoint {
        let h = self.config.com_height_cm;
        ChartPoint::new(
            h * sample.rotation.gamma.to_radians().sin(),
            h * sample.rotation.beta.to_radians().sin(),
        )
    }

    fn axis_stats(&self, values: &[f64], times: &[f64], sample_rate_hz: f64) -> AxisStats {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let rms = (values.iter().map(|v| v * v).sum::<f64>() / n).sqrt();

        let rates: Vec<f64> = values
            .windows(2)
            .zip(times.windows(2))
            .filter(|(_, t)| t[1] > t[0])
            .map(|(v, t)| ((v[1] - v[0]) / (t[1] - t[0])).abs())
            .collect();
        let jerk = if rates.is_empty() {
            0.0
        } else {
            rates.iter().sum::<f64>() / rates.len() as f64
        };

        AxisStats {
            mean,
            variance,
            rms,
            jerk,
            dominant_frequency_hz: self.dominant_frequency(values, mean, sample_rate_hz),
        }
    }

    fn dominant_frequency(&self, values: &[f64], mean: f64, sample_rate_hz: f64) -> Option<f64> {
        let n = values.len();
        if n < self.config.min_fft_samples || sample_rate_hz <= 0.0 {
            return None;
        }

        // Detrended, Hamming-windowed
        let mut buffer: Vec<Complex<f64>> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let w = 0.54 - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos();
                Complex::new((v - mean) * w, 0.0)
            })
            .collect();

        let mut planner = FftPlanner::new();
        planner.plan_fft_forward(n).process(&mut buffer);

        let half_n = n / 2;
        let power: Vec<f64> = buffer.iter().take(half_n + 1).map(|c| c.norm_sqr()).collect();
        let resolution = sample_rate_hz / n as f64;
        let min_bin = ((self.config.min_frequency_hz / resolution).ceil() as usize).max(1);
        let max_bin = ((self.config.max_frequency_hz / resolution).floor() as usize).min(half_n);
        if min_bin > max_bin {
            return None;
        }

        let mut peak = min_bin;
        for bin in min_bin..=max_bin {
            if power[bin] > power[peak] {
                peak = bin;
            }
        }
        if power[peak] <= f64::EPSILON {
            return None;
        }

        // Parabolic refinement around the peak bin
        let refined = if peak > 0 && peak < half_n {
            let (y_m1, y_0, y_p1) = (power[peak - 1], power[peak], power[peak + 1]);
            let denom = y_m1 - 2.0 * y_0 + y_p1;
            let delta = if denom.abs() > 1e-12 { 0.5 * (y_m1 - y_p1) / denom } else { 0.0 };
            if delta.is_finite() && delta.abs() <= 1.0 {
                peak as f64 + delta
            } else {
                peak as f64
            }
        } else {
            peak as f64
        };

        Some(refined * resolution)
    }
}

fn estimate_sample_rate(times: &[f64]) -> Option<f64> {
    let mut steps: Vec<f64> = times
        .windows(2)
        .map(|t| t[1] - t[0])
        .filter(|dt| *dt > 0.0)
        .collect();
    if steps.is_empty() {
        return None;
    }
    steps.sort_by(f64::total_cmp);
    Some(1.0 / steps[steps.len() / 2])
}

fn cop_stats(trace: &[ChartPoint], duration_s: f64) -> CopStats {
    let n = trace.len() as f64;
    let mean_x = trace.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = trace.iter().map(|p| p.y).sum::<f64>() / n;

    let rms_distance = (trace
        .iter()
        .map(|p| (p.x - mean_x).powi(2) + (p.y - mean_y).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    let path_length: f64 = trace
        .windows(2)
        .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
        .sum();

    CopStats {
        mean_x,
        mean_y,
        rms_distance,
        path_length,
        mean_velocity: path_length / duration_s,
        ellipse: confidence_ellipse(trace, mean_x, mean_y),
        boundary: convex_hull(trace),
    }
}

fn confidence_ellipse(trace: &[ChartPoint], mean_x: f64, mean_y: f64) -> ConfidenceEllipse {
    let n = trace.len() as f64;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in trace {
        let (dx, dy) = (p.x - mean_x, p.y - mean_y);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let (sxx, syy, sxy) = (sxx / n, syy / n, sxy / n);

    let half_trace = (sxx + syy) / 2.0;
    let spread = (((sxx - syy) / 2.0).powi(2) + sxy * sxy).sqrt();
    let major = (half_trace + spread).max(0.0);
    let minor = (half_trace - spread).max(0.0);

    let semi_major = (CHI2_95_2DOF * major).sqrt();
    let semi_minor = (CHI2_95_2DOF * minor).sqrt();

    ConfidenceEllipse {
        semi_major,
        semi_minor,
        angle_deg: (0.5 * (2.0 * sxy).atan2(sxx - syy)).to_degrees(),
        area: std::f64::consts::PI * semi_major * semi_minor,
    }
}

/// Monotone-chain convex hull. Degenerate traces collapse to their
/// distinct points.
fn convex_hull(trace: &[ChartPoint]) -> Vec<ChartPoint> {
    let mut points = trace.to_vec();
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    fn cross(o: &ChartPoint, a: &ChartPoint, b: &ChartPoint) -> f64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    }

    // Andrew's monotone chain: lower chain left to right, upper chain back.
    let mut hull: Vec<ChartPoint> = Vec::with_capacity(points.len() * 2);
    for p in &points {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }

    // The upper chain never pops into the lower one.
    let upper_floor = hull.len() + 1;
    for p in points.iter().rev().skip(1) {
        while hull.len() >= upper_floor && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t_ms: f64, accel: Vector3, beta: f64, gamma: f64) -> MotionSample {
        MotionSample {
            timestamp_ms: t_ms,
            acceleration: accel,
            acceleration_including_gravity: Vector3::new(accel.x, accel.y, accel.z + 9.81),
            rotation: Orientation {
                alpha: 0.0,
                beta,
                gamma,
            },
        }
    }

    #[test]
    fn test_constant_tilt_has_no_sway() {
        let samples: Vec<MotionSample> = (0..100)
            .map(|i| sample(i as f64 * 20.0, Vector3::default(), 2.0, -1.0))
            .collect();
        let report = BalanceStatsEngine::new(BalanceConfig::default())
            .analyze(&samples)
            .unwrap();

        assert_eq!(report.cop.path_length, 0.0);
        assert!(report.cop.rms_distance < 1e-9);
        assert!(report.cop.ellipse.area < 1e-9);
        assert_eq!(report.cop.boundary.len(), 1);
        assert_eq!(report.motion.x.variance, 0.0);
        assert_eq!(report.motion.x.dominant_frequency_hz, None);
        assert!((report.motion.sample_rate_hz - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_dominant_frequency_of_sinusoid() {
        let rate = 50.0;
        let samples: Vec<MotionSample> = (0..256)
            .map(|i| {
                let t = i as f64 / rate;
                let ax = (2.0 * std::f64::consts::PI * 2.0 * t).sin();
                sample(t * 1000.0, Vector3::new(ax, 0.0, 0.0), 0.0, 0.0)
            })
            .collect();
        let report = BalanceStatsEngine::new(BalanceConfig::default())
            .analyze(&samples)
            .unwrap();

        let freq = report.motion.x.dominant_frequency_hz.unwrap();
        assert!((freq - 2.0).abs() <= rate / 256.0);
        assert!((report.motion.x.rms - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.01);
        assert!(report.motion.x.mean.abs() < 0.05);
    }

    #[test]
    fn test_jerk_of_ramp() {
        let samples: Vec<MotionSample> = (0..10)
            .map(|i| sample(i as f64 * 100.0, Vector3::new(i as f64 * 0.5, 0.0, 0.0), 0.0, 0.0))
            .collect();
        let report = BalanceStatsEngine::new(BalanceConfig::default())
            .analyze(&samples)
            .unwrap();
        // 0.5 per 0.1 s
        assert!((report.motion.x.jerk - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_samples() {
        let engine = BalanceStatsEngine::new(BalanceConfig::default());
        assert!(engine.analyze(&[]).is_none());
        assert!(engine.analyze(&[sample(0.0, Vector3::default(), 0.0, 0.0)]).is_none());
    }

    #[test]
    fn test_hull_of_square_trace() {
        let mut trace = vec![
            ChartPoint::new(0.0, 0.0),
            ChartPoint::new(1.0, 0.0),
            ChartPoint::new(1.0, 1.0),
            ChartPoint::new(0.0, 1.0),
            ChartPoint::new(0.5, 0.5),
            ChartPoint::new(0.2, 0.7),
        ];
        trace.push(trace[0]);
        let hull = convex_hull(&trace);

        assert_eq!(hull.len(), 4);
        for corner in &trace[..4] {
            assert!(hull.contains(corner));
        }
        assert!(!hull.contains(&ChartPoint::new(0.5, 0.5)));
    }

    #[test]
    fn test_hull_keeps_corners_with_edge_points() {
        let corners = [
            ChartPoint::new(0.0, 0.0),
            ChartPoint::new(1.0, 0.0),
            ChartPoint::new(1.0, 1.0),
            ChartPoint::new(0.0, 1.0),
        ];
        assert_eq!(convex_hull(&corners), corners.to_vec());

        let mut trace = corners.to_vec();
        trace.push(ChartPoint::new(0.5, 0.0));
        trace.push(ChartPoint::new(1.0, 0.5));
        trace.push(ChartPoint::new(0.5, 1.0));
        let hull = convex_hull(&trace);
        assert_eq!(hull, corners.to_vec());
    }

    #[test]
    fn test_ellipse_of_elongated_trace() {
        let trace: Vec<ChartPoint> = (0..200)
            .map(|i| {
                let t = i as f64 * 0.1;
                ChartPoint::new(3.0 * t.cos(), t.sin())
            })
            .collect();
        let ellipse = confidence_ellipse(&trace, 0.0, 0.0);
        assert!(ellipse.semi_major > ellipse.semi_minor * 2.0);
        assert!(ellipse.angle_deg.abs() < 10.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(BalanceConfig::default().validate().is_ok());
        let inverted = BalanceConfig {
            min_frequency_hz: 5.0,
            max_frequency_hz: 1.0,
            ..BalanceConfig::default()
        };
        assert!(inverted.validate().is_err());
    }
}
