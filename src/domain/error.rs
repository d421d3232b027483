// Error types for analysis configuration and recordings
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be at least {min}, got {value}")]
    WindowTooSmall {
        name: &'static str,
        min: usize,
        value: usize,
    },

    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("{0}")]
    Inconsistent(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordingError {
    #[error("Recording not found: {0}")]
    NotFound(String),

    #[error("Frame {index} goes back in time ({video_time} < {previous})")]
    NonMonotonicTimeline {
        index: usize,
        video_time: f64,
        previous: f64,
    },

    #[error("Motion sample {index} goes back in time ({timestamp_ms} < {previous})")]
    NonMonotonicMotion {
        index: usize,
        timestamp_ms: f64,
        previous: f64,
    },
}

pub(crate) fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

pub(crate) fn check_window(name: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::WindowTooSmall { name, min, value })
    }
}
