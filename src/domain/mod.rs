// Domain layer - Kinematic series processing, free of I/O
pub mod balance;
pub mod chart;
pub mod downsample;
pub mod error;
pub mod jump;
pub mod recording;
pub mod series;
pub mod smoothing;
