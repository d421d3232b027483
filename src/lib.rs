// Motion telemetry - kinematic analysis of recorded and live pose data
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
