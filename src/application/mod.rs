// Application layer - Use cases over recordings and live sessions
pub mod analysis_service;
pub mod live_tracker;
pub mod recording_repository;
pub mod recording_service;
pub mod streaming_service;
