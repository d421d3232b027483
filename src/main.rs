// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use motion_telemetry::application::analysis_service::AnalysisService;
use motion_telemetry::application::live_tracker::LiveTracker;
use motion_telemetry::application::recording_service::RecordingService;
use motion_telemetry::application::streaming_service::StreamingAnalysisService;
use motion_telemetry::domain::balance::BalanceStatsEngine;
use motion_telemetry::domain::jump::JumpPhaseDetector;
use motion_telemetry::infrastructure::config::load_config;
use motion_telemetry::infrastructure::memory_repository::InMemoryRepository;
use motion_telemetry::presentation::app_state::AppState;
use motion_telemetry::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("motion_telemetry=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(InMemoryRepository::new());

    // Create services (application layer)
    let recording_service = RecordingService::new(repository.clone());
    let analysis_service = AnalysisService::new(
        repository,
        JumpPhaseDetector::new(config.detector.clone()),
        BalanceStatsEngine::new(config.balance.clone()),
        config.smoothing.velocity_window,
    );
    let streaming_service =
        StreamingAnalysisService::new(analysis_service.clone(), config.charts.speed_keypoints.clone());
    let live_tracker = Arc::new(LiveTracker::new(
        config.smoothing.clone(),
        config.charts.speed_keypoints.clone(),
    ));

    // Create application state
    let state = Arc::new(AppState {
        recording_service,
        analysis_service,
        streaming_service,
        live_tracker,
        charts: config.charts.clone(),
    });

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind_addr))?;
    tracing::info!("Starting motion-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;

    Ok(())
}
