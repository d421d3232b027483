// Application state for HTTP handlers
use crate::application::analysis_service::AnalysisService;
use crate::application::live_tracker::LiveTracker;
use crate::application::recording_service::RecordingService;
use crate::application::streaming_service::StreamingAnalysisService;
use crate::infrastructure::config::ChartSettings;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub recording_service: RecordingService,
    pub analysis_service: AnalysisService,
    pub streaming_service: StreamingAnalysisService,
    pub live_tracker: Arc<LiveTracker>,
    pub charts: ChartSettings,
}
