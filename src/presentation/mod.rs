// Presentation layer - HTTP routing
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, list_recordings, live_frame, put_recording, recording_balance, recording_chart,
    recording_jumps, reset_live_session, stream_recording,
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Compression is handled in the response builders (whole-body or per-chunk),
// so no CompressionLayer here.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/recordings", get(list_recordings))
        .route("/recordings/:id", put(put_recording))
        .route("/recordings/:id/jumps", get(recording_jumps))
        .route("/recordings/:id/chart", get(recording_chart))
        .route("/recordings/:id/balance", get(recording_balance))
        .route("/recordings/:id/stream", get(stream_recording))
        .route("/live/:session/frames", post(live_frame))
        .route("/live/:session", delete(reset_live_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::analysis_service::AnalysisService;
    use crate::application::live_tracker::LiveTracker;
    use crate::application::recording_service::RecordingService;
    use crate::application::streaming_service::StreamingAnalysisService;
    use crate::domain::balance::{BalanceConfig, BalanceStatsEngine};
    use crate::domain::jump::{JumpPhaseConfig, JumpPhaseDetector};
    use crate::domain::series::fixtures::eased_path;
    use crate::domain::smoothing::SmoothingConfig;
    use crate::infrastructure::config::ChartSettings;
    use crate::infrastructure::memory_repository::InMemoryRepository;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let repository = Arc::new(InMemoryRepository::new());
        let analysis_service = AnalysisService::new(
            repository.clone(),
            JumpPhaseDetector::new(JumpPhaseConfig::default()),
            BalanceStatsEngine::new(BalanceConfig::default()),
            5,
        );
        let charts = ChartSettings::default();
        let state = Arc::new(AppState {
            recording_service: RecordingService::new(repository),
            streaming_service: StreamingAnalysisService::new(
                analysis_service.clone(),
                charts.speed_keypoints.clone(),
            ),
            analysis_service,
            live_tracker: Arc::new(LiveTracker::new(
                SmoothingConfig::default(),
                charts.speed_keypoints.clone(),
            )),
            charts,
        });
        router(state)
    }

    fn squat_jump_body() -> Value {
        let angles = eased_path(&[
            (0, 170.0),
            (10, 170.0),
            (25, 40.0),
            (35, 176.0),
            (45, 110.0),
            (60, 170.0),
            (70, 170.0),
        ]);
        let frames: Vec<Value> = angles
            .iter()
            .enumerate()
            .map(|(i, angle)| {
                json!({
                    "video_time": i as f64 / 30.0,
                    "joints": {"left_knee": angle},
                    "keypoints": {"left_hip": {"x": 100.0, "y": 300.0 + i as f64}}
                })
            })
            .collect();
        json!({ "frames": frames })
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app().oneshot(get_request("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_store_then_analyze_recording() {
        let app = app();

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/recordings/cmj_1", &squat_jump_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let summary = body_json(response).await;
        assert_eq!(summary["frame_count"], 71);
        assert_eq!(summary["joints"], json!(["left_knee"]));

        let listed = body_json(app.clone().oneshot(get_request("/recordings")).await.unwrap()).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let jumps = body_json(app.clone().oneshot(get_request("/recordings/cmj_1/jumps")).await.unwrap()).await;
        assert_eq!(jumps.as_array().unwrap().len(), 1);
        assert_eq!(jumps[0]["apex_point"]["index"], 35);

        let chart = body_json(
            app.clone()
                .oneshot(get_request("/recordings/cmj_1/chart?points=12"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(chart["points"].as_array().unwrap().len(), 12);
        assert_eq!(chart["kind"], "flexion");

        let balance = body_json(app.oneshot(get_request("/recordings/cmj_1/balance")).await.unwrap()).await;
        assert!(balance.is_null());
    }

    #[tokio::test]
    async fn test_non_monotonic_upload_is_rejected() {
        let body = json!({
            "frames": [
                {"video_time": 1.0, "joints": {"left_knee": 170.0}},
                {"video_time": 0.5, "joints": {"left_knee": 160.0}}
            ]
        });
        let response = app()
            .oneshot(json_request("PUT", "/recordings/bad", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_recording_is_not_found() {
        let response = app().oneshot(get_request("/recordings/missing/jumps")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_live_session_lifecycle() {
        let app = app();
        let frame = json!({
            "video_time": 0.0,
            "joints": {"left_knee": 150.0},
            "keypoints": {"left_hip": {"x": 10.0, "y": 20.0, "score": 0.9}}
        });

        let response = app
            .clone()
            .oneshot(json_request("POST", "/live/s1/frames", &frame))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let readout = body_json(response).await;
        assert_eq!(readout["flexion"]["left_knee"], 30.0);
        assert_eq!(readout["speed"]["left_hip"], 0.0);
        assert_eq!(readout["frames_seen"], 1);

        let delete_request = |uri: &str| Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap();
        let first = app.clone().oneshot(delete_request("/live/s1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::NO_CONTENT);
        let second = app.oneshot(delete_request("/live/s1")).await.unwrap();
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stream_ends_with_completion() {
        let app = app();
        app.clone()
            .oneshot(json_request("PUT", "/recordings/cmj", &squat_jump_body()))
            .await
            .unwrap();

        let response = app.oneshot(get_request("/recordings/cmj/stream?points=20")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let mut messages = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let len = u32::from_be_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]) as usize;
            let msg: Value = serde_json::from_slice(&bytes[offset + 4..offset + 4 + len]).unwrap();
            messages.push(msg);
            offset += 4 + len;
        }

        assert_eq!(messages.first().unwrap()["type"], "skeleton");
        let last = messages.last().unwrap();
        assert_eq!(last["type"], "complete");
        // flexion chart + jumps, one hip speed chart, balance
        assert_eq!(last["widgets"], 4);
    }
}
