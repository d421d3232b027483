// HTTP request handlers
use crate::domain::error::RecordingError;
use crate::infrastructure::chunked_stream::stream_from_receiver;
use crate::infrastructure::http_response::json_response;
use crate::infrastructure::wire_mapper::{
    balance_to_wire, frame_from_wire, jump_to_wire, readout_to_wire, recording_from_wire,
    series_to_wire, summary_to_wire, WireFrame, WireRecording, WireRecordingSummary,
};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct JointQuery {
    pub joint: Option<String>,
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub joint: Option<String>,
    pub points: Option<usize>,
}

#[derive(Deserialize)]
pub struct StreamQuery {
    pub points: Option<usize>,
}

fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get("accept-encoding")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

fn error_response(action: &str, error: anyhow::Error) -> Response {
    let status = match error.downcast_ref::<RecordingError>() {
        Some(RecordingError::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(_) => StatusCode::UNPROCESSABLE_ENTITY,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Error {}: {:#}", action, error);
    } else {
        tracing::warn!("Rejected {}: {}", action, error);
    }
    (status, error.to_string()).into_response()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all stored recordings
pub async fn list_recordings(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);

    match state.recording_service.list_recordings().await {
        Ok(recordings) => {
            let summaries: Vec<WireRecordingSummary> =
                recordings.into_iter().map(summary_to_wire).collect();
            respond(StatusCode::OK, &summaries, compress).await
        }
        Err(e) => error_response("listing recordings", e),
    }
}

/// Store a finalized recording under `id`, replacing any previous one
pub async fn put_recording(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<WireRecording>,
) -> Response {
    let recording = recording_from_wire(id, body);

    match state.recording_service.store_recording(recording).await {
        Ok(summary) => respond(StatusCode::CREATED, &summary_to_wire(summary), false).await,
        Err(e) => error_response("storing recording", e),
    }
}

/// Jump events detected on one joint
pub async fn recording_jumps(
    Path(id): Path<String>,
    Query(query): Query<JointQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let joint = query.joint.unwrap_or_else(|| state.charts.default_joint.clone());

    match state.analysis_service.detect_jumps(&id, &joint).await {
        Ok(events) => {
            let events: Vec<_> = events.iter().map(jump_to_wire).collect();
            respond(StatusCode::OK, &events, accepts_brotli(&headers)).await
        }
        Err(e) => error_response("detecting jumps", e),
    }
}

/// Downsampled flexion chart for one joint
pub async fn recording_chart(
    Path(id): Path<String>,
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let joint = query.joint.unwrap_or_else(|| state.charts.default_joint.clone());
    let points = query.points.unwrap_or(state.charts.max_points);

    match state.analysis_service.flexion_chart(&id, &joint, points).await {
        Ok(series) => respond(StatusCode::OK, &series_to_wire(series), accepts_brotli(&headers)).await,
        Err(e) => error_response("building chart", e),
    }
}

/// Balance report; `null` when the recording carries too little motion data
pub async fn recording_balance(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.analysis_service.balance(&id).await {
        Ok(report) => {
            let report = report.as_ref().map(balance_to_wire);
            respond(StatusCode::OK, &report, accepts_brotli(&headers)).await
        }
        Err(e) => error_response("computing balance", e),
    }
}

/// Stream a recording's full analysis (progressive loading)
pub async fn stream_recording(
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let points = query.points.unwrap_or(state.charts.max_points);
    let compress = accepts_brotli(&headers);

    let rx = state.streaming_service.stream_analysis(&id, points).await;
    stream_from_receiver(rx, compress)
}

/// Feed one frame to a live session and return the smoothed readout
pub async fn live_frame(
    Path(session): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(frame): Json<WireFrame>,
) -> Response {
    let frame = frame_from_wire(frame);
    let readout = state.live_tracker.ingest(&session, &frame).await;
    respond(StatusCode::OK, &readout_to_wire(readout), false).await
}

/// Discard a live session
pub async fn reset_live_session(
    Path(session): Path<String>,
    State(state): State<Arc<AppState>>,
) -> StatusCode {
    if state.live_tracker.reset(&session).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
