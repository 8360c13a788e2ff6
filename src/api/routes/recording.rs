//! Recording control endpoints.
//!
//! The start and stop controls of the workflow are exposed as HTTP
//! triggers; a trigger on a disabled control is reported back instead of
//! being forwarded to the session.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::audio::machine::{SessionEvent, SessionSender};
use crate::audio::session::SessionStatusHandle;
use crate::surfaces::SharedSurfaces;

#[derive(Clone)]
pub struct ControlState {
    pub events: SessionSender,
    pub status: SessionStatusHandle,
    pub surfaces: SharedSurfaces,
}

pub fn router(state: ControlState) -> Router {
    Router::new()
        .route("/record/start", post(start_recording))
        .route("/record/stop", post(stop_recording))
        .route("/status", get(session_status))
        .with_state(state)
}

async fn start_recording(State(state): State<ControlState>) -> ApiResult<Json<Value>> {
    if !state.surfaces.lock().await.start.is_enabled() {
        return Ok(Json(json!({
            "accepted": false,
            "reason": "start control is disabled",
        })));
    }

    info!("start recording requested via API");
    dispatch(&state, SessionEvent::StartRequested).await
}

async fn stop_recording(State(state): State<ControlState>) -> ApiResult<Json<Value>> {
    if !state.surfaces.lock().await.stop.is_enabled() {
        return Ok(Json(json!({
            "accepted": false,
            "reason": "stop control is disabled",
        })));
    }

    info!("stop recording requested via API");
    dispatch(&state, SessionEvent::StopRequested).await
}

async fn dispatch(state: &ControlState, event: SessionEvent) -> ApiResult<Json<Value>> {
    state
        .events
        .send(event)
        .map_err(|e| ApiError::internal(format!("session is no longer running: {e}")))?;

    // Small delay to allow the status to be updated
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    let status = state.status.get().await;
    Ok(Json(json!({
        "accepted": true,
        "phase": status.phase.as_str(),
    })))
}

async fn session_status(State(state): State<ControlState>) -> Json<Value> {
    let status = state.status.get().await;
    let ui = state.surfaces.lock().await;

    Json(json!({
        "phase": status.phase.as_str(),
        "recording": status.phase == crate::audio::SessionPhase::Recording,
        "capturing": status.capturing,
        "capture_id": status.capture_id.map(|id| id.to_string()),
        "status": ui.status.text(),
        "timer": ui.timer.text(),
        "start_enabled": ui.start.is_enabled(),
        "stop_enabled": ui.stop.is_enabled(),
        "last_error": status.last_error,
    }))
}
