//! Cloud recording endpoints.
//!
//! Provides HTTP endpoints for:
//! - Starting a recording for a meeting room (POST /recording/start)
//! - Stopping it and cataloging the output (POST /recording/stop)
//! - Querying the remote recorder (GET /recording/query)
//! - Listing recordings started by this process (GET /recording/active)

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::{required, required_uid, UidParam};
use crate::api::error::{ApiError, ApiResult};
use crate::recording::{
    ActiveRecording, RecordingOrchestrator, StartRecordingRequest, StartRecordingResponse,
    StopRecordingRequest, StopRecordingResponse,
};

#[derive(Clone)]
pub struct RecordingState {
    pub orchestrator: Arc<RecordingOrchestrator>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBody {
    pub room_id: Option<String>,
    pub channel_name: Option<String>,
    pub uid: Option<UidParam>,
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopBody {
    pub resource_id: Option<String>,
    pub sid: Option<String>,
    pub channel_name: Option<String>,
    pub uid: Option<UidParam>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub resource_id: Option<String>,
    pub sid: Option<String>,
}

pub fn router(state: RecordingState) -> Router {
    Router::new()
        .route("/recording/start", post(start_recording))
        .route("/recording/stop", post(stop_recording))
        .route("/recording/query", get(query_recording))
        .route("/recording/active", get(active_recordings))
        .with_state(state)
}

async fn start_recording(
    State(state): State<RecordingState>,
    Json(body): Json<StartBody>,
) -> ApiResult<Json<StartRecordingResponse>> {
    let request = StartRecordingRequest {
        room_id: required(body.room_id, "roomId")?,
        channel_name: required(body.channel_name, "channelName")?,
        uid: required_uid(body.uid)?,
        token: required(body.token, "token")?,
    };

    info!(
        "Start recording requested for room {} channel {}",
        request.room_id, request.channel_name
    );

    let response = state.orchestrator.start(&request).await?;
    Ok(Json(response))
}

async fn stop_recording(
    State(state): State<RecordingState>,
    Json(body): Json<StopBody>,
) -> ApiResult<Json<StopRecordingResponse>> {
    let request = StopRecordingRequest {
        resource_id: required(body.resource_id, "resourceId")?,
        sid: required(body.sid, "sid")?,
        channel_name: required(body.channel_name, "channelName")?,
        uid: required_uid(body.uid)?,
    };

    info!("Stop recording requested for sid {}", request.sid);

    let response = state.orchestrator.stop(&request).await?;
    Ok(Json(response))
}

/// GET /rtc/recording/query - Raw status document from the remote recorder.
async fn query_recording(
    State(state): State<RecordingState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Value>> {
    let (resource_id, sid) = match (params.resource_id, params.sid) {
        (Some(resource_id), Some(sid)) if !resource_id.is_empty() && !sid.is_empty() => {
            (resource_id, sid)
        }
        _ => return Err(ApiError::bad_request("resourceId and sid are required")),
    };

    let status = state.orchestrator.query(&resource_id, &sid).await?;
    Ok(Json(status))
}

async fn active_recordings(State(state): State<RecordingState>) -> Json<Vec<ActiveRecording>> {
    Json(state.orchestrator.active().await)
}
