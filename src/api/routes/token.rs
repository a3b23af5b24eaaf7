//! Channel token endpoint.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{required, required_uid, UidParam};
use crate::api::error::{ApiError, ApiResult};
use crate::config::TransportConfig;
use crate::token::{self, Role};

#[derive(Clone)]
pub struct TokenState {
    pub app_id: String,
    pub app_certificate: String,
    pub validity_seconds: u32,
}

impl TokenState {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            app_id: config.app_id.clone(),
            app_certificate: config.app_certificate.clone(),
            validity_seconds: config.token_validity_seconds,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub channel_name: Option<String>,
    pub uid: Option<UidParam>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub app_id: String,
    pub channel_name: String,
    pub uid: String,
    pub expiration_time: u64,
}

pub fn router(state: TokenState) -> Router {
    Router::new()
        .route("/token", post(generate_token))
        .with_state(state)
}

/// POST /rtc/token - Issue a publisher or subscriber token for a channel.
async fn generate_token(
    State(state): State<TokenState>,
    Json(body): Json<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let channel_name = required(body.channel_name, "channelName")?;
    let uid = required_uid(body.uid)?;
    let role = Role::from_request(body.role.as_deref());

    let token = token::generate_token(
        &state.app_id,
        &state.app_certificate,
        &channel_name,
        &uid,
        role,
        state.validity_seconds,
    )
    .map_err(|e| {
        error!("Failed to generate token for channel {}: {}", channel_name, e);
        ApiError::from(e)
    })?;

    info!("Issued {} token for channel {}", role.as_str(), channel_name);

    Ok(Json(TokenResponse {
        token,
        app_id: state.app_id.clone(),
        channel_name,
        uid,
        expiration_time: u64::from(token::unix_now()) + u64::from(state.validity_seconds),
    }))
}
