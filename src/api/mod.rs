//! REST API server for the gateway.
//!
//! Provides HTTP endpoints for:
//! - Channel token issuance
//! - Cloud recording start, stop, query and listing

pub mod error;
pub mod routes;

use crate::config::Config;
use crate::recording::RecordingOrchestrator;
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::info;

pub use routes::recording::RecordingState;
pub use routes::token::TokenState;

pub struct ApiServer {
    host: String,
    port: u16,
    token_state: TokenState,
    recording_state: RecordingState,
}

impl ApiServer {
    pub fn new(config: &Config, orchestrator: Arc<RecordingOrchestrator>) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            token_state: TokenState::from_config(&config.transport),
            recording_state: RecordingState { orchestrator },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // Root and version endpoints
            .route("/", get(status))
            .route("/version", get(version))
            .nest(
                "/rtc",
                routes::token::router(self.token_state.clone())
                    .merge(routes::recording::router(self.recording_state.clone())),
            )
            .layer(ServiceBuilder::new())
    }

    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", addr))?;

        info!("API server listening on http://{}", addr);
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        info!("Endpoints:");
        info!("  GET  /                       - Service info");
        info!("  GET  /version                - Get version info");
        info!("  POST /rtc/token              - Issue channel token");
        info!("  POST /rtc/recording/start    - Start cloud recording");
        info!("  POST /rtc/recording/stop     - Stop cloud recording");
        info!("  GET  /rtc/recording/query    - Query remote recording status");
        info!("  GET  /rtc/recording/active   - List active recordings");

        let app = self.router();
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "rtc-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "rtc-gateway"
    }))
}
