use crate::api::ApiServer;
use crate::config::Config;
use crate::db::{init_db, SqliteMediaCatalog, SqliteMeetingLookup};
use crate::recording::{ActiveRecordings, RecordingOrchestrator};
use crate::transport::TransportClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run_service(config: Config) -> Result<()> {
    info!("Starting rtc-gateway service");

    if config.transport.app_id.is_empty() {
        warn!("No app id configured; token and recording requests will fail");
    }
    if config.transport.app_certificate.is_empty() {
        warn!("No app certificate configured; token requests will fail");
    }

    let orchestrator = Arc::new(build_orchestrator(&config)?);

    let api_server = ApiServer::new(&config, orchestrator);

    info!("rtc-gateway is ready!");
    info!(
        "Test manually: curl -X POST http://{}:{}/rtc/token -H 'Content-Type: application/json' -d '{{\"channelName\":\"test\",\"uid\":1}}'",
        config.server.host, config.server.port
    );

    api_server.start().await
}

/// Wire the transport client, SQLite collaborators and in-memory active table.
pub fn build_orchestrator(config: &Config) -> Result<RecordingOrchestrator> {
    let db_path = config.database.resolve_path()?;
    // Create the schema up front so the first request doesn't pay for it
    init_db(&db_path).with_context(|| format!("Failed to initialize database at {}", db_path.display()))?;
    info!("Using database at {}", db_path.display());

    let client = TransportClient::new(&config.transport, &config.storage)?;

    Ok(RecordingOrchestrator::new(
        Arc::new(client),
        Arc::new(SqliteMeetingLookup::new(db_path.clone())),
        Arc::new(SqliteMediaCatalog::new(db_path)),
        Arc::new(ActiveRecordings::new()),
    ))
}
