use anyhow::Result;

use super::args::{RecordingCliArgs, RecordingCommand};
use crate::config::Config;
use crate::transport::TransportClient;

pub async fn handle_recording_command(args: RecordingCliArgs, config: &Config) -> Result<()> {
    match args.command {
        RecordingCommand::Query { resource_id, sid } => {
            let client = TransportClient::new(&config.transport, &config.storage)?;
            let status = client.query(&resource_id, &sid).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
