use anyhow::Result;
use clap::Parser;
use rtc_gateway::{
    app,
    cli::{
        handle_catalog_command, handle_recording_command, handle_rooms_command, handle_token_command, Cli,
        CliCommand,
    },
    config::Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let command = match cli.command {
        Some(CliCommand::Version) => {
            println!("rtc-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(command) => command,
        None => CliCommand::Serve,
    };

    let config = Config::load()?;

    match command {
        CliCommand::Token(args) => handle_token_command(args, &config),
        CliCommand::Rooms(args) => handle_rooms_command(args, &config),
        CliCommand::Catalog(args) => handle_catalog_command(args, &config),
        CliCommand::Recording(args) => handle_recording_command(args, &config).await,
        CliCommand::Serve | CliCommand::Version => app::run_service(config).await,
    }
}
