use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rtc-gateway")]
#[command(about = "Channel tokens and cloud recording for real-time media", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the HTTP service (default)
    Serve,
    /// Print version information
    Version,
    /// Issue or inspect channel tokens
    Token(TokenCliArgs),
    /// Manage meeting room bindings
    Rooms(RoomsCliArgs),
    /// Browse the media catalog
    Catalog(CatalogCliArgs),
    /// Talk to the remote recorder directly
    Recording(RecordingCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct TokenCliArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Generate a token using the configured app id and certificate
    Generate {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        uid: String,
        /// publisher (default) or subscriber
        #[arg(long)]
        role: Option<String>,
        /// Privilege lifetime in seconds (default: from config)
        #[arg(long)]
        validity: Option<u32>,
    },
    /// Decode a token and print its contents
    Inspect {
        token: String,
        /// Check the signature against the configured certificate (needs --channel and --uid)
        #[arg(long)]
        verify: bool,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        uid: Option<String>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RoomsCliArgs {
    #[command(subcommand)]
    pub command: RoomsCommand,
}

#[derive(Subcommand, Debug)]
pub enum RoomsCommand {
    /// Bind a room id to a channel and entity (replaces an existing binding)
    Add {
        room_id: String,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        entity: i64,
        /// Human-readable entity label, used as the storage folder name
        #[arg(long)]
        label: Option<String>,
    },
    /// List all room bindings
    List,
    /// Remove a room binding
    Remove { room_id: String },
}

#[derive(ClapArgs, Debug)]
pub struct CatalogCliArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List cataloged recordings, newest first
    List {
        /// Only show recordings for this entity
        #[arg(long)]
        entity: Option<i64>,
        /// Maximum number of results to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RecordingCliArgs {
    #[command(subcommand)]
    pub command: RecordingCommand,
}

#[derive(Subcommand, Debug)]
pub enum RecordingCommand {
    /// Print the remote recorder's status document
    Query {
        #[arg(long)]
        resource_id: String,
        #[arg(long)]
        sid: String,
    },
}
