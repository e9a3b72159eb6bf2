//! Memebot - syllable-swapping chat bot
//!
//! Main entry point. Runs the console chat loop, the stats API, or one-off
//! maintenance commands against the word store.

mod cli;

use clap::{Parser, Subcommand};
use memebot_core::error::Result;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "memebot")]
#[command(about = "Chat bot that swaps syllables for a meme word and learns from reactions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Database path (overrides config file and MEMEBOT_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Config file (defaults to ./memebot.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the bot on stdin, with the stats API alongside
    Run {
        /// Server id the console messages belong to
        #[arg(long, default_value = "console")]
        server: String,

        /// Channel name the console messages are posted in
        #[arg(long, default_value = "general")]
        channel: String,
    },

    /// Start the HTTP stats API only
    ServeApi {
        /// Listen address (overrides config)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Mutate a sentence once without touching counters or scores
    Mutate {
        /// Text to mutate
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List the highest-scored learned words
    Words {
        /// Maximum number of words to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Create the database and its tables
    Init {
        /// Also write the effective settings to ./memebot.toml
        #[arg(long)]
        write_config: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG wins; otherwise our crates at the chosen level, HTTP internals quiet
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!(
            "memebot={level},memebot_core={level},tower_http=warn",
            level = level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Memebot v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli::helpers::load_config(cli.config.as_deref(), cli.db_path)?;

    match cli.command {
        Commands::Run { server, channel } => cli::run::handle(config, server, channel).await,
        Commands::ServeApi { addr } => cli::serve_api::handle(config, addr).await,
        Commands::Mutate { text } => cli::mutate::handle(config, text).await,
        Commands::Words { limit } => cli::words::handle(config, limit).await,
        Commands::Init { write_config } => cli::init::handle(config, write_config).await,
    }
}
