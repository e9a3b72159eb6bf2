//! Database initialization command

use memebot_core::{config::DEFAULT_CONFIG_FILE, error::Result, BotConfig};
use std::path::Path;
use tracing::debug;

use super::helpers::open_storage;

/// Handle database initialization command
///
/// With `write_config`, also writes the effective settings to
/// `memebot.toml` unless that file already exists.
pub async fn handle(config: BotConfig, write_config: bool) -> Result<()> {
    debug!("Initializing database...");

    // Opening creates the file, parent directories and tables
    let _storage = open_storage(&config).await?;
    println!("✓ Database initialized: {}", config.db_path.display());

    if write_config {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            println!("  {} already exists, left untouched", DEFAULT_CONFIG_FILE);
        } else {
            std::fs::write(path, config.to_toml()?)?;
            println!("✓ Config written: {}", DEFAULT_CONFIG_FILE);
        }
    }
    Ok(())
}
