//! Shared helper functions for CLI commands

use memebot_core::{error::Result, BotConfig, SqliteStorage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load layered config, letting `--db-path` win over every other source
pub fn load_config(config_path: Option<&Path>, db_path: Option<PathBuf>) -> Result<BotConfig> {
    let mut config = BotConfig::load(config_path)?;
    if let Some(db_path) = db_path {
        config.db_path = db_path;
    }
    debug!("Database path: {}", config.db_path.display());
    Ok(config)
}

pub async fn open_storage(config: &BotConfig) -> Result<SqliteStorage> {
    SqliteStorage::open(&config.db_path, config.defaults.mutation_buffer).await
}

/// Wait for Ctrl-C; a failed signal handler resolves immediately
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
    }
}
