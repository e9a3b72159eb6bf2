//! Stats API server command

use memebot_core::{error::Result, ApiServer, ApiServerConfig, BotConfig, MemebotError};
use std::sync::Arc;
use tracing::info;

use super::helpers::{open_storage, shutdown_signal};

pub async fn handle(mut config: BotConfig, addr: Option<String>) -> Result<()> {
    if let Some(addr) = addr {
        config.api_addr = addr;
    }
    let api_config = ApiServerConfig::from_bot_config(&config)?;
    let storage = Arc::new(open_storage(&config).await?);

    println!();
    println!("📊 {}", api_config.name);
    println!("   Address: http://{}", api_config.addr);
    println!("   • GET /       - Mutation and server counts");
    println!("   • GET /health - Health check");
    println!();

    ApiServer::new(api_config, storage)
        .serve(shutdown_signal())
        .await
        .map_err(|e| MemebotError::Other(format!("API server failed: {}", e)))?;

    info!("Shut down cleanly");
    Ok(())
}
