//! Console chat loop
//!
//! Each stdin line is a message from the server owner in one channel. The
//! channel is whitelisted on first start so mutations can happen at all.
//! The stats API runs alongside until Ctrl-C or end of input.

use memebot_core::{
    error::Result, ApiServer, ApiServerConfig, BotConfig, BotController, ConsoleGateway,
    HandleOutcome, InboundMessage, StorageBackend,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::helpers::open_storage;

const CONSOLE_USER: &str = "console-user";

pub async fn handle(config: BotConfig, server: String, channel: String) -> Result<()> {
    let config = Arc::new(config);
    let storage: Arc<dyn StorageBackend> = Arc::new(open_storage(&config).await?);

    let state = storage.get_or_create_server(&server).await?;
    if !state.is_whitelisted(&channel) {
        storage.toggle_whitelist(&server, &channel).await?;
        info!("Whitelisted #{} on server {}", channel, server);
    }

    let gateway = Arc::new(ConsoleGateway::new());
    let bot = BotController::new(config.clone(), storage.clone(), gateway)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let api = ApiServer::new(ApiServerConfig::from_bot_config(&config)?, storage.clone());
    let api_task = tokio::spawn(api.serve(async move {
        let _ = shutdown_rx.await;
    }));

    println!(
        "Chatting as the owner of '{}' in #{}. Try `{} help`. Ctrl-D or Ctrl-C to quit.",
        server,
        channel,
        config.command_trigger()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(text) = line? else { break };
                if text.trim().is_empty() {
                    continue;
                }
                let message = InboundMessage {
                    author_id: CONSOLE_USER.to_string(),
                    author_is_bot: false,
                    author_roles: Vec::new(),
                    author_is_owner: true,
                    channel_name: channel.clone(),
                    text,
                    guild_id: server.clone(),
                };
                match bot.handle_message(&message).await {
                    HandleOutcome::Skipped(decision) => debug!("Skipped: {:?}", decision),
                    HandleOutcome::Mutated { outcome, .. } => {
                        debug!("Mutated {} word(s)", outcome.touched.len())
                    }
                    HandleOutcome::Command { command, .. } => debug!("Ran {:?}", command),
                    HandleOutcome::Failed => debug!("No mutation"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(());
    match api_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Stats API stopped with error: {}", e),
        Err(e) => warn!("Stats API task failed: {}", e),
    }

    info!("Goodbye");
    Ok(())
}
