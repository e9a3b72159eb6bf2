//! Terminal-backed chat gateway
//!
//! Lets the bot run without a chat platform: every stdin line is a message
//! in one fixed server and channel, replies go to stdout. Reactions are only
//! tracked locally, so the audience never votes.

use super::gateway::ChatGateway;
use crate::error::{MemebotError, Result};
use crate::types::{MessageRef, Reaction, ReactionTally};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const CONSOLE_BOT_ID: &str = "memebot";

pub struct ConsoleGateway {
    stdout: Mutex<Stdout>,
    reactions: Mutex<HashMap<String, ReactionTally>>,
}

impl ConsoleGateway {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
            reactions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for ConsoleGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatGateway for ConsoleGateway {
    fn bot_user_id(&self) -> &str {
        CONSOLE_BOT_ID
    }

    async fn send(&self, channel: &str, text: &str) -> Result<MessageRef> {
        let line = format!("[#{}] {}: {}\n", channel, CONSOLE_BOT_ID, text);
        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| MemebotError::Gateway(format!("Failed to write message: {}", e)))?;
        stdout
            .flush()
            .await
            .map_err(|e| MemebotError::Gateway(format!("Failed to flush stdout: {}", e)))?;

        Ok(MessageRef {
            channel_name: channel.to_string(),
            message_id: Uuid::new_v4().to_string(),
        })
    }

    async fn react(&self, message: &MessageRef, reaction: Reaction) -> Result<()> {
        debug!("Reacting {} on {}", reaction, message.message_id);
        let mut reactions = self.reactions.lock().await;
        let tally = reactions.entry(message.message_id.clone()).or_default();
        match reaction {
            Reaction::Approve => tally.approvals += 1,
            Reaction::Disapprove => tally.disapprovals += 1,
            _ => {}
        }
        Ok(())
    }

    async fn collect_reactions(
        &self,
        message: &MessageRef,
        window: Duration,
    ) -> Result<ReactionTally> {
        tokio::time::sleep(window).await;
        Ok(self
            .reactions
            .lock()
            .await
            .remove(&message.message_id)
            .unwrap_or_default())
    }
}
