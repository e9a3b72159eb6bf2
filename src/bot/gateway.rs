//! Chat platform boundary
//!
//! The bot only talks to the outside world through [`ChatGateway`]: sending
//! text, adding reactions and collecting reactions over a window.

use crate::error::Result;
use crate::types::{MessageRef, Reaction, ReactionTally};
use async_trait::async_trait;
use std::time::Duration;

/// Outbound half of a chat platform connection
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// User id the bot posts as
    fn bot_user_id(&self) -> &str;

    /// Post `text` to `channel`
    async fn send(&self, channel: &str, text: &str) -> Result<MessageRef>;

    /// Add a reaction authored by the bot
    async fn react(&self, message: &MessageRef, reaction: Reaction) -> Result<()>;

    /// Wait for `window` to elapse, then report 👍 / 👎 counts on `message`
    ///
    /// Counts include the bot's own reactions.
    async fn collect_reactions(
        &self,
        message: &MessageRef,
        window: Duration,
    ) -> Result<ReactionTally>;
}
