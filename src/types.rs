//! Core data types for the memebot
//!
//! Word records (the learned original → mutated association), server
//! records, inbound chat messages, and the fixed reaction set used for
//! feedback.

use crate::settings::PartialSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Learned substitution for a single word
///
/// Identity is the original token exactly as first seen (case-sensitive,
/// punctuation included). The mutated form is fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub original: String,
    pub mutated: String,
    /// Net reaction score, unbounded in both directions
    pub score: i64,
}

impl WordRecord {
    /// Fresh record with no feedback yet
    pub fn new(original: impl Into<String>, mutated: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            mutated: mutated.into(),
            score: 0,
        }
    }
}

/// A word the orchestrator changed in one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchedWord {
    pub word: String,
    pub mutated: String,
}

/// Persisted per-server record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerState {
    pub id: String,
    /// Channel names where mutation is allowed
    #[serde(default)]
    pub whitelist: BTreeSet<String>,
    /// Role ids granted access to administrative commands
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub mutation_count: i64,
    /// Overrides on top of the global defaults
    #[serde(default)]
    pub settings: PartialSettings,
    pub created_at: DateTime<Utc>,
}

impl ServerState {
    /// Blank record for a server seen for the first time
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            whitelist: BTreeSet::new(),
            roles: BTreeSet::new(),
            mutation_count: 0,
            settings: PartialSettings::default(),
            created_at: Utc::now(),
        }
    }

    pub fn is_whitelisted(&self, channel: &str) -> bool {
        self.whitelist.contains(channel)
    }
}

/// Process-wide aggregate counts exposed by the stats API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub mutation_count: i64,
    pub total_servers: i64,
}

/// Message delivered by the chat gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub author_id: String,
    pub author_is_bot: bool,
    /// Role ids the author holds on this server
    #[serde(default)]
    pub author_roles: Vec<String>,
    /// Whether the author owns the server
    #[serde(default)]
    pub author_is_owner: bool,
    pub channel_name: String,
    pub text: String,
    pub guild_id: String,
}

/// Handle to a message the bot sent, used for reactions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_name: String,
    pub message_id: String,
}

/// The fixed emoji set the bot reacts with and listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Approve,
    Disapprove,
    Locked,
    Celebrate,
    Sob,
}

impl Reaction {
    pub fn emoji(&self) -> &'static str {
        match self {
            Reaction::Approve => "👍",
            Reaction::Disapprove => "👎",
            Reaction::Locked => "🔒",
            Reaction::Celebrate => "🎉",
            Reaction::Sob => "😭",
        }
    }

    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            "👍" => Some(Reaction::Approve),
            "👎" => Some(Reaction::Disapprove),
            "🔒" => Some(Reaction::Locked),
            "🎉" => Some(Reaction::Celebrate),
            "😭" => Some(Reaction::Sob),
            _ => None,
        }
    }
}

impl std::fmt::Display for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.emoji())
    }
}

/// Raw reaction counts for a message at the end of a feedback window
///
/// Counts include the bot's own seed reactions, as chat platforms report
/// them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTally {
    pub approvals: u32,
    pub disapprovals: u32,
}

impl ReactionTally {
    /// Net vote with the bot's two seed reactions removed
    pub fn net_score(&self) -> i64 {
        let up = i64::from(self.approvals.saturating_sub(1));
        let down = i64::from(self.disapprovals.saturating_sub(1));
        up - down
    }

    /// Whether approvals won (ties count as approval)
    pub fn approved(&self) -> bool {
        self.approvals >= self.disapprovals
    }
}
