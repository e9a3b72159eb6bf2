//! Memebot - a chat bot that swaps syllables for a meme word
//!
//! Every so often the bot picks a message, replaces one syllable in a few of
//! its words with the configured meme (keeping capitalisation, plurality and
//! punctuation) and posts the result. The audience votes with 👍 / 👎 and
//! the bot remembers which substitutions landed.
//!
//! # Architecture
//!
//! - **Mutation**: eligibility filter, syllable engine, sentence mutator
//! - **Gate**: per-server cooldown plus whitelist, self-reply and chance checks
//! - **Storage**: SQLite-backed servers, learned words and global counters
//! - **Evaluation**: reaction feedback turned into word score deltas
//! - **Bot**: message routing, chat commands, gateway abstraction
//! - **API**: read-only HTTP stats
//!
//! # Example
//!
//! ```ignore
//! use memebot_core::{BotConfig, BotController, ConsoleGateway, SqliteStorage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> memebot_core::Result<()> {
//!     let config = Arc::new(BotConfig::load(None)?);
//!     let storage = SqliteStorage::open(&config.db_path, config.defaults.mutation_buffer).await?;
//!     let bot = BotController::new(config, Arc::new(storage), Arc::new(ConsoleGateway::new()))?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod gate;
pub mod mutation;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use api::{ApiServer, ApiServerConfig};
pub use bot::{BotController, ChatGateway, Command, ConsoleGateway, HandleOutcome};
pub use config::BotConfig;
pub use error::{MemebotError, Result};
pub use evaluation::{FeedbackCollector, FeedbackHandle, FeedbackOutcome};
pub use gate::{GateDecision, GateState, RateLimiter};
pub use mutation::{MutationOutcome, SentenceMutator, SyllableEngine};
pub use settings::{GlobalSettings, PartialSettings, SettingName};
pub use storage::{ScoreQueue, SqliteStorage, StorageBackend};
pub use types::{
    GlobalStats, InboundMessage, MessageRef, Reaction, ReactionTally, ServerState, TouchedWord,
    WordRecord,
};
