//! Storage layer for the memebot
//!
//! Provides abstractions and implementations for persistent storage of
//! server records, learned word scores and global stats.

pub mod schema;
pub mod score_queue;
pub mod sqlite;

use crate::error::Result;
use crate::settings::PartialSettings;
use crate::types::{GlobalStats, ServerState, WordRecord};
use async_trait::async_trait;

pub use score_queue::ScoreQueue;
pub use sqlite::SqliteStorage;

/// Storage backend trait defining all required operations
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch a word record, failing with `RecordNotFound` when absent
    async fn get_word(&self, original: &str) -> Result<WordRecord>;

    /// Fetch a word record, creating it with score 0 and `mutated_hint` if absent
    async fn get_or_create_word(&self, original: &str, mutated_hint: &str) -> Result<WordRecord>;

    /// Records for any of `tokens`, highest score first, ties by insertion order
    async fn lookup_words(&self, tokens: &[String]) -> Result<Vec<WordRecord>>;

    /// Atomically add `delta` to a word's score
    ///
    /// Creates the record first (mutated form = the word itself) if absent.
    async fn apply_score_delta(&self, original: &str, delta: i64) -> Result<WordRecord>;

    /// Highest-scored records overall
    async fn top_words(&self, limit: usize) -> Result<Vec<WordRecord>>;

    /// Fetch a server record, failing with `RecordNotFound` when absent
    async fn get_server(&self, id: &str) -> Result<ServerState>;

    /// Fetch a server record, creating a blank one if absent
    async fn get_or_create_server(&self, id: &str) -> Result<ServerState>;

    /// Add or remove a whitelisted channel; returns whether it is now whitelisted
    async fn toggle_whitelist(&self, server_id: &str, channel: &str) -> Result<bool>;

    /// Add or remove an access role; returns whether it is now granted
    async fn toggle_role(&self, server_id: &str, role_id: &str) -> Result<bool>;

    /// Replace a server's setting overrides
    async fn set_server_settings(&self, server_id: &str, settings: &PartialSettings)
        -> Result<()>;

    /// Count one successful mutation for the server and globally
    async fn record_mutation(&self, server_id: &str) -> Result<()>;

    /// Aggregate counts for the stats API
    async fn global_stats(&self) -> Result<GlobalStats>;
}
