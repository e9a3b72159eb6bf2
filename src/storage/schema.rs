//! Database schema for the memebot.
//!
//! Creates tables for:
//! - servers: per-server whitelist, roles, counters and setting overrides
//! - words: learned original → mutated substitutions with their score
//! - stats: single-row global counters

use crate::error::{MemebotError, Result};
use rusqlite::Connection;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS servers (
    id TEXT PRIMARY KEY NOT NULL,
    whitelist TEXT NOT NULL DEFAULT '[]',
    roles TEXT NOT NULL DEFAULT '[]',
    mutation_count INTEGER NOT NULL DEFAULT 0,
    settings TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS words (
    original TEXT PRIMARY KEY NOT NULL,
    mutated TEXT NOT NULL,
    score INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_words_score ON words(score DESC);

CREATE TABLE IF NOT EXISTS stats (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    mutation_count INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO stats (id, mutation_count) VALUES (1, 0);
"#;

/// Initialize all tables
///
/// Safe to call multiple times (uses IF NOT EXISTS).
pub fn init_tables(conn: &Connection) -> Result<()> {
    // In-memory databases answer "memory" here, which is fine
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(|e| MemebotError::Database(format!("Failed to enable WAL: {}", e)))?;

    conn.execute_batch(SCHEMA)
        .map_err(|e| MemebotError::Database(format!("Failed to create tables: {}", e)))
}
