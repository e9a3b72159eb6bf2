//! SQLite storage backend implementation
//!
//! Uses rusqlite behind a deadpool connection pool. Every query runs inside
//! `interact`, so blocking SQLite calls never stall the async runtime.
//! Read-modify-write operations run in a single transaction.

use super::schema;
use crate::error::{MemebotError, Result};
use crate::settings::{migrate_settings, PartialSettings};
use crate::storage::StorageBackend;
use crate::types::{GlobalStats, ServerState, WordRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

fn db_err(context: &'static str) -> impl Fn(rusqlite::Error) -> MemebotError {
    move |e| MemebotError::Database(format!("{}: {}", context, e))
}

/// SQLite storage backend
pub struct SqliteStorage {
    pool: Pool,
    /// Global mutation buffer, used to repair legacy server settings
    default_buffer: u32,
}

impl SqliteStorage {
    /// Open (creating if missing) the database at `db_path`
    ///
    /// # Example
    /// ```ignore
    /// let storage = SqliteStorage::open("memebot.db", 10).await?;
    /// ```
    pub async fn open<P: AsRef<Path>>(db_path: P, default_buffer: u32) -> Result<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening SQLite database: {}", path.display());

        let pool = Config::new(path)
            .create_pool(Runtime::Tokio1)
            .map_err(|e| MemebotError::Database(format!("Failed to create connection pool: {}", e)))?;

        let storage = Self {
            pool,
            default_buffer,
        };
        storage.interact(|conn| schema::init_tables(conn)).await?;

        info!("SQLite storage ready");
        Ok(storage)
    }

    /// Run `f` on a pooled connection
    async fn interact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.pool.get().await.map_err(|e| {
            MemebotError::Database(format!("Failed to get connection from pool: {}", e))
        })?;

        conn.interact(move |conn| {
            conn.busy_timeout(BUSY_TIMEOUT)
                .map_err(db_err("Failed to set busy timeout"))?;
            f(conn)
        })
        .await
        .map_err(|e| MemebotError::Database(format!("Pool interaction failed: {}", e)))?
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn word_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WordRecord> {
    Ok(WordRecord {
        original: row.get(0)?,
        mutated: row.get(1)?,
        score: row.get(2)?,
    })
}

fn select_word(conn: &Connection, original: &str) -> Result<Option<WordRecord>> {
    conn.query_row(
        "SELECT original, mutated, score FROM words WHERE original = ?1",
        params![original],
        word_from_row,
    )
    .optional()
    .map_err(db_err("Failed to fetch word"))
}

fn insert_word_if_missing(conn: &Connection, original: &str, mutated: &str) -> Result<()> {
    let ts = now();
    conn.execute(
        "INSERT OR IGNORE INTO words (original, mutated, score, created_at, updated_at)
         VALUES (?1, ?2, 0, ?3, ?3)",
        params![original, mutated, ts],
    )
    .map_err(db_err("Failed to create word"))?;
    Ok(())
}

/// Raw columns of a server row, decoded outside the rusqlite closure
struct ServerRow {
    id: String,
    whitelist: String,
    roles: String,
    mutation_count: i64,
    settings: String,
    created_at: String,
}

fn select_server(conn: &Connection, id: &str) -> Result<Option<ServerRow>> {
    conn.query_row(
        "SELECT id, whitelist, roles, mutation_count, settings, created_at
         FROM servers WHERE id = ?1",
        params![id],
        |row| {
            Ok(ServerRow {
                id: row.get(0)?,
                whitelist: row.get(1)?,
                roles: row.get(2)?,
                mutation_count: row.get(3)?,
                settings: row.get(4)?,
                created_at: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(db_err("Failed to fetch server"))
}

fn insert_server_if_missing(conn: &Connection, id: &str) -> Result<()> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO servers (id, created_at) VALUES (?1, ?2)",
            params![id, now()],
        )
        .map_err(db_err("Failed to create server"))?;
    if inserted > 0 {
        info!("Registered new server {}", id);
    }
    Ok(())
}

fn write_settings(conn: &Connection, id: &str, settings: &PartialSettings) -> Result<()> {
    let json = serde_json::to_string(settings)?;
    let updated = conn
        .execute(
            "UPDATE servers SET settings = ?1 WHERE id = ?2",
            params![json, id],
        )
        .map_err(db_err("Failed to update settings"))?;
    if updated == 0 {
        return Err(MemebotError::RecordNotFound(format!("server {}", id)));
    }
    Ok(())
}

/// Decode a server row, migrating legacy settings and persisting the repair
fn load_server(conn: &Connection, id: &str, default_buffer: u32) -> Result<Option<ServerState>> {
    let Some(row) = select_server(conn, id)? else {
        return Ok(None);
    };

    let whitelist: BTreeSet<String> = serde_json::from_str(&row.whitelist)?;
    let roles: BTreeSet<String> = serde_json::from_str(&row.roles)?;
    let raw_settings = serde_json::from_str(&row.settings).unwrap_or_else(|e| {
        warn!("Unreadable settings for server {}: {}", row.id, e);
        serde_json::Value::String(row.settings.clone())
    });

    let migrated = migrate_settings(raw_settings, default_buffer);
    if migrated.repaired {
        info!("Repaired legacy settings for server {}", row.id);
        write_settings(conn, &row.id, &migrated.settings)?;
    }

    let created_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Bad created_at '{}' for server {}: {}", row.created_at, row.id, e);
            Utc::now()
        });

    Ok(Some(ServerState {
        id: row.id,
        whitelist,
        roles,
        mutation_count: row.mutation_count,
        settings: migrated.settings,
        created_at,
    }))
}

/// Flip membership of `value` in the JSON set stored in `column`
fn toggle_set_column(
    conn: &mut Connection,
    server_id: &str,
    column: &'static str,
    value: &str,
) -> Result<bool> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(db_err("Failed to begin transaction"))?;
    insert_server_if_missing(&tx, server_id)?;

    let raw: String = tx
        .query_row(
            &format!("SELECT {} FROM servers WHERE id = ?1", column),
            params![server_id],
            |row| row.get(0),
        )
        .map_err(db_err("Failed to read server set"))?;
    let mut set: BTreeSet<String> = serde_json::from_str(&raw)?;

    let present = if set.remove(value) {
        false
    } else {
        set.insert(value.to_string());
        true
    };

    tx.execute(
        &format!("UPDATE servers SET {} = ?1 WHERE id = ?2", column),
        params![serde_json::to_string(&set)?, server_id],
    )
    .map_err(db_err("Failed to write server set"))?;
    tx.commit().map_err(db_err("Failed to commit"))?;

    Ok(present)
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn get_word(&self, original: &str) -> Result<WordRecord> {
        let original = original.to_string();
        self.interact(move |conn| {
            select_word(conn, &original)?
                .ok_or_else(|| MemebotError::RecordNotFound(format!("word {}", original)))
        })
        .await
    }

    async fn get_or_create_word(&self, original: &str, mutated_hint: &str) -> Result<WordRecord> {
        let original = original.to_string();
        let mutated_hint = mutated_hint.to_string();
        self.interact(move |conn| {
            insert_word_if_missing(conn, &original, &mutated_hint)?;
            select_word(conn, &original)?
                .ok_or_else(|| MemebotError::RecordNotFound(format!("word {}", original)))
        })
        .await
    }

    async fn lookup_words(&self, tokens: &[String]) -> Result<Vec<WordRecord>> {
        let unique: Vec<String> = tokens
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        self.interact(move |conn| {
            let placeholders = vec!["?"; unique.len()].join(", ");
            let sql = format!(
                "SELECT original, mutated, score FROM words
                 WHERE original IN ({})
                 ORDER BY score DESC, rowid ASC",
                placeholders
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(db_err("Failed to prepare word lookup"))?;
            let rows = stmt
                .query_map(params_from_iter(unique.iter()), word_from_row)
                .map_err(db_err("Failed to look up words"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err("Failed to read word row"))
        })
        .await
    }

    async fn apply_score_delta(&self, original: &str, delta: i64) -> Result<WordRecord> {
        let original = original.to_string();
        debug!("Applying score delta {} to '{}'", delta, original);

        self.interact(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(db_err("Failed to begin transaction"))?;
            insert_word_if_missing(&tx, &original, &original)?;
            tx.execute(
                "UPDATE words SET score = score + ?1, updated_at = ?2 WHERE original = ?3",
                params![delta, now(), original],
            )
            .map_err(db_err("Failed to update score"))?;
            let record = select_word(&tx, &original)?
                .ok_or_else(|| MemebotError::RecordNotFound(format!("word {}", original)))?;
            tx.commit().map_err(db_err("Failed to commit"))?;
            Ok(record)
        })
        .await
    }

    async fn top_words(&self, limit: usize) -> Result<Vec<WordRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.interact(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT original, mutated, score FROM words
                     ORDER BY score DESC, rowid ASC LIMIT ?1",
                )
                .map_err(db_err("Failed to prepare top words"))?;
            let rows = stmt
                .query_map(params![limit], word_from_row)
                .map_err(db_err("Failed to list words"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err("Failed to read word row"))
        })
        .await
    }

    async fn get_server(&self, id: &str) -> Result<ServerState> {
        let id = id.to_string();
        let default_buffer = self.default_buffer;
        self.interact(move |conn| {
            load_server(conn, &id, default_buffer)?
                .ok_or_else(|| MemebotError::RecordNotFound(format!("server {}", id)))
        })
        .await
    }

    async fn get_or_create_server(&self, id: &str) -> Result<ServerState> {
        let id = id.to_string();
        let default_buffer = self.default_buffer;
        self.interact(move |conn| {
            insert_server_if_missing(conn, &id)?;
            load_server(conn, &id, default_buffer)?
                .ok_or_else(|| MemebotError::RecordNotFound(format!("server {}", id)))
        })
        .await
    }

    async fn toggle_whitelist(&self, server_id: &str, channel: &str) -> Result<bool> {
        let server_id = server_id.to_string();
        let channel = channel.to_string();
        let present = self
            .interact(move |conn| toggle_set_column(conn, &server_id, "whitelist", &channel))
            .await?;
        debug!("Whitelist toggled, now present: {}", present);
        Ok(present)
    }

    async fn toggle_role(&self, server_id: &str, role_id: &str) -> Result<bool> {
        let server_id = server_id.to_string();
        let role_id = role_id.to_string();
        self.interact(move |conn| toggle_set_column(conn, &server_id, "roles", &role_id))
            .await
    }

    async fn set_server_settings(
        &self,
        server_id: &str,
        settings: &PartialSettings,
    ) -> Result<()> {
        let server_id = server_id.to_string();
        let settings = settings.clone();
        self.interact(move |conn| {
            insert_server_if_missing(conn, &server_id)?;
            write_settings(conn, &server_id, &settings)
        })
        .await
    }

    async fn record_mutation(&self, server_id: &str) -> Result<()> {
        let server_id = server_id.to_string();
        self.interact(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(db_err("Failed to begin transaction"))?;
            insert_server_if_missing(&tx, &server_id)?;
            tx.execute(
                "UPDATE servers SET mutation_count = mutation_count + 1 WHERE id = ?1",
                params![server_id],
            )
            .map_err(db_err("Failed to count server mutation"))?;
            tx.execute(
                "UPDATE stats SET mutation_count = mutation_count + 1 WHERE id = 1",
                [],
            )
            .map_err(db_err("Failed to count global mutation"))?;
            tx.commit().map_err(db_err("Failed to commit"))
        })
        .await
    }

    async fn global_stats(&self) -> Result<GlobalStats> {
        self.interact(|conn| {
            let mutation_count: i64 = conn
                .query_row("SELECT mutation_count FROM stats WHERE id = 1", [], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(db_err("Failed to read stats"))?
                .unwrap_or(0);
            let total_servers: i64 = conn
                .query_row("SELECT COUNT(*) FROM servers", [], |row| row.get(0))
                .map_err(db_err("Failed to count servers"))?;
            Ok(GlobalStats {
                mutation_count,
                total_servers,
            })
        })
        .await
    }
}
