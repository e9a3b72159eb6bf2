//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use memebot_core::{
    mutation::SyllableSplitter, BotConfig, BotController, ChatGateway, GlobalSettings,
    GlobalStats, InboundMessage, MemebotError, MessageRef, PartialSettings, Reaction,
    ReactionTally, Result, ServerState, SqliteStorage, StorageBackend, SyllableEngine, WordRecord,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;

/// Temporary on-disk storage; the directory lives as long as this value
pub struct TestStorage {
    pub dir: TempDir,
    pub storage: Arc<SqliteStorage>,
}

impl TestStorage {
    pub fn backend(&self) -> Arc<dyn StorageBackend> {
        self.storage.clone()
    }
}

/// Create a fresh SQLite storage in a temp directory
pub async fn create_test_storage() -> TestStorage {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let storage = SqliteStorage::open(dir.path().join("memebot_test.db"), 10)
        .await
        .expect("Failed to create test storage");
    TestStorage {
        dir,
        storage: Arc::new(storage),
    }
}

/// Storage that delegates to SQLite but can be told to fail server lookups or counters
pub struct FlakyStorage {
    inner: Arc<SqliteStorage>,
    pub fail_servers: AtomicBool,
    pub fail_counts: AtomicBool,
}

impl FlakyStorage {
    pub fn new(inner: Arc<SqliteStorage>) -> Self {
        Self {
            inner,
            fail_servers: AtomicBool::new(false),
            fail_counts: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(MemebotError::Database("database is locked".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FlakyStorage {
    async fn get_word(&self, original: &str) -> Result<WordRecord> {
        self.inner.get_word(original).await
    }

    async fn get_or_create_word(&self, original: &str, mutated_hint: &str) -> Result<WordRecord> {
        self.inner.get_or_create_word(original, mutated_hint).await
    }

    async fn lookup_words(&self, tokens: &[String]) -> Result<Vec<WordRecord>> {
        self.inner.lookup_words(tokens).await
    }

    async fn apply_score_delta(&self, original: &str, delta: i64) -> Result<WordRecord> {
        self.inner.apply_score_delta(original, delta).await
    }

    async fn top_words(&self, limit: usize) -> Result<Vec<WordRecord>> {
        self.inner.top_words(limit).await
    }

    async fn get_server(&self, id: &str) -> Result<ServerState> {
        Self::check(&self.fail_servers)?;
        self.inner.get_server(id).await
    }

    async fn get_or_create_server(&self, id: &str) -> Result<ServerState> {
        Self::check(&self.fail_servers)?;
        self.inner.get_or_create_server(id).await
    }

    async fn toggle_whitelist(&self, server_id: &str, channel: &str) -> Result<bool> {
        self.inner.toggle_whitelist(server_id, channel).await
    }

    async fn toggle_role(&self, server_id: &str, role_id: &str) -> Result<bool> {
        self.inner.toggle_role(server_id, role_id).await
    }

    async fn set_server_settings(
        &self,
        server_id: &str,
        settings: &PartialSettings,
    ) -> Result<()> {
        self.inner.set_server_settings(server_id, settings).await
    }

    async fn record_mutation(&self, server_id: &str) -> Result<()> {
        Self::check(&self.fail_counts)?;
        self.inner.record_mutation(server_id).await
    }

    async fn global_stats(&self) -> Result<GlobalStats> {
        self.inner.global_stats().await
    }
}

/// Treats every word as a single syllable, so mutations are predictable
pub struct WholeWord;

impl SyllableSplitter for WholeWord {
    fn split(&self, word: &str) -> Vec<String> {
        vec![word.to_string()]
    }
}

pub fn whole_word_engine(meme: &str) -> SyllableEngine {
    SyllableEngine::new(meme, Arc::new(WholeWord))
}

/// Config that mutates every armed, whitelisted message
pub fn eager_config(meme: &str, buffer: u32) -> BotConfig {
    BotConfig {
        meme: meme.to_string(),
        defaults: GlobalSettings {
            chance_to_mutate: 1.0,
            mutation_buffer: buffer,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn message(guild: &str, channel: &str, text: &str) -> InboundMessage {
    InboundMessage {
        author_id: "user-1".to_string(),
        author_is_bot: false,
        author_roles: Vec::new(),
        author_is_owner: false,
        channel_name: channel.to_string(),
        text: text.to_string(),
        guild_id: guild.to_string(),
    }
}

pub fn owner_message(guild: &str, channel: &str, text: &str) -> InboundMessage {
    InboundMessage {
        author_is_owner: true,
        ..message(guild, channel, text)
    }
}

pub const FAKE_BOT_ID: &str = "bot-1";

/// In-memory gateway that records everything and reports a fixed tally
#[derive(Default)]
pub struct FakeGateway {
    pub sent: Mutex<Vec<(String, String)>>,
    pub reactions: Mutex<Vec<(String, Reaction)>>,
    /// Reactions from other users, added on top of the bot's own
    pub audience: Mutex<ReactionTally>,
    pub fail_reactions: bool,
    next_id: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_audience(approvals: u32, disapprovals: u32) -> Self {
        Self {
            audience: Mutex::new(ReactionTally {
                approvals,
                disapprovals,
            }),
            ..Self::default()
        }
    }

    pub fn failing_reactions(approvals: u32, disapprovals: u32) -> Self {
        Self {
            fail_reactions: true,
            ..Self::with_audience(approvals, disapprovals)
        }
    }

    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|(_, t)| t.clone()).collect()
    }

    pub async fn reactions_on(&self, message_id: &str) -> Vec<Reaction> {
        self.reactions
            .lock()
            .await
            .iter()
            .filter(|(id, _)| id == message_id)
            .map(|(_, r)| *r)
            .collect()
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    fn bot_user_id(&self) -> &str {
        FAKE_BOT_ID
    }

    async fn send(&self, channel: &str, text: &str) -> Result<MessageRef> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .await
            .push((channel.to_string(), text.to_string()));
        Ok(MessageRef {
            channel_name: channel.to_string(),
            message_id: format!("msg-{}", id),
        })
    }

    async fn react(&self, message: &MessageRef, reaction: Reaction) -> Result<()> {
        if self.fail_reactions {
            return Err(MemebotError::Gateway("reactions disabled".to_string()));
        }
        self.reactions
            .lock()
            .await
            .push((message.message_id.clone(), reaction));
        Ok(())
    }

    async fn collect_reactions(
        &self,
        message: &MessageRef,
        _window: Duration,
    ) -> Result<ReactionTally> {
        let own = self.reactions_on(&message.message_id).await;
        let audience = *self.audience.lock().await;
        Ok(ReactionTally {
            approvals: audience.approvals
                + own.iter().filter(|r| **r == Reaction::Approve).count() as u32,
            disapprovals: audience.disapprovals
                + own.iter().filter(|r| **r == Reaction::Disapprove).count() as u32,
        })
    }
}

/// Controller over a fake gateway with the predictable whole-word engine
pub fn controller(
    config: BotConfig,
    storage: Arc<dyn StorageBackend>,
    gateway: Arc<FakeGateway>,
) -> BotController {
    let engine = whole_word_engine(&config.meme);
    BotController::with_engine(Arc::new(config), storage, gateway, engine)
}
