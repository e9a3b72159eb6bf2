//! Message handling
//!
//! [`BotController`] receives every inbound message. Command messages go to
//! the [`CommandHandler`]; everything else runs through the gate, the
//! sentence mutator and, when adaptive learning is on, the feedback
//! collector.
//!
//! Nothing on the mutation path surfaces to chat users. Failures are logged
//! and the message is simply left alone.

pub mod commands;
pub mod console;
pub mod gateway;

pub use commands::{Command, CommandHandler};
pub use console::ConsoleGateway;
pub use gateway::ChatGateway;

use crate::config::BotConfig;
use crate::error::Result;
use crate::evaluation::{FeedbackCollector, FeedbackHandle};
use crate::gate::{self, GateDecision, RateLimiter};
use crate::mutation::{MutationOutcome, SentenceMutator, SyllableEngine};
use crate::storage::{ScoreQueue, StorageBackend};
use crate::types::{InboundMessage, MessageRef};
use std::sync::Arc;
use tracing::{debug, error, info};

/// What happened to one inbound message
#[derive(Debug)]
pub enum HandleOutcome {
    /// A command ran; `reply` is `None` if even the reply failed to send
    Command {
        command: Command,
        reply: Option<MessageRef>,
    },
    /// The gate turned the message away
    Skipped(GateDecision),
    /// A mutation was posted
    Mutated {
        message: MessageRef,
        outcome: MutationOutcome,
        feedback: Option<FeedbackHandle>,
    },
    /// The attempt failed or produced nothing; no state changed
    Failed,
}

pub struct BotController {
    config: Arc<BotConfig>,
    storage: Arc<dyn StorageBackend>,
    gateway: Arc<dyn ChatGateway>,
    engine: SyllableEngine,
    limiter: RateLimiter,
    commands: CommandHandler,
    feedback: FeedbackCollector,
    trigger: String,
}

impl BotController {
    /// Build a controller using the embedded English hyphenation patterns
    ///
    /// Must be called inside a tokio runtime: the score worker is spawned
    /// here.
    pub fn new(
        config: Arc<BotConfig>,
        storage: Arc<dyn StorageBackend>,
        gateway: Arc<dyn ChatGateway>,
    ) -> Result<Self> {
        let engine = SyllableEngine::english(&config.meme)?;
        Ok(Self::with_engine(config, storage, gateway, engine))
    }

    pub fn with_engine(
        config: Arc<BotConfig>,
        storage: Arc<dyn StorageBackend>,
        gateway: Arc<dyn ChatGateway>,
        engine: SyllableEngine,
    ) -> Self {
        let (scores, _worker) = ScoreQueue::spawn(storage.clone());
        let feedback = FeedbackCollector::new(gateway.clone(), scores, config.feedback_window());
        let commands = CommandHandler::new(storage.clone(), config.clone());
        let trigger = config.command_trigger();

        info!(
            "Bot ready: meme '{}', commands via '{}'",
            engine.meme(),
            trigger
        );

        Self {
            config,
            storage,
            gateway,
            engine,
            limiter: RateLimiter::new(),
            commands,
            feedback,
            trigger,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Handle one inbound message. Never fails.
    pub async fn handle_message(&self, message: &InboundMessage) -> HandleOutcome {
        if let Some(command) = Command::parse(&message.text, &self.trigger) {
            return self.handle_command(command, message).await;
        }

        match self.handle_mutation_chance(message).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_silent_skip() => {
                debug!("Nothing to mutate: {}", e);
                HandleOutcome::Failed
            }
            Err(e) => {
                debug!("Something went wrong handling mutation chance: {}", e);
                HandleOutcome::Failed
            }
        }
    }

    async fn handle_command(&self, command: Command, message: &InboundMessage) -> HandleOutcome {
        let text = match self.commands.execute(&command, message).await {
            Ok(text) => text,
            Err(e) => {
                info!("Command error occurred for {:?}: {}", command, e);
                self.commands.generic_failure()
            }
        };

        let reply = match self.gateway.send(&message.channel_name, &text).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                info!("Failed to send command reply: {}", e);
                None
            }
        };

        HandleOutcome::Command { command, reply }
    }

    async fn handle_mutation_chance(&self, message: &InboundMessage) -> Result<HandleOutcome> {
        // Every message counts toward the cooldown, even if storage is down
        let state = self.limiter.observe(&message.guild_id).await;

        let server = self.storage.get_or_create_server(&message.guild_id).await?;
        let settings = self.config.defaults.resolve(&server.settings);

        let decision = {
            let mut rng = rand::thread_rng();
            gate::decide(
                state,
                &server,
                message,
                self.gateway.bot_user_id(),
                &settings,
                &mut rng,
            )
        };
        if !decision.is_attempt() {
            debug!("Gate closed for server {}: {:?}", server.id, decision);
            return Ok(HandleOutcome::Skipped(decision));
        }

        let candidates: Vec<String> = message
            .text
            .split_whitespace()
            .filter(|word| self.engine.is_eligible(word))
            .map(str::to_string)
            .collect();
        let records = self.storage.lookup_words(&candidates).await?;

        let outcome = {
            let mut rng = rand::thread_rng();
            SentenceMutator::new(&self.engine, &settings).mutate(&message.text, &records, &mut rng)?
        };

        let sent = self
            .gateway
            .send(&message.channel_name, &outcome.result)
            .await?;
        debug!("Sent mutated message to #{}: {}", sent.channel_name, outcome.result);

        let feedback = if settings.adaptive_learning_enabled {
            Some(self.feedback.spawn(sent.clone(), outcome.touched.clone()))
        } else {
            None
        };

        self.limiter.reset(&server.id, settings.mutation_buffer).await;
        // The mutation is already posted, so a counter failure must not hide it
        if let Err(e) = self.storage.record_mutation(&server.id).await {
            error!("Failed to count mutation for server {}: {}", server.id, e);
        }

        Ok(HandleOutcome::Mutated {
            message: sent,
            outcome,
            feedback,
        })
    }
}
