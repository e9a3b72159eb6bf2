//! Reaction feedback for mutated messages.
//!
//! After the bot posts a mutation it seeds 👍 and 👎, waits for the feedback
//! window, and turns the audience's net vote into a score delta for every
//! word it changed. Each collection runs as its own task and reports once
//! through a oneshot channel.
//!
//! Failures are logged and never propagate. A reaction that fails to post
//! does not stop score updates that were already decided.

use crate::bot::ChatGateway;
use crate::error::{MemebotError, Result};
use crate::storage::ScoreQueue;
use crate::types::{MessageRef, Reaction, ReactionTally, TouchedWord, WordRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Final result of one feedback window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackOutcome {
    /// Raw counts, seed reactions included
    pub tally: ReactionTally,
    pub net_score: i64,
    /// Records as stored after the delta, empty when the vote was a wash
    pub applied_words: Vec<WordRecord>,
}

/// Spawns feedback tasks for mutated messages
#[derive(Clone)]
pub struct FeedbackCollector {
    gateway: Arc<dyn ChatGateway>,
    scores: ScoreQueue,
    window: Duration,
}

impl FeedbackCollector {
    pub fn new(gateway: Arc<dyn ChatGateway>, scores: ScoreQueue, window: Duration) -> Self {
        Self {
            gateway,
            scores,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Start collecting reactions on `message` for the `touched` words
    pub fn spawn(&self, message: MessageRef, touched: Vec<TouchedWord>) -> FeedbackHandle {
        let (tx, rx) = oneshot::channel();
        let collector = self.clone();

        let task = tokio::spawn(async move {
            let outcome = collector.collect(&message, &touched).await;
            // Nobody may be listening; the scores are stored either way
            let _ = tx.send(outcome);
        });

        FeedbackHandle { rx, task }
    }

    async fn collect(&self, message: &MessageRef, touched: &[TouchedWord]) -> FeedbackOutcome {
        debug!(
            "Collecting feedback on {} for {} word(s)",
            message.message_id,
            touched.len()
        );

        self.react(message, Reaction::Approve).await;
        self.react(message, Reaction::Disapprove).await;

        let tally = match self.gateway.collect_reactions(message, self.window).await {
            Ok(tally) => tally,
            Err(e) => {
                error!("Failed to collect reactions on {}: {}", message.message_id, e);
                return FeedbackOutcome::default();
            }
        };

        let net_score = tally.net_score();
        if net_score == 0 {
            debug!("Net score 0, no changes recorded for {:?}", touched);
            return FeedbackOutcome {
                tally,
                net_score,
                applied_words: Vec::new(),
            };
        }

        let mut applied_words = Vec::with_capacity(touched.len());
        for word in touched {
            match self.scores.apply(word, net_score).await {
                Ok(record) => applied_words.push(record),
                Err(e) => error!("Failed to record score for '{}': {}", word.word, e),
            }
        }

        self.react(message, Reaction::Locked).await;
        let verdict = if tally.approved() {
            Reaction::Celebrate
        } else {
            Reaction::Sob
        };
        self.react(message, verdict).await;

        info!(
            "Recorded score {:+} for {} word(s) on {}",
            net_score,
            applied_words.len(),
            message.message_id
        );

        FeedbackOutcome {
            tally,
            net_score,
            applied_words,
        }
    }

    async fn react(&self, message: &MessageRef, reaction: Reaction) {
        if let Err(e) = self.gateway.react(message, reaction).await {
            warn!("Failed to add {} to {}: {}", reaction, message.message_id, e);
        }
    }
}

/// Handle to a running feedback task
#[derive(Debug)]
pub struct FeedbackHandle {
    rx: oneshot::Receiver<FeedbackOutcome>,
    task: JoinHandle<()>,
}

impl FeedbackHandle {
    /// Wait for the window to close and the scores to be stored
    pub async fn outcome(self) -> Result<FeedbackOutcome> {
        self.rx
            .await
            .map_err(|_| MemebotError::Other("Feedback task ended without a result".to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
