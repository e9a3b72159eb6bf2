//! Serialized score updates
//!
//! Feedback collectors finish at arbitrary times. Every score change goes
//! through one worker task so updates for the same word never interleave,
//! on top of the storage layer's own transactional increment.

use crate::error::{MemebotError, Result};
use crate::storage::StorageBackend;
use crate::types::{TouchedWord, WordRecord};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct ScoreUpdate {
    word: TouchedWord,
    delta: i64,
    reply: oneshot::Sender<Result<WordRecord>>,
}

/// Handle to the score update worker
///
/// Cheap to clone. The worker stops once every handle is dropped.
#[derive(Clone)]
pub struct ScoreQueue {
    tx: mpsc::UnboundedSender<ScoreUpdate>,
}

impl ScoreQueue {
    /// Spawn the worker on the current runtime
    pub fn spawn(storage: Arc<dyn StorageBackend>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(storage, rx));
        (Self { tx }, handle)
    }

    /// Queue `delta` for `word` and wait until it is stored
    ///
    /// Missing records are created with the mutation the audience saw.
    pub async fn apply(&self, word: &TouchedWord, delta: i64) -> Result<WordRecord> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ScoreUpdate {
                word: word.clone(),
                delta,
                reply,
            })
            .map_err(|_| MemebotError::Other("Score queue is closed".to_string()))?;

        rx.await
            .map_err(|_| MemebotError::Other("Score worker dropped the update".to_string()))?
    }
}

async fn run_worker(
    storage: Arc<dyn StorageBackend>,
    mut rx: mpsc::UnboundedReceiver<ScoreUpdate>,
) {
    debug!("Score worker started");

    while let Some(update) = rx.recv().await {
        let result = apply_one(storage.as_ref(), &update.word, update.delta).await;
        if let Err(e) = &result {
            warn!("Score update for '{}' failed: {}", update.word.word, e);
        }
        // Caller may have given up waiting; the update is stored regardless
        let _ = update.reply.send(result);
    }

    debug!("Score worker stopped");
}

async fn apply_one(
    storage: &dyn StorageBackend,
    word: &TouchedWord,
    delta: i64,
) -> Result<WordRecord> {
    storage.get_or_create_word(&word.word, &word.mutated).await?;
    let record = storage.apply_score_delta(&word.word, delta).await?;
    debug!(
        "Score for '{}' is now {} ({:+})",
        record.original, record.score, delta
    );
    Ok(record)
}
