//! One-shot mutation against the learned word store
//!
//! Uses the global defaults, ignores the gate, and never writes: no
//! counters, no scores, no new word records.

use memebot_core::{
    error::Result, BotConfig, MemebotError, SentenceMutator, StorageBackend, SyllableEngine,
};
use tracing::debug;

use super::helpers::open_storage;

pub async fn handle(config: BotConfig, text: Vec<String>) -> Result<()> {
    let text = text.join(" ");
    let storage = open_storage(&config).await?;
    let engine = SyllableEngine::english(&config.meme)?;

    let candidates: Vec<String> = text
        .split_whitespace()
        .filter(|word| engine.is_eligible(word))
        .map(str::to_string)
        .collect();
    let records = storage.lookup_words(&candidates).await?;
    debug!("{} stored record(s) match", records.len());

    let result = {
        let mut rng = rand::thread_rng();
        SentenceMutator::new(&engine, &config.defaults).mutate(&text, &records, &mut rng)
    };

    match result {
        Ok(outcome) => {
            println!("{}", outcome.result);
            for word in &outcome.touched {
                debug!("{} -> {}", word.word, word.mutated);
            }
            Ok(())
        }
        Err(e @ MemebotError::InsufficientInput { .. }) | Err(e @ MemebotError::NoChange) => {
            println!("(no mutation: {})", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
