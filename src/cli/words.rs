//! Learned word listing

use memebot_core::{error::Result, BotConfig, StorageBackend};

use super::helpers::open_storage;

pub async fn handle(config: BotConfig, limit: usize) -> Result<()> {
    let storage = open_storage(&config).await?;
    let words = storage.top_words(limit).await?;

    if words.is_empty() {
        println!("No learned words yet.");
        return Ok(());
    }

    let width = words
        .iter()
        .map(|w| w.original.chars().count())
        .max()
        .unwrap_or(0);

    println!("{:>6}  {:<width$}  mutated", "score", "original", width = width);
    for word in &words {
        println!(
            "{:>6}  {:<width$}  {}",
            word.score,
            word.original,
            word.mutated,
            width = width
        );
    }
    Ok(())
}
