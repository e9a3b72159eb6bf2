//! Sentence-level mutation
//!
//! Picks how many words to mutate and which ones. The best-scored stored
//! substitutions are tried first (by position in the score-sorted list);
//! remaining attempts fall back to random syllable substitution.

use super::eligibility::is_uri;
use super::syllable::SyllableEngine;
use crate::error::{MemebotError, Result};
use crate::settings::GlobalSettings;
use crate::types::{TouchedWord, WordRecord};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// Result of one successful mutation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Text to send, URIs wrapped to suppress link previews
    pub result: String,
    /// Every word changed, for feedback attribution
    pub touched: Vec<TouchedWord>,
}

/// Mutates whole messages using a [`SyllableEngine`]
pub struct SentenceMutator<'a> {
    engine: &'a SyllableEngine,
    settings: &'a GlobalSettings,
}

impl<'a> SentenceMutator<'a> {
    pub fn new(engine: &'a SyllableEngine, settings: &'a GlobalSettings) -> Self {
        Self { engine, settings }
    }

    /// Number of mutation attempts for a message of `word_count` words
    pub fn attempt_count<R: Rng + ?Sized>(&self, word_count: usize, rng: &mut R) -> usize {
        let density = self.settings.words_to_possibly_mutate.max(1);
        let slots = word_count / density;
        (rng.gen::<f64>() * slots as f64).floor() as usize + 1
    }

    /// Mutate `message`
    ///
    /// `records` must be sorted by descending score, as returned by
    /// [`crate::storage::StorageBackend::lookup_words`].
    ///
    /// # Errors
    ///
    /// - `InsufficientInput` when the message has fewer words than the minimum
    /// - `NoChange` when no word ended up different
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        message: &str,
        records: &[WordRecord],
        rng: &mut R,
    ) -> Result<MutationOutcome> {
        let mut tokens: Vec<String> = message.split_whitespace().map(str::to_string).collect();
        let minimum = self.settings.minimum_words_before_mutation;

        if tokens.len() < minimum {
            return Err(MemebotError::InsufficientInput {
                words: tokens.len(),
                minimum,
            });
        }
        if tokens.is_empty() {
            return Err(MemebotError::NoChange);
        }

        let original = tokens.join(" ");
        let threshold = self.settings.negative_threshold;

        // Words the audience voted down are never mutated again
        let blocked: HashSet<&str> = records
            .iter()
            .filter(|r| r.score <= threshold)
            .map(|r| r.original.as_str())
            .collect();

        let mut handled: HashSet<usize> = HashSet::new();
        let mut touched = Vec::new();
        let attempts = self.attempt_count(tokens.len(), rng);

        for attempt in 0..attempts {
            debug!("Mutation attempt #{}", attempt + 1);

            let candidate = records.get(attempt).filter(|record| {
                if record.score <= threshold {
                    debug!("Stored word '{}' below negative threshold", record.original);
                    return false;
                }
                if record.original == self.engine.meme() {
                    debug!("Stored word '{}' is the meme itself", record.original);
                    return false;
                }
                record.score > 0
            });

            if let Some(record) = candidate {
                let locations: Vec<usize> = tokens
                    .iter()
                    .enumerate()
                    .filter(|(i, token)| !handled.contains(i) && **token == record.original)
                    .map(|(i, _)| i)
                    .collect();

                if let Some(&index) = locations.choose(rng) {
                    debug!(
                        "Reusing stored word '{}' (score {}) at position {}",
                        record.original, record.score, index
                    );
                    tokens[index] = record.mutated.clone();
                    handled.insert(index);
                    touched.push(TouchedWord {
                        word: record.original.clone(),
                        mutated: record.mutated.clone(),
                    });
                    continue;
                }
                debug!("Stored word '{}' not in message, falling back", record.original);
            }

            let open: Vec<usize> = (0..tokens.len())
                .filter(|i| !handled.contains(i) && !blocked.contains(tokens[*i].as_str()))
                .collect();
            let Some(&index) = open.choose(rng) else {
                debug!("No positions left to mutate");
                break;
            };

            let word = tokens[index].clone();
            let mutated = self.engine.mutate_word(&word, rng);
            if mutated != word {
                tokens[index] = mutated.clone();
                handled.insert(index);
                touched.push(TouchedWord { word, mutated });
            }
        }

        let result = tokens.join(" ");
        if result == original {
            return Err(MemebotError::NoChange);
        }

        Ok(MutationOutcome {
            result: escape_links(&result),
            touched,
        })
    }
}

/// Wrap URI segments in angle brackets so chat clients skip link previews
pub fn escape_links(text: &str) -> String {
    text.split(' ')
        .map(|part| {
            if is_uri(part) {
                format!("<{}>", part)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
