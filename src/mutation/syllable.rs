//! Syllable-aware single word mutation
//!
//! A word is split into leading punctuation, an alphabetic core and trailing
//! punctuation. One syllable of the core (or the whole core when it cannot
//! be split) is replaced by the meme, keeping the core's capitalisation and
//! plurality. Punctuation is reattached untouched.

use super::eligibility::EligibilityFilter;
use super::inflect;
use crate::error::{MemebotError, Result};
use hyphenation::{Hyphenator, Language, Load, Standard};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::sync::Arc;

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^A-Za-z]*)(.*?)([^A-Za-z]*)$").expect("punctuation pattern is valid")
});

/// Splits a word into ordered syllable fragments
///
/// Concatenating the fragments must give back the input.
pub trait SyllableSplitter: Send + Sync {
    fn split(&self, word: &str) -> Vec<String>;
}

/// US English hyphenation patterns embedded at build time
pub struct EnglishHyphenator {
    dictionary: Standard,
}

impl EnglishHyphenator {
    pub fn new() -> Result<Self> {
        let dictionary = Standard::from_embedded(Language::EnglishUS)
            .map_err(|e| MemebotError::Hyphenation(e.to_string()))?;
        Ok(Self { dictionary })
    }
}

impl SyllableSplitter for EnglishHyphenator {
    fn split(&self, word: &str) -> Vec<String> {
        // Patterns are lower-case; breaks only map back when byte lengths agree
        let lower = word.to_lowercase();
        if lower.len() != word.len() {
            return vec![word.to_string()];
        }

        let hyphenated = self.dictionary.hyphenate(&lower);
        let mut fragments = Vec::with_capacity(hyphenated.breaks.len() + 1);
        let mut start = 0;
        for &brk in &hyphenated.breaks {
            if brk > start && brk < word.len() && word.is_char_boundary(brk) {
                fragments.push(word[start..brk].to_string());
                start = brk;
            }
        }
        fragments.push(word[start..].to_string());
        fragments
    }
}

/// A word broken into punctuation and alphabetic payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordParts<'a> {
    pub leading: &'a str,
    pub core: &'a str,
    pub trailing: &'a str,
}

impl<'a> WordParts<'a> {
    pub fn split(word: &'a str) -> Self {
        match PUNCTUATION.captures(word) {
            Some(caps) => {
                let part = |i: usize| caps.get(i).map_or("", |m| m.as_str());
                Self {
                    leading: part(1),
                    core: part(2),
                    trailing: part(3),
                }
            }
            None => Self {
                leading: "",
                core: word,
                trailing: "",
            },
        }
    }
}

/// Mutates single words
pub struct SyllableEngine {
    meme: String,
    filter: EligibilityFilter,
    splitter: Arc<dyn SyllableSplitter>,
}

impl SyllableEngine {
    pub fn new(meme: &str, splitter: Arc<dyn SyllableSplitter>) -> Self {
        Self {
            meme: meme.to_string(),
            filter: EligibilityFilter::new(meme),
            splitter,
        }
    }

    /// Engine backed by the embedded US English dictionary
    pub fn english(meme: &str) -> Result<Self> {
        Ok(Self::new(meme, Arc::new(EnglishHyphenator::new()?)))
    }

    pub fn meme(&self) -> &str {
        &self.meme
    }

    pub fn filter(&self) -> &EligibilityFilter {
        &self.filter
    }

    /// Whether the stripped core of `word` may be mutated
    pub fn is_eligible(&self, word: &str) -> bool {
        self.filter.is_eligible(WordParts::split(word).core)
    }

    /// Replace one syllable of `word` with the meme
    ///
    /// Returns `word` unchanged when its core is ineligible.
    pub fn mutate_word<R: Rng + ?Sized>(&self, word: &str, rng: &mut R) -> String {
        let parts = WordParts::split(word);
        let core = parts.core;

        if !self.filter.is_eligible(core) {
            return word.to_string();
        }

        let mut meme = if inflect::is_all_caps(core) {
            self.meme.to_uppercase()
        } else {
            self.meme.clone()
        };
        let capitalized = core.starts_with(|c: char| c.is_ascii_uppercase());

        let mut fragments = self.splitter.split(core);
        let mutated = if fragments.len() > 1 {
            let index = rng.gen_range(0..fragments.len());
            if index == 0 && capitalized {
                meme = inflect::capitalize_first(&meme);
            }
            fragments[index] = meme;
            fragments.concat()
        } else {
            if capitalized {
                meme = inflect::capitalize_first(&meme);
            }
            meme
        };

        let mutated = if inflect::is_plural(core) {
            inflect::pluralize(&mutated)
        } else {
            mutated
        };

        format!("{}{}{}", parts.leading, mutated, parts.trailing)
    }
}
