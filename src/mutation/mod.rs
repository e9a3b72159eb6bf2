//! Word and sentence mutation
//!
//! # Architecture
//!
//! - **EligibilityFilter**: rejects stop-words, URIs and meme-containing tokens
//! - **SyllableEngine**: mutates one word, syllable-aware, keeping case and plurality
//! - **SentenceMutator**: chooses which words in a message to mutate, reusing
//!   well-received stored substitutions first
//!
//! # Usage
//!
//! ```rust,no_run
//! use memebot_core::mutation::{SentenceMutator, SyllableEngine};
//! use memebot_core::settings::GlobalSettings;
//!
//! # fn example() -> memebot_core::Result<()> {
//! let engine = SyllableEngine::english("butt")?;
//! let settings = GlobalSettings::default();
//! let outcome = SentenceMutator::new(&engine, &settings)
//!     .mutate("the quick brown fox jumps", &[], &mut rand::thread_rng())?;
//! println!("{}", outcome.result);
//! # Ok(())
//! # }
//! ```

pub mod eligibility;
pub mod inflect;
pub mod sentence;
pub mod stopwords;
pub mod syllable;

pub use eligibility::{is_uri, EligibilityFilter};
pub use sentence::{escape_links, MutationOutcome, SentenceMutator};
pub use syllable::{EnglishHyphenator, SyllableEngine, SyllableSplitter, WordParts};
