//! Decides whether a token may be mutated at all

use super::inflect;
use super::stopwords::is_stop_word;
use tracing::debug;
use url::Url;

/// Whether `token` parses as an absolute URI (has a scheme)
pub fn is_uri(token: &str) -> bool {
    !token.is_empty() && Url::parse(token).is_ok()
}

/// Rejects stop-words, URIs and anything already containing the meme
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    meme: String,
    meme_singular: String,
}

impl EligibilityFilter {
    pub fn new(meme: &str) -> Self {
        let meme = meme.to_lowercase();
        let meme_singular = inflect::singular(&meme);
        Self {
            meme,
            meme_singular,
        }
    }

    pub fn meme(&self) -> &str {
        &self.meme
    }

    /// Check a stripped token against all ineligibility rules
    pub fn is_eligible(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        if self.contains_meme(token) {
            debug!("Skipping '{}', it contains the configured meme", token);
            return false;
        }

        if is_stop_word(token) {
            return false;
        }

        !is_uri(token)
    }

    fn contains_meme(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        if lower.contains(&self.meme) {
            return true;
        }

        let singular = inflect::singular(&lower);
        singular.contains(&self.meme)
            || (!self.meme_singular.is_empty() && singular.contains(&self.meme_singular))
    }
}
