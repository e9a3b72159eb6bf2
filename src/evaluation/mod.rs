//! Adaptive learning from audience reactions
//!
//! Every mutation the bot posts can be voted on. The
//! [`FeedbackCollector`] turns those votes into score deltas for the words
//! involved; stored scores then bias which substitutions get reused and
//! which words are never touched again.

pub mod feedback_collector;

pub use feedback_collector::{FeedbackCollector, FeedbackHandle, FeedbackOutcome};
