//! Property tests for word eligibility and mutation

mod common;

use common::whole_word_engine;
use memebot_core::mutation::{EligibilityFilter, WordParts};
use memebot_core::{GlobalSettings, MemebotError, SentenceMutator, SyllableEngine};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn punctuation() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!['"', '\'', '(', ')', '!', '?', '.', ',', '*', '~', '¿']),
        0..4,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn casing(word: &str, style: u8) -> String {
    match style % 3 {
        0 => word.to_string(),
        1 => word.to_uppercase(),
        _ => {
            let mut chars = word.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect())
                .unwrap_or_default()
        }
    }
}

proptest! {
    #[test]
    fn punctuation_is_reattached(
        leading in punctuation(),
        core in "[a-zA-Z]{1,12}",
        trailing in punctuation(),
        seed in any::<u64>(),
    ) {
        let engine = whole_word_engine("foo");
        let word = format!("{}{}{}", leading, core, trailing);
        let mutated = engine.mutate_word(&word, &mut StdRng::seed_from_u64(seed));

        prop_assert!(mutated.starts_with(&leading));
        prop_assert!(mutated.ends_with(&trailing));
        let parts = WordParts::split(&mutated);
        prop_assert_eq!(parts.leading, leading.as_str());
        prop_assert_eq!(parts.trailing, trailing.as_str());
    }

    #[test]
    fn hyphenated_mutation_keeps_punctuation(
        leading in punctuation(),
        core in "[a-z]{3,14}",
        trailing in punctuation(),
        seed in any::<u64>(),
    ) {
        let engine = SyllableEngine::english("butt").unwrap();
        let word = format!("{}{}{}", leading, core, trailing);
        let mutated = engine.mutate_word(&word, &mut StdRng::seed_from_u64(seed));

        prop_assert!(mutated.starts_with(&leading));
        prop_assert!(mutated.ends_with(&trailing));
    }

    #[test]
    fn meme_variants_are_never_eligible(
        meme in "[a-z]{3,8}",
        style in any::<u8>(),
        plural in any::<bool>(),
        prefix in "[a-z]{0,3}",
    ) {
        let filter = EligibilityFilter::new(&meme);
        let base = if plural { format!("{}s", meme) } else { meme.clone() };
        let token = casing(&format!("{}{}", prefix, base), style);
        prop_assert!(!filter.is_eligible(&token));
    }

    #[test]
    fn short_messages_are_rejected(words in prop::collection::vec("[a-z]{2,8}", 0..3)) {
        let engine = whole_word_engine("foo");
        let settings = GlobalSettings {
            minimum_words_before_mutation: 3,
            ..Default::default()
        };
        let text = words.join(" ");
        let result = SentenceMutator::new(&engine, &settings)
            .mutate(&text, &[], &mut StdRng::seed_from_u64(0));
        let is_insufficient = matches!(result, Err(MemebotError::InsufficientInput { .. }));
        prop_assert!(is_insufficient);
    }

    #[test]
    fn successful_mutations_differ(
        words in prop::collection::vec("[a-z]{2,10}", 3..12),
        seed in any::<u64>(),
    ) {
        let engine = whole_word_engine("foo");
        let settings = GlobalSettings::default();
        let text = words.join(" ");
        match SentenceMutator::new(&engine, &settings)
            .mutate(&text, &[], &mut StdRng::seed_from_u64(seed))
        {
            Ok(outcome) => {
                prop_assert_ne!(outcome.result, text);
                prop_assert!(!outcome.touched.is_empty());
            }
            Err(e) => prop_assert!(matches!(e, MemebotError::NoChange)),
        }
    }
}

#[test]
fn plural_words_get_plural_meme() {
    let engine = whole_word_engine("foo");
    let mut rng = StdRng::seed_from_u64(9);
    assert_eq!(engine.mutate_word("memes", &mut rng), "foos");
    assert_eq!(engine.mutate_word("Cats!", &mut rng), "Foos!");
    assert_eq!(engine.mutate_word("children", &mut rng), "foos");
    assert_eq!(engine.mutate_word("People", &mut rng), "Foos");

    let engine = whole_word_engine("person");
    assert_eq!(engine.mutate_word("dogs", &mut rng), "people");
}
