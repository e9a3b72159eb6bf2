//! English plural detection and inflection
//!
//! Thin layer over `Inflector` that works on lower-case forms and restores
//! the caller's capitalisation afterwards. Irregular nouns are resolved from
//! a fixed table first, since `Inflector` only knows the regular suffix rules.

use inflector::string::pluralize::to_plural;
use inflector::string::singularize::to_singular;

/// `(singular, plural, matches as a compound suffix)`
///
/// Short forms like `man` or `mouse` only match whole words so that `omen`
/// and `pumice` keep their regular handling.
const IRREGULARS: &[(&str, &str, bool)] = &[
    ("child", "children", true),
    ("person", "people", true),
    ("woman", "women", true),
    ("goose", "geese", true),
    ("tooth", "teeth", true),
    ("man", "men", false),
    ("mouse", "mice", false),
    ("louse", "lice", false),
    ("foot", "feet", false),
    ("ox", "oxen", false),
];

/// Rewrite `word` through the table, mapping the `from` column to the `to` column
fn swap_irregular(word: &str, to_plural: bool) -> Option<String> {
    IRREGULARS.iter().find_map(|&(singular, plural, compound)| {
        let (from, to) = if to_plural {
            (singular, plural)
        } else {
            (plural, singular)
        };
        if word == from || (compound && word.ends_with(from)) {
            Some(format!("{}{}", &word[..word.len() - from.len()], to))
        } else {
            None
        }
    })
}

/// Whether `word` already is one side of an irregular pair
fn is_irregular_form(word: &str, plural: bool) -> bool {
    IRREGULARS.iter().any(|&(singular, irregular_plural, compound)| {
        let form = if plural { irregular_plural } else { singular };
        word == form || (compound && word.ends_with(form))
    })
}

/// Singular form of `word`, lower-cased
pub fn singular(word: &str) -> String {
    let lower = word.to_lowercase();
    if is_irregular_form(&lower, false) {
        return lower;
    }
    swap_irregular(&lower, false).unwrap_or_else(|| to_singular(&lower))
}

/// Whether `word` reads as an English plural
///
/// A word is plural when singularising it changes it; uncountable nouns
/// (`sheep`, `fish`) therefore count as singular.
pub fn is_plural(word: &str) -> bool {
    let lower = word.to_lowercase();
    if lower.is_empty() {
        return false;
    }
    singular(&lower) != lower
}

/// Plural of `word`, keeping all-caps or leading-capital styling
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    let plural = if is_irregular_form(&lower, true) {
        lower
    } else {
        swap_irregular(&lower, true).unwrap_or_else(|| to_plural(&lower))
    };

    if is_all_caps(word) {
        plural.to_uppercase()
    } else if word.starts_with(|c: char| c.is_uppercase()) {
        capitalize_first(&plural)
    } else {
        plural
    }
}

/// True when the word has letters and none of them are lower-case
pub fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && word == word.to_uppercase()
}

pub fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
