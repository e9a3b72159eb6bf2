//! Layered mutation settings
//!
//! Global defaults come from [`crate::config::BotConfig`]; each server may
//! override a subset. Resolution never mutates the defaults, it produces a
//! new merged value per request.

use crate::error::{MemebotError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

/// Fully resolved settings for one mutation decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Probability in 0..=1 that an armed, eligible message is mutated
    pub chance_to_mutate: f64,
    /// Messages to wait after a mutation before the next roll
    pub mutation_buffer: u32,
    pub minimum_words_before_mutation: usize,
    /// One extra mutation attempt is possible per this many words
    pub words_to_possibly_mutate: usize,
    /// Stored words at or below this score are never reused
    pub negative_threshold: i64,
    pub adaptive_learning_enabled: bool,
    /// Lets the bot mutate other bots (including itself)
    pub allow_self_reply: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            chance_to_mutate: 0.05,
            mutation_buffer: 10,
            minimum_words_before_mutation: 3,
            words_to_possibly_mutate: 3,
            negative_threshold: -10,
            adaptive_learning_enabled: true,
            allow_self_reply: false,
        }
    }
}

impl GlobalSettings {
    /// Overlay per-server overrides on these defaults
    pub fn resolve(&self, overrides: &PartialSettings) -> GlobalSettings {
        GlobalSettings {
            chance_to_mutate: overrides.chance_to_mutate.unwrap_or(self.chance_to_mutate),
            mutation_buffer: overrides.mutation_buffer.unwrap_or(self.mutation_buffer),
            minimum_words_before_mutation: overrides
                .minimum_words_before_mutation
                .unwrap_or(self.minimum_words_before_mutation),
            words_to_possibly_mutate: overrides
                .words_to_possibly_mutate
                .unwrap_or(self.words_to_possibly_mutate),
            negative_threshold: overrides
                .negative_threshold
                .unwrap_or(self.negative_threshold),
            adaptive_learning_enabled: overrides
                .adaptive_learning_enabled
                .unwrap_or(self.adaptive_learning_enabled),
            allow_self_reply: self.allow_self_reply,
        }
    }

    /// Reject values the mutation engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.chance_to_mutate) {
            return Err(MemebotError::invalid_setting(
                "chance_to_mutate",
                "must be between 0 and 1",
            ));
        }
        if self.words_to_possibly_mutate == 0 {
            return Err(MemebotError::invalid_setting(
                "words_to_possibly_mutate",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Per-server overrides; `None` falls through to the global default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chance_to_mutate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_buffer: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_words_before_mutation: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words_to_possibly_mutate: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_threshold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adaptive_learning_enabled: Option<bool>,
}

/// Settings a server administrator may override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingName {
    ChanceToMutate,
    MutationBuffer,
    AdaptiveLearning,
}

impl FromStr for SettingName {
    type Err = MemebotError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "chancetomutate" | "chance" => Ok(SettingName::ChanceToMutate),
            "mutationbuffer" | "buffer" => Ok(SettingName::MutationBuffer),
            "adaptivelearning" | "adaptivelearningenabled" | "ai" => {
                Ok(SettingName::AdaptiveLearning)
            }
            _ => Err(MemebotError::invalid_setting(s, "unknown setting")),
        }
    }
}

impl std::fmt::Display for SettingName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingName::ChanceToMutate => write!(f, "chanceToMutate"),
            SettingName::MutationBuffer => write!(f, "mutationBuffer"),
            SettingName::AdaptiveLearning => write!(f, "adaptiveLearning"),
        }
    }
}

impl PartialSettings {
    /// Parse `raw` for `name` and store it as an override
    pub fn apply(&mut self, name: SettingName, raw: &str) -> Result<()> {
        let raw = raw.trim();
        match name {
            SettingName::ChanceToMutate => {
                let chance: f64 = raw.parse().map_err(|_| {
                    MemebotError::invalid_setting(name.to_string(), "not a number")
                })?;
                if !(0.0..=1.0).contains(&chance) {
                    return Err(MemebotError::invalid_setting(
                        name.to_string(),
                        "must be between 0 and 1",
                    ));
                }
                self.chance_to_mutate = Some(chance);
            }
            SettingName::MutationBuffer => {
                let buffer: u32 = raw.parse().map_err(|_| {
                    MemebotError::invalid_setting(name.to_string(), "not a non-negative integer")
                })?;
                self.mutation_buffer = Some(buffer);
            }
            SettingName::AdaptiveLearning => {
                let enabled = match raw.to_lowercase().as_str() {
                    "1" | "true" | "on" | "yes" => true,
                    "0" | "false" | "off" | "no" => false,
                    _ => {
                        return Err(MemebotError::invalid_setting(
                            name.to_string(),
                            "expected 0 or 1",
                        ))
                    }
                };
                self.adaptive_learning_enabled = Some(enabled);
            }
        }
        Ok(())
    }
}

/// Outcome of reading a stored settings blob
#[derive(Debug, Clone, PartialEq)]
pub struct MigratedSettings {
    pub settings: PartialSettings,
    /// True when the stored blob was rewritten and must be persisted back
    pub repaired: bool,
}

/// Decode stored settings field by field, repairing what older records left behind
///
/// Older records kept values as strings. A parsable string is coerced to the
/// field's type. A `mutation_buffer` that is not a valid count is reset to
/// `default_buffer`; any other malformed field is dropped so the server falls
/// back to the global default for it. A blob that is not an object decodes to
/// no overrides. Unknown keys are ignored.
pub fn migrate_settings(raw: Value, default_buffer: u32) -> MigratedSettings {
    let map = match raw {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            warn!("Stored settings {} are not an object, discarding them", other);
            return MigratedSettings {
                settings: PartialSettings::default(),
                repaired: true,
            };
        }
    };

    let mut repaired = false;

    let chance_to_mutate = decode_field(&map, "chance_to_mutate", &mut repaired, |v| {
        coerce_f64(v).filter(|(chance, _)| (0.0..=1.0).contains(chance))
    });
    let mutation_buffer = decode_field(&map, "mutation_buffer", &mut repaired, |v| {
        let (n, coerced) = coerce_u64(v)?;
        Some((u32::try_from(n).ok()?, coerced))
    })
    .or_else(|| has_value(&map, "mutation_buffer").then_some(default_buffer));
    let minimum_words_before_mutation =
        decode_field(&map, "minimum_words_before_mutation", &mut repaired, coerce_usize);
    let words_to_possibly_mutate =
        decode_field(&map, "words_to_possibly_mutate", &mut repaired, |v| {
            coerce_usize(v).filter(|(n, _)| *n > 0)
        });
    let negative_threshold = decode_field(&map, "negative_threshold", &mut repaired, coerce_i64);
    let adaptive_learning_enabled =
        decode_field(&map, "adaptive_learning_enabled", &mut repaired, coerce_bool);

    MigratedSettings {
        settings: PartialSettings {
            chance_to_mutate,
            mutation_buffer,
            minimum_words_before_mutation,
            words_to_possibly_mutate,
            negative_threshold,
            adaptive_learning_enabled,
        },
        repaired,
    }
}

fn has_value(map: &Map<String, Value>, key: &str) -> bool {
    !matches!(map.get(key), None | Some(Value::Null))
}

/// Decode one stored field; `coerce` returns the value and whether it had to be converted
fn decode_field<T>(
    map: &Map<String, Value>,
    key: &str,
    repaired: &mut bool,
    coerce: impl Fn(&Value) -> Option<(T, bool)>,
) -> Option<T> {
    let value = match map.get(key) {
        None | Some(Value::Null) => return None,
        Some(value) => value,
    };

    match coerce(value) {
        Some((decoded, coerced)) => {
            if coerced {
                debug!("Converting stored setting {}={}", key, value);
                *repaired = true;
            }
            Some(decoded)
        }
        None => {
            warn!("Stored setting {}={} is malformed, using the default", key, value);
            *repaired = true;
            None
        }
    }
}

fn coerce_u64(value: &Value) -> Option<(u64, bool)> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| (n, false)),
        Value::String(s) => s.trim().parse().ok().map(|n| (n, true)),
        _ => None,
    }
}

fn coerce_usize(value: &Value) -> Option<(usize, bool)> {
    let (n, coerced) = coerce_u64(value)?;
    Some((usize::try_from(n).ok()?, coerced))
}

fn coerce_i64(value: &Value) -> Option<(i64, bool)> {
    match value {
        Value::Number(n) => n.as_i64().map(|n| (n, false)),
        Value::String(s) => s.trim().parse().ok().map(|n| (n, true)),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<(f64, bool)> {
    match value {
        Value::Number(n) => n.as_f64().map(|n| (n, false)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(|n| (n, true)),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<(bool, bool)> {
    match value {
        Value::Bool(b) => Some((*b, false)),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some((false, true)),
            Some(1) => Some((true, true)),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Some((true, true)),
            "0" | "false" | "off" | "no" => Some((false, true)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_keeps_defaults_untouched() {
        let defaults = GlobalSettings::default();
        let overrides = PartialSettings {
            chance_to_mutate: Some(0.5),
            mutation_buffer: Some(2),
            ..Default::default()
        };

        let merged = defaults.resolve(&overrides);
        assert_eq!(merged.chance_to_mutate, 0.5);
        assert_eq!(merged.mutation_buffer, 2);
        assert_eq!(merged.negative_threshold, -10);
        assert_eq!(defaults, GlobalSettings::default());
    }

    #[test]
    fn test_zero_chance_override_is_respected() {
        let overrides = PartialSettings {
            chance_to_mutate: Some(0.0),
            ..Default::default()
        };
        let merged = GlobalSettings::default().resolve(&overrides);
        assert_eq!(merged.chance_to_mutate, 0.0);
    }

    #[test]
    fn test_setting_name_parsing() {
        assert_eq!(
            "chanceToMutate".parse::<SettingName>().unwrap(),
            SettingName::ChanceToMutate
        );
        assert_eq!(
            "mutation_buffer".parse::<SettingName>().unwrap(),
            SettingName::MutationBuffer
        );
        assert_eq!(
            "adaptiveLearningEnabled".parse::<SettingName>().unwrap(),
            SettingName::AdaptiveLearning
        );
        assert!(matches!(
            "volume".parse::<SettingName>(),
            Err(MemebotError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_apply_validates_values() {
        let mut settings = PartialSettings::default();

        settings.apply(SettingName::MutationBuffer, "4").unwrap();
        assert_eq!(settings.mutation_buffer, Some(4));

        let err = settings.apply(SettingName::MutationBuffer, "lots").unwrap_err();
        assert!(matches!(err, MemebotError::InvalidSetting { .. }));
        assert_eq!(settings.mutation_buffer, Some(4));

        assert!(settings.apply(SettingName::ChanceToMutate, "1.5").is_err());
        settings.apply(SettingName::ChanceToMutate, "0.25").unwrap();
        assert_eq!(settings.chance_to_mutate, Some(0.25));

        settings.apply(SettingName::AdaptiveLearning, "0").unwrap();
        assert_eq!(settings.adaptive_learning_enabled, Some(false));
        assert!(settings.apply(SettingName::AdaptiveLearning, "maybe").is_err());
    }

    #[test]
    fn test_migrate_numeric_string_buffer() {
        let migrated = migrate_settings(json!({ "mutation_buffer": "7" }), 10);
        assert!(migrated.repaired);
        assert_eq!(migrated.settings.mutation_buffer, Some(7));
    }

    #[test]
    fn test_migrate_garbage_buffer_resets_to_default() {
        let migrated = migrate_settings(
            json!({ "mutation_buffer": "soon", "chance_to_mutate": 0.2 }),
            10,
        );
        assert!(migrated.repaired);
        assert_eq!(migrated.settings.mutation_buffer, Some(10));
        assert_eq!(migrated.settings.chance_to_mutate, Some(0.2));
    }

    #[test]
    fn test_migrate_clean_record_is_untouched() {
        let migrated = migrate_settings(json!({ "mutation_buffer": 3 }), 10);
        assert!(!migrated.repaired);
        assert_eq!(migrated.settings.mutation_buffer, Some(3));

        let empty = migrate_settings(Value::Null, 10);
        assert!(!empty.repaired);
        assert_eq!(empty.settings, PartialSettings::default());
    }

    #[test]
    fn test_migrate_out_of_range_buffer_resets_to_default() {
        for stored in [json!(-1), json!(2.5), json!(u64::MAX), json!(true), json!("-3")] {
            let migrated = migrate_settings(json!({ "mutation_buffer": stored }), 10);
            assert!(migrated.repaired, "{} was not repaired", stored);
            assert_eq!(migrated.settings.mutation_buffer, Some(10));
        }
    }

    #[test]
    fn test_migrate_coerces_string_fields() {
        let migrated = migrate_settings(
            json!({
                "chance_to_mutate": "0.5",
                "adaptive_learning_enabled": "0",
                "negative_threshold": "-4",
            }),
            10,
        );
        assert!(migrated.repaired);
        assert_eq!(migrated.settings.chance_to_mutate, Some(0.5));
        assert_eq!(migrated.settings.adaptive_learning_enabled, Some(false));
        assert_eq!(migrated.settings.negative_threshold, Some(-4));
        assert_eq!(migrated.settings.mutation_buffer, None);
    }

    #[test]
    fn test_migrate_drops_malformed_fields_only() {
        let migrated = migrate_settings(
            json!({
                "chance_to_mutate": "often",
                "words_to_possibly_mutate": 0,
                "minimum_words_before_mutation": [3],
                "mutation_buffer": 4,
            }),
            10,
        );
        assert!(migrated.repaired);
        assert_eq!(
            migrated.settings,
            PartialSettings {
                mutation_buffer: Some(4),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_migrate_non_object_blob() {
        let migrated = migrate_settings(json!("chance=0.5"), 10);
        assert!(migrated.repaired);
        assert_eq!(migrated.settings, PartialSettings::default());
    }
}
