//! Configuration loading for the memebot
//!
//! Layers, lowest priority first:
//! 1. Built-in defaults
//! 2. TOML file (`memebot.toml` in the working directory, or `--config`)
//! 3. Environment variables prefixed with `MEMEBOT_`
//!    (nested keys use `__`, e.g. `MEMEBOT_DEFAULTS__CHANCE_TO_MUTATE=0.1`)

use crate::error::{MemebotError, Result};
use crate::settings::GlobalSettings;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "memebot.toml";

const ENV_PREFIX: &str = "MEMEBOT";

/// Get the default database path using XDG_DATA_HOME standard
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memebot")
        .join("memebot.db")
}

/// Top-level bot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Token injected into mutated words
    pub meme: String,
    /// Character that starts a command, followed by the meme (`?butt help`)
    pub command_prefix: String,
    pub db_path: PathBuf,
    /// Listen address of the stats API
    pub api_addr: String,
    /// Length of the reaction window after a mutation
    pub feedback_window_secs: u64,
    /// Global mutation defaults, overridable per server
    pub defaults: GlobalSettings,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            meme: "butt".to_string(),
            command_prefix: "?".to_string(),
            db_path: default_db_path(),
            api_addr: "127.0.0.1:3000".to_string(),
            feedback_window_secs: 600,
            defaults: GlobalSettings::default(),
        }
    }
}

impl BotConfig {
    /// Load from an optional file path plus the environment
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: BotConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!("Loaded configuration: meme={}, db={}", config.meme, config.db_path.display());
        Ok(config)
    }

    /// Load from a TOML string (no environment layer)
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: BotConfig = Config::builder()
            .add_source(File::from_str(toml_str, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.meme.trim().is_empty() {
            return Err(MemebotError::invalid_setting("meme", "must not be empty"));
        }
        if self.meme.chars().any(char::is_whitespace) {
            return Err(MemebotError::invalid_setting(
                "meme",
                "must be a single word",
            ));
        }
        if self.feedback_window_secs == 0 {
            return Err(MemebotError::invalid_setting(
                "feedback_window_secs",
                "must be at least 1 second",
            ));
        }
        self.api_socket_addr()?;
        self.defaults.validate()
    }

    pub fn api_socket_addr(&self) -> Result<SocketAddr> {
        self.api_addr.parse().map_err(|e| {
            MemebotError::invalid_setting("api_addr", format!("'{}': {}", self.api_addr, e))
        })
    }

    pub fn feedback_window(&self) -> Duration {
        Duration::from_secs(self.feedback_window_secs)
    }

    /// Full command trigger, e.g. `?butt`
    pub fn command_trigger(&self) -> String {
        format!("{}{}", self.command_prefix, self.meme)
    }

    /// Render as a TOML document loadable by [`BotConfig::load`]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MemebotError::Other(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.command_trigger(), "?butt");
        assert_eq!(config.feedback_window(), Duration::from_secs(600));
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = BotConfig::from_toml(
            r#"
            meme = "foo"
            feedback_window_secs = 30

            [defaults]
            chance_to_mutate = 0.5
            mutation_buffer = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.meme, "foo");
        assert_eq!(config.feedback_window_secs, 30);
        assert_eq!(config.defaults.chance_to_mutate, 0.5);
        assert_eq!(config.defaults.mutation_buffer, 2);
        // Untouched keys keep their defaults
        assert_eq!(config.defaults.minimum_words_before_mutation, 3);
        assert_eq!(config.api_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_rendered_template_loads_back() {
        let config = BotConfig {
            meme: "foo".to_string(),
            ..Default::default()
        };
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[defaults]"));
        assert_eq!(BotConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(BotConfig::from_toml("meme = \"two words\"").is_err());
        assert!(BotConfig::from_toml("[defaults]\nchance_to_mutate = 2.0").is_err());
        assert!(BotConfig::from_toml("[defaults]\nwords_to_possibly_mutate = 0").is_err());
        assert!(BotConfig::from_toml("api_addr = \"nowhere\"").is_err());
    }
}
