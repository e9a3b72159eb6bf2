//! Chat commands
//!
//! Messages starting with the command trigger (`?butt` by default) are
//! commands instead of mutation candidates. Informational commands are open
//! to everyone; `whitelist`, `access` and `setting` need the server owner or
//! one of the server's access roles.

use crate::config::BotConfig;
use crate::error::{MemebotError, Result};
use crate::settings::SettingName;
use crate::storage::StorageBackend;
use crate::types::{InboundMessage, ServerState};
use std::sync::Arc;
use tracing::{debug, info};

/// A parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    About,
    Help,
    FirstRule,
    Stats,
    /// Toggle a channel; `None` means the channel the command came from
    Whitelist { channel: Option<String> },
    Access { role: Option<String> },
    Setting {
        name: Option<String>,
        value: Option<String>,
    },
    Unknown(String),
}

impl Command {
    /// Parse `text` if it starts with `trigger`
    pub fn parse(text: &str, trigger: &str) -> Option<Command> {
        let rest = text.trim().strip_prefix(trigger)?;
        let mut args = rest.split_whitespace();
        let arg = |s: Option<&str>| s.map(str::to_string);

        let command = match args.next() {
            Some("about") => Command::About,
            Some("help") => Command::Help,
            Some("firstrule") => Command::FirstRule,
            Some("stats") => Command::Stats,
            Some("whitelist") => Command::Whitelist {
                channel: args.next().map(|c| c.trim_start_matches('#').to_string()),
            },
            Some("access") => Command::Access {
                role: args.next().map(|r| r.trim_start_matches('@').to_string()),
            },
            Some("setting") => Command::Setting {
                name: arg(args.next()),
                value: arg(args.next()),
            },
            Some(other) => Command::Unknown(other.to_string()),
            None => Command::Unknown(String::new()),
        };
        Some(command)
    }

    pub fn requires_access(&self) -> bool {
        matches!(
            self,
            Command::Whitelist { .. } | Command::Access { .. } | Command::Setting { .. }
        )
    }
}

/// Whether the author may run administrative commands on `server`
pub fn has_access(message: &InboundMessage, server: &ServerState) -> bool {
    message.author_is_owner || message.author_roles.iter().any(|r| server.roles.contains(r))
}

/// Executes commands and produces the reply text
pub struct CommandHandler {
    storage: Arc<dyn StorageBackend>,
    config: Arc<BotConfig>,
}

impl CommandHandler {
    pub fn new(storage: Arc<dyn StorageBackend>, config: Arc<BotConfig>) -> Self {
        Self { storage, config }
    }

    /// Run `command` for `message`
    ///
    /// Returns the text to post. Failures never leak detail to chat; the
    /// caller logs the error and replies with [`Self::generic_failure`].
    pub async fn execute(&self, command: &Command, message: &InboundMessage) -> Result<String> {
        debug!("Executing command {:?} on server {}", command, message.guild_id);

        if command.requires_access() {
            let server = self.storage.get_or_create_server(&message.guild_id).await?;
            if !has_access(message, &server) {
                info!(
                    "User {} denied {:?} on server {}",
                    message.author_id, command, message.guild_id
                );
                return Ok("Sorry, only the server owner or roles with access can do that."
                    .to_string());
            }
        }

        match command {
            Command::About => self.about(message).await,
            Command::Help => Ok(self.help()),
            Command::FirstRule => Ok(self.first_rule()),
            Command::Stats => self.stats(message).await,
            Command::Whitelist { channel } => {
                let channel = channel.as_deref().unwrap_or(&message.channel_name);
                let added = self
                    .storage
                    .toggle_whitelist(&message.guild_id, channel)
                    .await?;
                Ok(if added {
                    format!("Added #{} to the whitelist.", channel)
                } else {
                    format!("Removed #{} from the whitelist.", channel)
                })
            }
            Command::Access { role } => {
                let role = role.as_deref().ok_or_else(|| {
                    MemebotError::invalid_setting("access", "missing role")
                })?;
                let granted = self.storage.toggle_role(&message.guild_id, role).await?;
                Ok(if granted {
                    format!("Role {} now has access.", role)
                } else {
                    format!("Role {} no longer has access.", role)
                })
            }
            Command::Setting { name, value } => {
                let (Some(name), Some(value)) = (name, value) else {
                    return Ok(self.setting_usage());
                };
                self.set_setting(&message.guild_id, name, value).await
            }
            Command::Unknown(_) => Ok(self.unknown()),
        }
    }

    async fn about(&self, message: &InboundMessage) -> Result<String> {
        let meme = &self.config.meme;
        let trigger = self.config.command_trigger();
        let stats = self.storage.global_stats().await?;
        let server = self.storage.get_or_create_server(&message.guild_id).await?;

        Ok(format!(
            "{meme}bot v{version} swaps syllables in your messages for \"{meme}\". \
It serves one simple purpose, comedy.\n\
React with 👍 or 👎 on my messages to teach me what is funny. \
Disable learning with `{trigger} setting adaptiveLearning 0`.\n\
Servers: {servers} | Global mutations: {global} | This server: {local}\n\
Help: `{trigger} help`",
            meme = meme,
            version = env!("CARGO_PKG_VERSION"),
            trigger = trigger,
            servers = stats.total_servers,
            global = stats.mutation_count,
            local = server.mutation_count,
        ))
    }

    fn help(&self) -> String {
        let trigger = self.config.command_trigger();
        format!(
            "Commands for the server owner and roles with access:\n\
`{t} whitelist #channel` add or remove a channel from the whitelist (none by default)\n\
`{t} access @role` add or remove a role from access control\n\
`{t} setting <name> <value>` adjust settings: chanceToMutate, mutationBuffer, adaptiveLearning\n\
Never forget the firstrule.",
            t = trigger
        )
    }

    fn first_rule(&self) -> String {
        let meme = &self.config.meme;
        format!(
            "Remember the First Rule of {meme}botics: don't let {meme}bot reply to {meme}bot.",
            meme = meme
        )
    }

    async fn stats(&self, message: &InboundMessage) -> Result<String> {
        let stats = self.storage.global_stats().await?;
        let server = self.storage.get_or_create_server(&message.guild_id).await?;
        Ok(format!(
            "I have mutated {} message(s) on this server. Globally, I have already mutated {} messages!",
            server.mutation_count, stats.mutation_count
        ))
    }

    async fn set_setting(&self, server_id: &str, name: &str, value: &str) -> Result<String> {
        let setting: SettingName = name.parse()?;
        let server = self.storage.get_or_create_server(server_id).await?;

        let mut settings = server.settings;
        settings.apply(setting, value)?;
        self.storage.set_server_settings(server_id, &settings).await?;

        info!("Server {} set {} = {}", server_id, setting, value);
        Ok(format!("Setting {} is now {}.", setting, value.trim()))
    }

    fn setting_usage(&self) -> String {
        format!(
            "Usage: `{} setting <chanceToMutate|mutationBuffer|adaptiveLearning> <value>`",
            self.config.command_trigger()
        )
    }

    fn unknown(&self) -> String {
        let trigger = self.config.command_trigger();
        format!(
            "Sorry! I don't know what you want of me! Try `{t} help` or `{t} about`",
            t = trigger
        )
    }

    /// Reply used when a command fails internally
    pub fn generic_failure(&self) -> String {
        self.unknown()
    }
}
