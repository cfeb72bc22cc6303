//! Environment-sourced process configuration.
//!
//! Read once at startup and never mutated; every component receives the
//! values it needs by ownership or reference. A missing or invalid required
//! setting is fatal before any network connection is made.

use std::path::PathBuf;

use {secrecy::Secret, thiserror::Error};

use deskrelay_common::types::ChatId;

/// Default directory snapshot path when `STORAGE_FILE` is unset.
const DEFAULT_STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("{name} is required when {requires} is enabled")]
    RequiredWith {
        name: &'static str,
        requires: &'static str,
    },
}

/// Process-wide configuration.
pub struct Config {
    /// Bot API token from @BotFather.
    pub token: Secret<String>,

    /// The single support chat all topics live in. Must be a forum.
    pub support_chat_id: ChatId,

    /// Default language for translated notices.
    pub lang: String,

    /// Answer `/start` in private chats and pre-provision the sender's topic.
    pub enable_start_command: bool,

    /// Sent back on `/start` when the start command is enabled.
    pub welcome_message: Option<String>,

    /// Directory snapshot path.
    pub storage_file: PathBuf,

    /// Optional on-disk override for the embedded translation table.
    pub i18n_file: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"[REDACTED]")
            .field("support_chat_id", &self.support_chat_id)
            .field("lang", &self.lang)
            .field("enable_start_command", &self.enable_start_command)
            .field("storage_file", &self.storage_file)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load from the process environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup (the seam tests use).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = Secret::new(require(&lookup, "BOT_TOKEN")?);

        let support_chat_id = require(&lookup, "SUPPORT_CHAT_ID")?
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| ConfigError::Invalid {
                name: "SUPPORT_CHAT_ID",
                reason: e.to_string(),
            })?;

        let lang = require(&lookup, "APP_LANG")?;

        let enable_start_command = lookup("ENABLE_START_COMMAND")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let welcome_message = lookup("WELCOME_MESSAGE").filter(|v| !v.trim().is_empty());
        if enable_start_command && welcome_message.is_none() {
            return Err(ConfigError::RequiredWith {
                name: "WELCOME_MESSAGE",
                requires: "ENABLE_START_COMMAND",
            });
        }

        let storage_file = lookup("STORAGE_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_FILE));

        let i18n_file = lookup("I18N_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            token,
            support_chat_id,
            lang,
            enable_start_command,
            welcome_message,
            storage_file,
            i18n_file,
        })
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use {super::*, secrecy::ExposeSecret};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("BOT_TOKEN", "123:ABC"),
            ("SUPPORT_CHAT_ID", "-100500"),
            ("APP_LANG", "en"),
        ]
    }

    #[test]
    fn minimal_environment_loads_with_defaults() {
        let config = Config::from_lookup(env(&minimal())).unwrap();
        assert_eq!(config.token.expose_secret(), "123:ABC");
        assert_eq!(config.support_chat_id, ChatId(-100_500));
        assert_eq!(config.lang, "en");
        assert!(!config.enable_start_command);
        assert_eq!(config.welcome_message, None);
        assert_eq!(config.storage_file, PathBuf::from("storage.json"));
        assert_eq!(config.i18n_file, None);
    }

    #[test]
    fn missing_token_is_fatal() {
        let err = Config::from_lookup(env(&[("SUPPORT_CHAT_ID", "1"), ("APP_LANG", "en")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BOT_TOKEN")));
    }

    #[test]
    fn missing_support_chat_is_fatal() {
        let err = Config::from_lookup(env(&[("BOT_TOKEN", "t"), ("APP_LANG", "en")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPPORT_CHAT_ID")));
    }

    #[test]
    fn non_numeric_support_chat_is_fatal() {
        let mut pairs = minimal();
        pairs[1] = ("SUPPORT_CHAT_ID", "not-a-number");
        let err = Config::from_lookup(env(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "SUPPORT_CHAT_ID",
                ..
            }
        ));
    }

    #[test]
    fn start_command_requires_welcome_message() {
        let mut pairs = minimal();
        pairs.push(("ENABLE_START_COMMAND", "true"));
        let err = Config::from_lookup(env(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RequiredWith {
                name: "WELCOME_MESSAGE",
                ..
            }
        ));

        pairs.push(("WELCOME_MESSAGE", "Hi! How can we help?"));
        let config = Config::from_lookup(env(&pairs)).unwrap();
        assert!(config.enable_start_command);
        assert_eq!(config.welcome_message.as_deref(), Some("Hi! How can we help?"));
    }

    #[test]
    fn start_flag_parsing_is_case_insensitive() {
        let mut pairs = minimal();
        pairs.push(("ENABLE_START_COMMAND", "TRUE"));
        pairs.push(("WELCOME_MESSAGE", "hello"));
        assert!(Config::from_lookup(env(&pairs)).unwrap().enable_start_command);

        let mut pairs = minimal();
        pairs.push(("ENABLE_START_COMMAND", "yes"));
        assert!(!Config::from_lookup(env(&pairs)).unwrap().enable_start_command);
    }

    #[test]
    fn storage_file_override() {
        let mut pairs = minimal();
        pairs.push(("STORAGE_FILE", "/var/lib/deskrelay/state.json"));
        let config = Config::from_lookup(env(&pairs)).unwrap();
        assert_eq!(
            config.storage_file,
            PathBuf::from("/var/lib/deskrelay/state.json")
        );
    }

    #[test]
    fn debug_redacts_the_token() {
        let config = Config::from_lookup(env(&minimal())).unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("123:ABC"));
    }
}
