//! Core configuration types and loading.

use super::defaults::*;
use crate::chat::{ChatIdentity, identity::IdentityParseError};
use crate::service::PollOptions;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    /// Own identity and console transport.
    pub chat: ChatConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub hosting: HostingConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Seed credential, created only while no user exists.
    pub admin: Option<AdminConfig>,
    /// Chats allow-listed at startup.
    #[serde(default)]
    pub allowlist: Vec<AllowlistEntry>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Resume the stored device, or start pairing, on startup.
    #[serde(default = "default_true")]
    pub auto_login: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            auto_login: default_true(),
        }
    }
}

/// Chat identity and console transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Local part of the bot's own identity (its phone number).
    pub self_user: String,
    #[serde(default = "default_self_server")]
    pub self_server: String,
    /// Local part of the alternate identity, if the network assigned one.
    pub alternate_user: Option<String>,
    /// Who console lines are sent as.
    pub console_sender: String,
    /// Where console lines are sent to.
    pub console_chat: String,
}

impl ChatConfig {
    pub fn self_identity(&self) -> ChatIdentity {
        ChatIdentity::new(&self.self_user, &self.self_server)
    }

    /// Alternate identities live on the `lid` server.
    pub fn alternate_identity(&self) -> Option<ChatIdentity> {
        self.alternate_user
            .as_deref()
            .filter(|user| !user.is_empty())
            .map(|user| ChatIdentity::new(user, "lid"))
    }

    pub fn console_sender(&self) -> Result<ChatIdentity, IdentityParseError> {
        self.console_sender.parse()
    }

    pub fn console_chat(&self) -> Result<ChatIdentity, IdentityParseError> {
        self.console_chat.parse()
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Game-hosting API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HostingConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_hosting_timeout")]
    pub timeout_secs: u64,
    /// Stored as the API key at startup when set.
    pub api_key: Option<String>,
}

impl HostingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_hosting_timeout(),
            api_key: None,
        }
    }
}

/// Status polling after a server start.
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
    /// Spend the API key owner's credits instead of the server owner's.
    #[serde(default)]
    pub use_own_credits: bool,
}

impl PollerConfig {
    /// Clamped poll timing.
    pub fn options(&self) -> PollOptions {
        PollOptions::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_secs(self.interval_secs),
        )
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout(),
            interval_secs: default_poll_interval(),
            use_own_credits: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Prometheus metrics endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// HTTP port for `/metrics`. 0 disables the endpoint.
    #[serde(default)]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllowlistEntry {
    /// Full identity, e.g. `120363000000@g.us`.
    pub chat: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[chat]
self_user = "6281234"
console_sender = "6289999@s.whatsapp.net"
console_chat = "120363000000@g.us"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();

        assert!(config.bot.auto_login);
        assert_eq!(config.chat.self_server, "s.whatsapp.net");
        assert_eq!(config.database.path, "gsbot.db");
        assert_eq!(config.hosting.base_url, "https://api.exaroton.com/v1");
        assert_eq!(config.hosting.timeout(), Duration::from_secs(10));
        assert_eq!(config.poller.options(), PollOptions::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.metrics.port, 0);
        assert!(config.admin.is_none());
        assert!(config.allowlist.is_empty());
    }

    #[test]
    fn identities_from_chat_section() {
        let config: Config = toml::from_str(MINIMAL).unwrap();

        assert_eq!(
            config.chat.self_identity(),
            ChatIdentity::new("6281234", "s.whatsapp.net")
        );
        assert!(config.chat.alternate_identity().is_none());
        assert!(config.chat.console_chat().unwrap().is_group());
    }

    #[test]
    fn poller_options_are_clamped() {
        let poller = PollerConfig {
            timeout_secs: 1,
            interval_secs: 1,
            use_own_credits: false,
        };
        let opts = poller.options();
        assert_eq!(opts.timeout(), PollOptions::MIN_TIMEOUT);
        assert_eq!(opts.interval(), PollOptions::MIN_INTERVAL);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{MINIMAL}\n[admin]\nusername = \"root\"\npassword = \"hunter2\"\n\n\
             [[allowlist]]\nchat = \"120363000000@g.us\"\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.admin.unwrap().username, "root");
        assert_eq!(config.allowlist.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn missing_chat_section_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\npath = \"x.db\"").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
