//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::chat::ChatIdentity;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("chat.self_user is required")]
    MissingSelfUser,
    #[error("chat.self_server is required")]
    MissingSelfServer,
    #[error("chat.{field} is not a valid identity: '{value}'")]
    InvalidConsoleIdentity { field: &'static str, value: String },
    #[error("hosting.base_url must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),
    #[error("hosting.timeout_secs must be greater than 0")]
    ZeroHostingTimeout,
    #[error("poller.timeout_secs must be greater than 0")]
    ZeroPollTimeout,
    #[error("poller.interval_secs must be greater than 0")]
    ZeroPollInterval,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("admin.username and admin.password must not be empty")]
    EmptyAdminCredential,
    #[error("allowlist entry is not a valid identity: '{0}'")]
    InvalidAllowlistEntry(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Own identity
    if config.chat.self_user.is_empty() {
        errors.push(ValidationError::MissingSelfUser);
    }
    if config.chat.self_server.is_empty() {
        errors.push(ValidationError::MissingSelfServer);
    }

    for (field, value) in [
        ("console_sender", &config.chat.console_sender),
        ("console_chat", &config.chat.console_chat),
    ] {
        if value.parse::<ChatIdentity>().is_err() {
            errors.push(ValidationError::InvalidConsoleIdentity {
                field,
                value: value.clone(),
            });
        }
    }

    // Hosting API
    let base_url = &config.hosting.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ValidationError::InvalidBaseUrl(base_url.clone()));
    }
    if config.hosting.timeout_secs == 0 {
        errors.push(ValidationError::ZeroHostingTimeout);
    }

    if config.poller.timeout_secs == 0 {
        errors.push(ValidationError::ZeroPollTimeout);
    }
    if config.poller.interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    // Database path validation
    let db_path = Path::new(&config.database.path);
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::DatabasePathInvalid(
            config.database.path.clone(),
        ));
    }

    if let Some(ref admin) = config.admin
        && (admin.username.is_empty() || admin.password.is_empty())
    {
        errors.push(ValidationError::EmptyAdminCredential);
    }

    for entry in &config.allowlist {
        if entry.chat.parse::<ChatIdentity>().is_err() {
            errors.push(ValidationError::InvalidAllowlistEntry(entry.chat.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[chat]
self_user = "6281234"
console_sender = "6289999@s.whatsapp.net"
console_chat = "120363000000@g.us"
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_self_user_fails() {
        let toml = r#"
[chat]
self_user = ""
console_sender = "6289999@s.whatsapp.net"
console_chat = "120363000000@g.us"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingSelfUser)));
    }

    #[test]
    fn test_bad_console_identity_fails() {
        let toml = r#"
[chat]
self_user = "6281234"
console_sender = "6289999"
console_chat = "120363000000@g.us"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidConsoleIdentity {
                field: "console_sender",
                ..
            }
        )));
    }

    #[test]
    fn test_all_errors_are_reported() {
        let toml = format!(
            "{}\n{}",
            minimal_valid_config(),
            r#"
[hosting]
base_url = "ftp://example.net"

[poller]
timeout_secs = 0
interval_secs = 0

[database]
path = "/nonexistent/dir/gsbot.db"

[admin]
username = "admin"
password = ""

[[allowlist]]
chat = "not-an-identity"
"#
        );
        let config: Config = toml::from_str(&toml).unwrap();
        let errors = validate(&config).unwrap_err();

        assert_eq!(errors.len(), 6);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidBaseUrl(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroPollTimeout)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroPollInterval)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DatabasePathInvalid(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::EmptyAdminCredential)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidAllowlistEntry(_))));
    }

    #[test]
    fn test_memory_database_passes() {
        let toml = format!("{}\n[database]\npath = \":memory:\"\n", minimal_valid_config());
        let config: Config = toml::from_str(&toml).unwrap();
        assert!(validate(&config).is_ok());
    }
}
