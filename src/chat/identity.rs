//! Chat-network addresses.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Well-known server part for individual accounts.
pub const DEFAULT_USER_SERVER: &str = "s.whatsapp.net";

/// Well-known server part for group chats.
pub const GROUP_SERVER: &str = "g.us";

/// A chat-network address split into its local and server parts.
///
/// Equality is structural on both parts. No case folding is applied, so
/// `ABC@g.us` and `abc@g.us` are different identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatIdentity {
    pub user: String,
    pub server: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityParseError {
    #[error("identity is empty")]
    Empty,
    #[error("identity has no server part: {0}")]
    MissingServer(String),
    #[error("identity has an empty local part: {0}")]
    EmptyUser(String),
}

impl ChatIdentity {
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
        }
    }

    /// Whether this identity addresses a group chat.
    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }
}

impl fmt::Display for ChatIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}

impl FromStr for ChatIdentity {
    type Err = IdentityParseError;

    /// Parses `user[.agent][:device]@server`. Agent and device suffixes are
    /// dropped so every device of one account maps to the same identity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentityParseError::Empty);
        }

        let (local, server) = s
            .rsplit_once('@')
            .ok_or_else(|| IdentityParseError::MissingServer(s.to_string()))?;
        if server.is_empty() {
            return Err(IdentityParseError::MissingServer(s.to_string()));
        }

        let user = local.split(':').next().unwrap_or_default();
        let user = if server == DEFAULT_USER_SERVER {
            user.split('.').next().unwrap_or_default()
        } else {
            user
        };
        if user.is_empty() {
            return Err(IdentityParseError::EmptyUser(s.to_string()));
        }

        Ok(Self::new(user, server))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_identity() {
        let id: ChatIdentity = "6281234@s.whatsapp.net".parse().unwrap();
        assert_eq!(id, ChatIdentity::new("6281234", "s.whatsapp.net"));
        assert_eq!(id.to_string(), "6281234@s.whatsapp.net");
        assert!(!id.is_group());
    }

    #[test]
    fn strips_device_suffix() {
        let id: ChatIdentity = "6281234.0:12@s.whatsapp.net".parse().unwrap();
        assert_eq!(id.user, "6281234");
    }

    #[test]
    fn group_identity() {
        let id: ChatIdentity = "120363000000@g.us".parse().unwrap();
        assert!(id.is_group());
    }

    #[test]
    fn equality_is_case_sensitive() {
        let a: ChatIdentity = "ABC@g.us".parse().unwrap();
        let b: ChatIdentity = "abc@g.us".parse().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!("".parse::<ChatIdentity>(), Err(IdentityParseError::Empty));
        assert!(matches!(
            "6281234".parse::<ChatIdentity>(),
            Err(IdentityParseError::MissingServer(_))
        ));
        assert!(matches!(
            "@g.us".parse::<ChatIdentity>(),
            Err(IdentityParseError::EmptyUser(_))
        ));
    }
}
