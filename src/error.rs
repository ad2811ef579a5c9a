//! Unified error handling for gsbot.
//!
//! `BotError` is what commands, middlewares and route handlers return. The
//! router's error translator only needs [`BotError::user_reply`] to decide
//! between a short chat reply and an operator-facing warning.

use crate::chat::client::ChatError;
use crate::chat::events::PairingItem;
use crate::db::DbError;
use crate::hosting::HostingError;
use thiserror::Error;

// ============================================================================
// Bot Errors (command processing)
// ============================================================================

#[derive(Debug, Error)]
pub enum BotError {
    #[error("command not found")]
    CommandNotFound,

    #[error("missing argument")]
    MissingArgument,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("server not found")]
    ServerNotFound,

    #[error("server is already stopped/stopping")]
    ServerAlreadyStopping,

    #[error("forbidden")]
    Forbidden,

    #[error("unauthorized")]
    Unauthorized,

    #[error("chat is not allow-listed")]
    ChatNotAllowlisted,

    #[error("API key is empty")]
    EmptyApiKey,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("wrong credentials")]
    WrongCredentials,

    #[error("own chat identity is not available")]
    SelfIdentityUnavailable,

    #[error("hosting error: {0}")]
    Hosting(HostingError),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("pairing error: {0}")]
    Pairing(#[from] PairingError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Static error code for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CommandNotFound => "command_not_found",
            Self::MissingArgument => "missing_argument",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::ServerNotFound => "server_not_found",
            Self::ServerAlreadyStopping => "server_already_stopping",
            Self::Forbidden => "forbidden",
            Self::Unauthorized => "unauthorized",
            Self::ChatNotAllowlisted => "chat_not_allowlisted",
            Self::EmptyApiKey => "empty_api_key",
            Self::InvalidApiKey => "invalid_api_key",
            Self::WrongCredentials => "wrong_credentials",
            Self::SelfIdentityUnavailable => "self_identity_unavailable",
            Self::Hosting(_) => "hosting_error",
            Self::Db(_) => "db_error",
            Self::Chat(_) => "chat_error",
            Self::Pairing(_) => "pairing_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Chat reply for user-facing errors.
    ///
    /// Returns `None` for errors that must not leak into a chat room with
    /// several participants; those are only logged.
    pub fn user_reply(&self) -> Option<&'static str> {
        let text = match self {
            Self::ServerNotFound => "Server not found",
            Self::CommandNotFound => "Command not found",
            Self::ServerAlreadyStopping => "Server is already stopped/stopping",
            Self::Forbidden => "You do not have permission to perform this action",
            Self::MissingArgument => "Missing argument",
            Self::InvalidArgument(_) => "Invalid argument",
            Self::ChatNotAllowlisted => "This chat is not whitelisted",
            Self::EmptyApiKey => "API key is empty",
            Self::InvalidApiKey => "Invalid API key",

            Self::Unauthorized
            | Self::WrongCredentials
            | Self::SelfIdentityUnavailable
            | Self::Hosting(_)
            | Self::Db(_)
            | Self::Chat(_)
            | Self::Pairing(_)
            | Self::Internal(_) => return None,
        };
        Some(text)
    }
}

impl From<HostingError> for BotError {
    fn from(err: HostingError) -> Self {
        match err {
            HostingError::Forbidden(_) => BotError::Forbidden,
            HostingError::Unauthorized(_) => BotError::Unauthorized,
            other => BotError::Hosting(other),
        }
    }
}

/// Result type for commands and route handlers.
pub type BotResult<T> = Result<T, BotError>;

// ============================================================================
// Pairing Errors (device login)
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum PairingError {
    #[error("chat account is already logged in")]
    AlreadyLoggedIn,

    #[error("pairing timed out, please refresh and try again")]
    Timeout,

    #[error("chat client is outdated, please update this app")]
    ClientOutdated,

    #[error("multi-device is not enabled on the account, please enable it")]
    MultideviceNotEnabled,

    #[error("unexpected pairing event: {0}")]
    UnexpectedEvent(String),

    #[error("pairing error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Transport(#[from] ChatError),
}

impl PairingError {
    /// Map a terminal upstream pairing item to its error kind.
    ///
    /// Returns `None` for codes and for success.
    pub fn from_item(item: &PairingItem) -> Option<Self> {
        match item {
            PairingItem::Code { .. } | PairingItem::Success => None,
            PairingItem::Timeout => Some(Self::Timeout),
            PairingItem::ClientOutdated => Some(Self::ClientOutdated),
            PairingItem::MultideviceNotEnabled => Some(Self::MultideviceNotEnabled),
            PairingItem::UnexpectedEvent(evt) => Some(Self::UnexpectedEvent(evt.clone())),
            PairingItem::Error(msg) => Some(Self::Upstream(msg.clone())),
        }
    }
}
