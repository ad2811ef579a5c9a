//! Interface to the underlying chat-network client.
//!
//! The wire protocol, encryption and multi-device sync live behind this
//! trait. Everything above it (session, router, commands) only talks to
//! `dyn ChatClient`.

use super::events::{ChatEvent, GroupInfo, PairingItem, SendReceipt};
use super::identity::ChatIdentity;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Callback invoked for every event the client emits.
///
/// Runs on the client's own delivery thread and must return quickly.
pub type EventHandler = Arc<dyn Fn(ChatEvent) + Send + Sync>;

/// Opaque token returned by [`ChatClient::add_event_handler`].
pub type HandlerId = u32;

/// Errors raised by the chat-network client.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("not connected")]
    NotConnected,
    #[error("no device identity stored")]
    NoIdentity,
    #[error("pairing is not available: {0}")]
    PairingUnavailable(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("connection failed: {0}")]
    Connect(String),
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Transport-level connection state.
    fn is_connected(&self) -> bool;

    async fn connect(&self) -> Result<(), ChatError>;

    fn disconnect(&self);

    /// Unlinks the device. Must be a no-op when nothing is linked.
    async fn logout(&self) -> Result<(), ChatError>;

    /// Opens a fresh upstream pairing-code source. Must be called before
    /// [`ChatClient::connect`] on an unpaired device.
    async fn pairing_channel(&self) -> Result<mpsc::Receiver<PairingItem>, ChatError>;

    /// Persisted device identity (phone-number based), if paired.
    fn device_identity(&self) -> Option<ChatIdentity>;

    /// Alternate (privacy) identity, once the network has assigned one.
    fn alternate_identity(&self) -> Option<ChatIdentity>;

    async fn joined_groups(&self) -> Result<Vec<GroupInfo>, ChatError>;

    async fn send_message(&self, to: &ChatIdentity, text: &str) -> Result<SendReceipt, ChatError>;

    fn add_event_handler(&self, handler: EventHandler) -> HandlerId;

    fn remove_event_handler(&self, id: HandlerId) -> bool;
}
