//! Per-dispatch context.

use crate::chat::{ChatError, ChatIdentity, ChatSession, SendReceipt};
use std::sync::Arc;

/// Everything a handler knows about the message it is handling.
#[derive(Clone)]
pub struct Context {
    /// Full message text.
    pub message: String,
    /// Route key, with its leading slash.
    pub command: String,
    /// Tokens after the command.
    pub args: Vec<String>,
    pub sender: ChatIdentity,
    pub chat: ChatIdentity,
    /// Own phone number, empty when unknown.
    pub phone_number: String,
    session: Arc<ChatSession>,
}

impl Context {
    pub fn new(
        message: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
        sender: ChatIdentity,
        chat: ChatIdentity,
        session: Arc<ChatSession>,
    ) -> Self {
        Self {
            message: message.into(),
            command: command.into(),
            args,
            sender,
            chat,
            phone_number: session.phone_number().unwrap_or_default(),
            session,
        }
    }

    /// Send `text` to the chat the message came from.
    pub async fn reply(&self, text: &str) -> Result<SendReceipt, ChatError> {
        self.session.send_text(&self.chat, text).await
    }

    pub async fn send(&self, to: &ChatIdentity, text: &str) -> Result<SendReceipt, ChatError> {
        self.session.send_text(to, text).await
    }

    pub fn session(&self) -> &Arc<ChatSession> {
        &self.session
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("sender", &self.sender)
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}
