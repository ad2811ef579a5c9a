//! Events delivered by the chat-network client.

use super::identity::ChatIdentity;
use chrono::{DateTime, Utc};

/// Metadata of an inbound message.
#[derive(Debug, Clone)]
pub struct MessageInfo {
    pub id: String,
    /// Who wrote the message.
    pub sender: ChatIdentity,
    /// Where it was written (a group, or the sender for direct chats).
    pub chat: ChatIdentity,
    pub from_me: bool,
    pub timestamp: DateTime<Utc>,
}

/// An inbound message. Either payload may be absent.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub info: MessageInfo,
    /// Plain-text body.
    pub conversation: Option<String>,
    /// Body of an extended text message (replies, link previews, mentions).
    pub extended_text: Option<String>,
}

impl MessageEvent {
    /// Plain-text message from `sender` in `chat`, stamped now.
    pub fn plain(sender: ChatIdentity, chat: ChatIdentity, text: impl Into<String>) -> Self {
        Self {
            info: MessageInfo {
                id: uuid::Uuid::new_v4().to_string(),
                sender,
                chat,
                from_me: false,
                timestamp: Utc::now(),
            },
            conversation: Some(text.into()),
            extended_text: None,
        }
    }

    /// First non-empty text payload, plain text first.
    pub fn text(&self) -> Option<&str> {
        [self.conversation.as_deref(), self.extended_text.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
    }
}

/// Everything the client can report through an event subscription.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Connected,
    Disconnected,
    /// Offline history sync started; local state is stale until it completes.
    OfflineSyncPreview { messages: usize },
    OfflineSyncCompleted { count: usize },
    LoggedOut,
    Message(Box<MessageEvent>),
}

/// One item of the upstream pairing-code source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingItem {
    /// A new code to show to the user.
    Code { code: String, timeout_secs: u64 },
    Success,
    Timeout,
    ClientOutdated,
    MultideviceNotEnabled,
    UnexpectedEvent(String),
    Error(String),
}

impl PairingItem {
    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Code { .. } => "code",
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::ClientOutdated => "client_outdated",
            Self::MultideviceNotEnabled => "multidevice_not_enabled",
            Self::UnexpectedEvent(_) => "unexpected_event",
            Self::Error(_) => "error",
        }
    }
}

/// A joined group chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub id: ChatIdentity,
    pub name: String,
    pub participants: usize,
}

/// Returned by a successful send.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(conversation: Option<&str>, extended: Option<&str>) -> MessageEvent {
        let who = ChatIdentity::new("1", "s.whatsapp.net");
        MessageEvent {
            info: MessageInfo {
                id: "m1".into(),
                sender: who.clone(),
                chat: who,
                from_me: false,
                timestamp: Utc::now(),
            },
            conversation: conversation.map(String::from),
            extended_text: extended.map(String::from),
        }
    }

    #[test]
    fn text_prefers_plain_payload() {
        assert_eq!(event(Some("a"), Some("b")).text(), Some("a"));
    }

    #[test]
    fn text_falls_back_to_extended() {
        assert_eq!(event(Some(""), Some("b")).text(), Some("b"));
        assert_eq!(event(None, Some("b")).text(), Some("b"));
    }

    #[test]
    fn text_absent() {
        assert_eq!(event(None, None).text(), None);
        assert_eq!(event(Some(""), Some("")).text(), None);
    }
}
