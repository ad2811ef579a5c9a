//! In-process chat client.
//!
//! Drives the bot from a console (stdin lines become inbound messages,
//! replies go to an outbox) and backs the unit tests. Pairing items are
//! injected by the caller instead of coming from a network.

use super::client::{ChatClient, ChatError, EventHandler, HandlerId};
use super::events::{ChatEvent, GroupInfo, MessageEvent, PairingItem, SendReceipt};
use super::identity::ChatIdentity;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

/// Capacity of the upstream pairing source.
const PAIRING_SOURCE_CAPACITY: usize = 8;

/// A message the bot sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: ChatIdentity,
    pub text: String,
}

pub struct LoopbackClient {
    connected: AtomicBool,
    fail_connect: AtomicBool,
    device: RwLock<Option<ChatIdentity>>,
    alternate: RwLock<Option<ChatIdentity>>,
    /// Identity adopted once a pairing succeeds.
    pair_as: ChatIdentity,
    handlers: DashMap<HandlerId, EventHandler>,
    next_handler: AtomicU32,
    pairing_tx: Mutex<Option<mpsc::Sender<PairingItem>>>,
    pairing_requests: AtomicUsize,
    groups: RwLock<Vec<GroupInfo>>,
    sent: Mutex<Vec<OutboundMessage>>,
    outbox: Option<mpsc::UnboundedSender<OutboundMessage>>,
}

impl LoopbackClient {
    /// Create an unpaired client that will adopt `pair_as` when a pairing
    /// succeeds.
    pub fn new(pair_as: ChatIdentity) -> Self {
        Self {
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            device: RwLock::new(None),
            alternate: RwLock::new(None),
            pair_as,
            handlers: DashMap::new(),
            next_handler: AtomicU32::new(1),
            pairing_tx: Mutex::new(None),
            pairing_requests: AtomicUsize::new(0),
            groups: RwLock::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            outbox: None,
        }
    }

    /// Create a client that already holds a persisted device identity.
    pub fn paired(device: ChatIdentity, alternate: Option<ChatIdentity>) -> Self {
        let client = Self::new(device.clone());
        *client.device.write() = Some(device);
        *client.alternate.write() = alternate;
        client
    }

    /// Forward every sent message to `outbox` instead of the internal log.
    pub fn with_outbox(mut self, outbox: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        self.outbox = Some(outbox);
        self
    }

    pub fn set_groups(&self, groups: Vec<GroupInfo>) {
        *self.groups.write() = groups;
    }

    pub fn set_alternate_identity(&self, alternate: Option<ChatIdentity>) {
        *self.alternate.write() = alternate;
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::Relaxed);
    }

    /// How many upstream pairing sources have been opened.
    pub fn pairing_requests(&self) -> usize {
        self.pairing_requests.load(Ordering::Relaxed)
    }

    /// Number of subscribed event handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Messages sent so far, oldest first. Empty when an outbox is set.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    /// Push an item into the open pairing source.
    ///
    /// `Success` also stores the paired identity. `None` closes the source.
    pub async fn push_pairing(&self, item: Option<PairingItem>) {
        let tx = self.pairing_tx.lock().clone();
        let Some(tx) = tx else {
            return;
        };

        match item {
            Some(item) => {
                if item == PairingItem::Success {
                    *self.device.write() = Some(self.pair_as.clone());
                }
                let _ = tx.send(item).await;
            }
            None => {
                drop(tx);
                self.pairing_tx.lock().take();
            }
        }
    }

    /// Deliver `event` to every subscribed handler on the calling thread.
    pub fn emit(&self, event: ChatEvent) {
        let handlers: Vec<EventHandler> = self.handlers.iter().map(|h| h.value().clone()).collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    /// Deliver a plain-text message from `sender` in `chat`.
    pub fn emit_text(&self, sender: &ChatIdentity, chat: &ChatIdentity, text: &str) {
        self.emit(ChatEvent::Message(Box::new(MessageEvent::plain(
            sender.clone(),
            chat.clone(),
            text,
        ))));
    }
}

#[async_trait]
impl ChatClient for LoopbackClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn connect(&self) -> Result<(), ChatError> {
        if self.fail_connect.load(Ordering::Relaxed) {
            return Err(ChatError::Connect("loopback refused connection".into()));
        }
        self.connected.store(true, Ordering::Release);
        self.emit(ChatEvent::Connected);
        Ok(())
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            self.emit(ChatEvent::Disconnected);
        }
    }

    async fn logout(&self) -> Result<(), ChatError> {
        let had_device = self.device.write().take().is_some();
        self.alternate.write().take();
        self.connected.store(false, Ordering::Release);
        if had_device {
            self.emit(ChatEvent::LoggedOut);
        }
        Ok(())
    }

    async fn pairing_channel(&self) -> Result<mpsc::Receiver<PairingItem>, ChatError> {
        if self.device.read().is_some() {
            return Err(ChatError::PairingUnavailable("device already paired".into()));
        }
        let (tx, rx) = mpsc::channel(PAIRING_SOURCE_CAPACITY);
        *self.pairing_tx.lock() = Some(tx);
        self.pairing_requests.fetch_add(1, Ordering::Relaxed);
        Ok(rx)
    }

    fn device_identity(&self) -> Option<ChatIdentity> {
        self.device.read().clone()
    }

    fn alternate_identity(&self) -> Option<ChatIdentity> {
        self.alternate.read().clone()
    }

    async fn joined_groups(&self) -> Result<Vec<GroupInfo>, ChatError> {
        if !self.is_connected() {
            return Err(ChatError::NotConnected);
        }
        Ok(self.groups.read().clone())
    }

    async fn send_message(&self, to: &ChatIdentity, text: &str) -> Result<SendReceipt, ChatError> {
        if !self.is_connected() {
            return Err(ChatError::NotConnected);
        }

        let msg = OutboundMessage {
            to: to.clone(),
            text: text.to_string(),
        };
        match &self.outbox {
            Some(outbox) => outbox
                .send(msg)
                .map_err(|e| ChatError::Send(e.to_string()))?,
            None => self.sent.lock().push(msg),
        }

        Ok(SendReceipt {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
        })
    }

    fn add_event_handler(&self, handler: EventHandler) -> HandlerId {
        let id = self.next_handler.fetch_add(1, Ordering::Relaxed);
        self.handlers.insert(id, handler);
        id
    }

    fn remove_event_handler(&self, id: HandlerId) -> bool {
        self.handlers.remove(&id).is_some()
    }
}

/// Feed lines from `reader` into `client` as messages from `sender` in `chat`.
///
/// Returns when the reader reaches end of input.
pub async fn pump_lines<R>(
    client: &LoopbackClient,
    reader: R,
    sender: &ChatIdentity,
    chat: &ChatIdentity,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut count = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(len = line.len(), "Console line received");
        client.emit_text(sender, chat, line);
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn me() -> ChatIdentity {
        ChatIdentity::new("6281234", "s.whatsapp.net")
    }

    #[tokio::test]
    async fn send_requires_connection() {
        let client = LoopbackClient::paired(me(), None);
        let err = client.send_message(&me(), "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::NotConnected));

        client.connect().await.unwrap();
        client.send_message(&me(), "hi").await.unwrap();
        assert_eq!(client.sent().len(), 1);
    }

    #[tokio::test]
    async fn outbox_replaces_sent_log() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = LoopbackClient::paired(me(), None).with_outbox(tx);
        client.connect().await.unwrap();

        client.send_message(&me(), "hi").await.unwrap();

        assert_eq!(rx.recv().await.unwrap().text, "hi");
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn handlers_receive_events_until_removed() {
        let client = LoopbackClient::paired(me(), None);
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let id = client.add_event_handler(Arc::new(move |_| {
            seen_clone.fetch_add(1, Ordering::Relaxed);
        }));

        client.emit(ChatEvent::Connected);
        assert!(client.remove_event_handler(id));
        client.emit(ChatEvent::Connected);

        assert_eq!(seen.load(Ordering::Relaxed), 1);
        assert!(!client.remove_event_handler(id));
    }

    #[tokio::test]
    async fn pump_lines_emits_messages() {
        let client = LoopbackClient::paired(me(), None);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        client.add_event_handler(Arc::new(move |evt| {
            if let ChatEvent::Message(m) = evt {
                seen_clone.lock().push(m.text().unwrap_or_default().to_string());
            }
        }));

        let input: &[u8] = b"@6281234 /help\n\n  @6281234 /servers 2 \n";
        let chat = ChatIdentity::new("1203", "g.us");
        let count = pump_lines(&client, input, &me(), &chat).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(*seen.lock(), vec!["@6281234 /help", "@6281234 /servers 2"]);
    }

    #[tokio::test]
    async fn pairing_success_stores_identity() {
        let client = LoopbackClient::new(me());
        let mut rx = client.pairing_channel().await.unwrap();
        client.push_pairing(Some(PairingItem::Success)).await;

        assert_eq!(rx.recv().await, Some(PairingItem::Success));
        assert_eq!(client.device_identity(), Some(me()));
        assert!(client.pairing_channel().await.is_err());
    }
}
