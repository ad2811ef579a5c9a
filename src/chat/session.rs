//! Chat session wrapper and device-pairing state machine.
//!
//! ## Pairing
//!
//! ```text
//! Unpaired ──login()──▶ AwaitingScan ──success──▶ Paired
//!                            │
//!                            └──timeout / error──▶ Failed(reason)
//! ```
//!
//! At most one pairing session is in flight per `ChatSession`. A `login()`
//! while one is awaiting a scan joins it and gets the same [`PairingStream`];
//! the upstream handshake is never opened twice.
//!
//! The relay task is the single producer of a pairing stream. Closing the
//! stream (the relay dropping its sender) is the only termination signal;
//! a terminal [`PairingEvent`] is always the last item before the close.

use super::client::{ChatClient, ChatError, EventHandler, HandlerId};
use super::events::{ChatEvent, GroupInfo, PairingItem, SendReceipt};
use super::identity::ChatIdentity;
use crate::error::PairingError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, warn};

/// Buffer of the relay channel between the upstream source and the caller.
const RELAY_CAPACITY: usize = 1;

/// What a pairing stream yields.
#[derive(Debug, Clone)]
pub enum PairingEvent {
    /// Show this code to the user.
    Code { code: String, timeout_secs: u64 },
    /// Device linked; the stream closes next.
    Success,
    /// Pairing ended without a link; the stream closes next.
    Failed(PairingError),
}

/// Observable pairing state.
#[derive(Debug, Clone)]
pub enum PairingState {
    Unpaired,
    AwaitingScan,
    Paired,
    Failed(PairingError),
}

/// Shared handle on the relay channel of one pairing session.
///
/// Clones read from the same underlying channel.
#[derive(Debug, Clone)]
pub struct PairingStream {
    id: u64,
    rx: Arc<Mutex<mpsc::Receiver<PairingEvent>>>,
}

impl PairingStream {
    fn new(id: u64, rx: mpsc::Receiver<PairingEvent>) -> Self {
        Self {
            id,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Next event, or `None` once the pairing session has ended.
    pub async fn recv(&self) -> Option<PairingEvent> {
        self.rx.lock().await.recv().await
    }

    /// Whether both handles belong to the same pairing session.
    pub fn is_same(&self, other: &PairingStream) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.rx, &other.rx)
    }
}

struct ActivePairing {
    id: u64,
    stream: PairingStream,
    /// Dropping or firing this ends the relay, which closes the stream.
    cancel: oneshot::Sender<()>,
}

/// Owns the chat-network client handle for one account.
pub struct ChatSession {
    client: Arc<dyn ChatClient>,
    pairing: Arc<Mutex<Option<ActivePairing>>>,
    pairing_seq: AtomicU64,
    last_failure: Arc<parking_lot::Mutex<Option<PairingError>>>,
    sync_complete: Arc<AtomicBool>,
    state_handler: HandlerId,
}

impl ChatSession {
    /// Wrap `client` and start tracking its sync state.
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        let sync_complete = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&sync_complete);
        let state_handler = client.add_event_handler(Arc::new(move |evt| match evt {
            ChatEvent::Connected | ChatEvent::OfflineSyncCompleted { .. } => {
                flag.store(true, Ordering::Release);
            }
            ChatEvent::OfflineSyncPreview { .. }
            | ChatEvent::Disconnected
            | ChatEvent::LoggedOut => {
                flag.store(false, Ordering::Release);
            }
            ChatEvent::Message(_) => {}
        }));

        Self {
            client,
            pairing: Arc::new(Mutex::new(None)),
            pairing_seq: AtomicU64::new(0),
            last_failure: Arc::new(parking_lot::Mutex::new(None)),
            sync_complete,
            state_handler,
        }
    }

    /// Connected and holding a persisted device identity.
    pub fn is_logged_in(&self) -> bool {
        self.client.is_connected() && self.client.device_identity().is_some()
    }

    /// Whether offline history has caught up.
    pub fn is_sync_complete(&self) -> bool {
        self.sync_complete.load(Ordering::Acquire)
    }

    /// Log in, resuming a stored device or starting (or joining) a pairing.
    ///
    /// Returns `Ok(None)` when a stored device was resumed and no pairing
    /// is needed.
    pub async fn login(&self) -> Result<Option<PairingStream>, PairingError> {
        if self.is_logged_in() {
            return Err(PairingError::AlreadyLoggedIn);
        }

        if self.resume().await? {
            return Ok(None);
        }

        // Held across the connect so two concurrent logins cannot both open
        // an upstream handshake.
        let mut slot = self.pairing.lock().await;
        if let Some(active) = slot.as_ref() {
            debug!(pairing = active.id, "Joining in-flight pairing session");
            return Ok(Some(active.stream.clone()));
        }

        let upstream = self.client.pairing_channel().await?;
        self.client.connect().await?;

        let id = self.pairing_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::channel(RELAY_CAPACITY);
        let stream = PairingStream::new(id, rx);
        let (cancel, cancelled) = oneshot::channel();
        *slot = Some(ActivePairing {
            id,
            stream: stream.clone(),
            cancel,
        });
        drop(slot);

        self.last_failure.lock().take();
        info!(pairing = id, "Pairing session started");
        self.spawn_relay(id, upstream, tx, cancelled);

        Ok(Some(stream))
    }

    /// Connect with the stored device identity, if there is one.
    ///
    /// Returns whether a stored session was used.
    pub async fn resume(&self) -> Result<bool, PairingError> {
        if self.is_logged_in() || self.client.device_identity().is_none() {
            return Ok(false);
        }

        self.client.connect().await?;
        info!("Resumed stored chat session");
        Ok(true)
    }

    pub async fn logout(&self) -> Result<(), ChatError> {
        self.client.logout().await?;
        if let Some(active) = self.pairing.lock().await.take() {
            debug!(pairing = active.id, "Pairing session dropped by logout");
            let _ = active.cancel.send(());
        }
        Ok(())
    }

    pub fn disconnect(&self) {
        self.client.disconnect();
    }

    pub async fn pairing_state(&self) -> PairingState {
        if self.is_logged_in() {
            return PairingState::Paired;
        }
        if self.pairing.lock().await.is_some() {
            return PairingState::AwaitingScan;
        }
        match self.last_failure.lock().clone() {
            Some(reason) => PairingState::Failed(reason),
            None => PairingState::Unpaired,
        }
    }

    /// Persisted device identity. No network call.
    pub fn identity(&self) -> Option<ChatIdentity> {
        self.client.device_identity()
    }

    /// Alternate identity, `None` until the network has assigned one.
    pub fn alternate_identity(&self) -> Option<ChatIdentity> {
        self.client.alternate_identity()
    }

    /// Local part of the device identity (the phone number).
    pub fn phone_number(&self) -> Option<String> {
        self.client.device_identity().map(|id| id.user)
    }

    pub async fn groups(&self) -> Result<Vec<GroupInfo>, ChatError> {
        self.client.joined_groups().await
    }

    pub async fn send_text(&self, to: &ChatIdentity, text: &str) -> Result<SendReceipt, ChatError> {
        self.client.send_message(to, text).await
    }

    pub fn subscribe(&self, handler: EventHandler) -> HandlerId {
        self.client.add_event_handler(handler)
    }

    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.client.remove_event_handler(id)
    }

    fn spawn_relay(
        &self,
        id: u64,
        mut upstream: mpsc::Receiver<PairingItem>,
        tx: mpsc::Sender<PairingEvent>,
        mut cancelled: oneshot::Receiver<()>,
    ) {
        let pairing = Arc::clone(&self.pairing);
        let last_failure = Arc::clone(&self.last_failure);

        tokio::spawn(async move {
            let terminal = loop {
                let item = tokio::select! {
                    item = upstream.recv() => item,
                    _ = &mut cancelled => {
                        debug!(pairing = id, "Pairing relay cancelled");
                        break None;
                    }
                };
                let Some(item) = item else {
                    debug!(pairing = id, "Upstream pairing source closed");
                    break None;
                };
                crate::metrics::record_pairing_event(item.label());

                match item {
                    PairingItem::Code { code, timeout_secs } => {
                        // Blocks while the consumer is not reading.
                        tokio::select! {
                            sent = tx.send(PairingEvent::Code { code, timeout_secs }) => {
                                if sent.is_err() {
                                    debug!(pairing = id, "Pairing stream dropped by every reader");
                                    break None;
                                }
                            }
                            _ = &mut cancelled => {
                                debug!(pairing = id, "Pairing relay cancelled");
                                break None;
                            }
                        }
                    }
                    PairingItem::Success => {
                        info!(pairing = id, "Device paired");
                        break Some(PairingEvent::Success);
                    }
                    other => {
                        let reason = PairingError::from_item(&other)
                            .unwrap_or_else(|| PairingError::UnexpectedEvent(other.label().into()));
                        warn!(pairing = id, error = %reason, "Pairing failed");
                        *last_failure.lock() = Some(reason.clone());
                        break Some(PairingEvent::Failed(reason));
                    }
                }
            };

            {
                let mut slot = pairing.lock().await;
                if slot.as_ref().is_some_and(|active| active.id == id) {
                    *slot = None;
                }
            }

            if let Some(event) = terminal {
                let _ = tx.send(event).await;
            }
        });
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.client.remove_event_handler(self.state_handler);
    }
}
