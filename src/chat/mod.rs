//! Chat-network side of the bot: identities, events, the client seam and
//! the session wrapper that owns login and pairing.

pub mod client;
pub mod events;
pub mod identity;
pub mod loopback;
pub mod session;

pub use client::{ChatClient, ChatError, EventHandler, HandlerId};
pub use events::{ChatEvent, GroupInfo, MessageEvent, MessageInfo, PairingItem, SendReceipt};
pub use identity::ChatIdentity;
pub use loopback::{LoopbackClient, OutboundMessage};
pub use session::{ChatSession, PairingEvent, PairingState, PairingStream};
