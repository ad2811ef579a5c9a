//! Services binding storage, the chat session and the hosting API.

mod auth;
mod chat_admin;
pub mod poller;
mod settings;

pub use auth::AuthService;
pub use chat_admin::ChatAdminService;
pub use poller::{PollOptions, StatusPoller, StatusStream};
pub use settings::ServerSettingsService;
