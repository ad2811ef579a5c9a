//! Game-hosting API seam.
//!
//! [`HostingApi`] is what the services talk to. [`HttpHostingClient`] speaks
//! the REST API; tests use an in-crate scripted fake.

mod client;
mod types;

pub use client::HttpHostingClient;
pub use types::{AccountInfo, ServerInfo, ServerPlayers, ServerSoftware, ServerStatus};

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Placeholder when the API returns an error without a message.
pub const NO_ERROR_MESSAGE: &str = "(hosting API gave no error message)";

static API_ERROR_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn api_error_pattern() -> Option<&'static Regex> {
    API_ERROR_PATTERN
        .get_or_init(|| Regex::new(r"API error: \[(\d+)]").ok())
        .as_ref()
}

#[derive(Debug, Error)]
pub enum HostingError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The API answers some repeated actions (stopping a stopped server)
    /// with 208 and an error body.
    #[error("already reported: {0}")]
    AlreadyReported(String),

    #[error("API error: [{status}] {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(String),
}

impl HostingError {
    /// Classify an error reply by its HTTP status code.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| NO_ERROR_MESSAGE.to_string());
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            208 => Self::AlreadyReported(message),
            status => Self::Api { status, message },
        }
    }
}

/// Extract the status code from `API error: [<code>]`.
pub fn extract_status(text: &str) -> Option<u16> {
    api_error_pattern()?
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Operations the bot needs from the game-hosting provider.
///
/// Every call takes the API key explicitly; nothing is cached between calls.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Account owning `api_key`. Doubles as key validation.
    async fn account(&self, api_key: &str) -> Result<AccountInfo, HostingError>;

    async fn list_servers(&self, api_key: &str) -> Result<Vec<ServerInfo>, HostingError>;

    async fn start_server(
        &self,
        api_key: &str,
        server_id: &str,
        use_own_credits: bool,
    ) -> Result<(), HostingError>;

    async fn stop_server(&self, api_key: &str, server_id: &str) -> Result<(), HostingError>;

    async fn server_info(&self, api_key: &str, server_id: &str) -> Result<ServerInfo, HostingError>;
}

#[cfg(test)]
pub mod fake {
    //! Scripted in-memory [`HostingApi`].

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;

    pub const VALID_KEY: &str = "valid-key";

    pub fn server(id: &str, name: &str, status: ServerStatus) -> ServerInfo {
        ServerInfo {
            id: id.to_string(),
            name: name.to_string(),
            address: format!("{name}.example.net"),
            motd: format!("Welcome to {name}"),
            status,
            host: None,
            port: None,
            players: ServerPlayers {
                max: 20,
                count: 0,
                list: None,
            },
            software: Some(ServerSoftware {
                id: "sw".to_string(),
                name: "Vanilla".to_string(),
                version: "1.20.4".to_string(),
            }),
            shared: false,
        }
    }

    #[derive(Default)]
    pub struct FakeHosting {
        pub servers: Mutex<Vec<ServerInfo>>,
        /// Consumed by `server_info`, one per call. When empty the listed
        /// server is returned as is.
        pub info_script: Mutex<VecDeque<Result<ServerStatus, u16>>>,
        pub info_delay: Mutex<Option<Duration>>,
        pub start_status: Mutex<Option<u16>>,
        pub stop_status: Mutex<Option<u16>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeHosting {
        pub fn with_servers(servers: Vec<ServerInfo>) -> Self {
            let fake = Self::default();
            *fake.servers.lock() = servers;
            fake
        }

        pub fn script_info(&self, items: impl IntoIterator<Item = Result<ServerStatus, u16>>) {
            self.info_script.lock().extend(items);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn check_key(&self, api_key: &str) -> Result<(), HostingError> {
            if api_key == VALID_KEY {
                Ok(())
            } else {
                Err(HostingError::from_status(403, Some("invalid key".into())))
            }
        }

        fn find(&self, server_id: &str) -> Result<ServerInfo, HostingError> {
            self.servers
                .lock()
                .iter()
                .find(|s| s.id == server_id)
                .cloned()
                .ok_or_else(|| HostingError::from_status(404, Some("server not found".into())))
        }
    }

    #[async_trait]
    impl HostingApi for FakeHosting {
        async fn account(&self, api_key: &str) -> Result<AccountInfo, HostingError> {
            self.calls.lock().push("account".into());
            self.check_key(api_key)?;
            Ok(AccountInfo {
                name: "tester".into(),
                email: "tester@example.net".into(),
                verified: true,
                credits: 12.5,
            })
        }

        async fn list_servers(&self, api_key: &str) -> Result<Vec<ServerInfo>, HostingError> {
            self.calls.lock().push("list".into());
            self.check_key(api_key)?;
            Ok(self.servers.lock().clone())
        }

        async fn start_server(
            &self,
            api_key: &str,
            server_id: &str,
            _use_own_credits: bool,
        ) -> Result<(), HostingError> {
            self.calls.lock().push(format!("start {server_id}"));
            self.check_key(api_key)?;
            match *self.start_status.lock() {
                Some(status) => Err(HostingError::from_status(status, None)),
                None => Ok(()),
            }
        }

        async fn stop_server(&self, api_key: &str, server_id: &str) -> Result<(), HostingError> {
            self.calls.lock().push(format!("stop {server_id}"));
            self.check_key(api_key)?;
            match *self.stop_status.lock() {
                Some(status) => Err(HostingError::from_status(status, None)),
                None => Ok(()),
            }
        }

        async fn server_info(
            &self,
            api_key: &str,
            server_id: &str,
        ) -> Result<ServerInfo, HostingError> {
            self.calls.lock().push(format!("info {server_id}"));
            self.check_key(api_key)?;

            let delay = *self.info_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut info = self.find(server_id)?;
            let next = self.info_script.lock().pop_front();
            match next {
                Some(Ok(status)) => info.status = status,
                Some(Err(code)) => return Err(HostingError::from_status(code, None)),
                None => {}
            }
            Ok(info)
        }
    }
}
