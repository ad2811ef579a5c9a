//! Hosting API key storage and server operations by listing index.

use super::poller::{PollOptions, StatusPoller, StatusStream};
use crate::db::{API_KEY, Database};
use crate::error::{BotError, BotResult};
use crate::hosting::{AccountInfo, HostingApi, HostingError, ServerInfo};
use std::sync::Arc;
use tracing::info;

/// Binds the stored API key to the hosting API.
///
/// Servers are addressed by their position in the provider's listing. The
/// listing is fetched again on every call, so an index always refers to the
/// order at call time.
pub struct ServerSettingsService {
    db: Database,
    hosting: Arc<dyn HostingApi>,
    poller: StatusPoller,
    use_own_credits: bool,
}

impl ServerSettingsService {
    pub fn new(db: Database, hosting: Arc<dyn HostingApi>, use_own_credits: bool) -> Self {
        Self {
            db,
            poller: StatusPoller::new(Arc::clone(&hosting)),
            hosting,
            use_own_credits,
        }
    }

    /// Stored API key, `None` when never set.
    pub async fn api_key(&self) -> BotResult<Option<String>> {
        Ok(self.db.settings().get(API_KEY).await?)
    }

    pub async fn update_api_key(&self, api_key: &str) -> BotResult<()> {
        self.db.settings().upsert(API_KEY, api_key).await?;
        info!("Hosting API key updated");
        Ok(())
    }

    /// Account owning `api_key`. A rejected key is [`BotError::InvalidApiKey`].
    pub async fn validate_api_key(&self, api_key: &str) -> BotResult<AccountInfo> {
        match self.hosting.account(api_key).await {
            Ok(account) => Ok(account),
            Err(HostingError::Forbidden(_)) => Err(BotError::InvalidApiKey),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_servers(&self) -> BotResult<Vec<ServerInfo>> {
        let api_key = self.require_api_key().await?;
        Ok(self.hosting.list_servers(&api_key).await?)
    }

    /// Start the server at `index` and poll its status in the background.
    pub async fn start_server(&self, index: usize, opts: PollOptions) -> BotResult<StatusStream> {
        let (api_key, server) = self.resolve(index).await?;
        self.hosting
            .start_server(&api_key, &server.id, self.use_own_credits)
            .await?;
        info!(index, server = %server.id, "Server start requested");

        Ok(self.poller.spawn(api_key, server.id, opts))
    }

    pub async fn stop_server(&self, index: usize) -> BotResult<()> {
        let (api_key, server) = self.resolve(index).await?;
        match self.hosting.stop_server(&api_key, &server.id).await {
            Ok(()) => {
                info!(index, server = %server.id, "Server stop requested");
                Ok(())
            }
            Err(HostingError::AlreadyReported(_)) => Err(BotError::ServerAlreadyStopping),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn server_info(&self, index: usize) -> BotResult<ServerInfo> {
        let (api_key, server) = self.resolve(index).await?;
        Ok(self.hosting.server_info(&api_key, &server.id).await?)
    }

    async fn require_api_key(&self) -> BotResult<String> {
        self.api_key()
            .await?
            .filter(|key| !key.is_empty())
            .ok_or(BotError::EmptyApiKey)
    }

    async fn resolve(&self, index: usize) -> BotResult<(String, ServerInfo)> {
        let api_key = self.require_api_key().await?;
        let server = self
            .hosting
            .list_servers(&api_key)
            .await?
            .into_iter()
            .nth(index)
            .ok_or(BotError::ServerNotFound)?;
        Ok((api_key, server))
    }
}
