//! Allow-list administration and joined-group listing.

use crate::chat::{ChatIdentity, ChatSession, GroupInfo};
use crate::db::Database;
use crate::error::BotResult;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

pub struct ChatAdminService {
    db: Database,
    session: Arc<ChatSession>,
}

impl ChatAdminService {
    pub fn new(db: Database, session: Arc<ChatSession>) -> Self {
        Self { db, session }
    }

    pub async fn allowlist(&self, chat: &ChatIdentity) -> BotResult<()> {
        self.db.allowlist().insert(chat).await?;
        info!(chat = %chat, "Chat allow-listed");
        Ok(())
    }

    /// Returns whether the chat was listed.
    pub async fn unallowlist(&self, chat: &ChatIdentity) -> BotResult<bool> {
        let removed = self.db.allowlist().delete(chat).await?;
        if removed {
            info!(chat = %chat, "Chat removed from allow-list");
        }
        Ok(removed)
    }

    /// Joined groups, optionally only the allow-listed (`Some(true)`) or
    /// the not allow-listed (`Some(false)`) ones.
    pub async fn groups(&self, allowlisted: Option<bool>) -> BotResult<Vec<GroupInfo>> {
        let groups = self.session.groups().await?;
        let Some(want) = allowlisted else {
            return Ok(groups);
        };

        let listed: HashSet<ChatIdentity> = self.db.allowlist().list().await?.into_iter().collect();
        Ok(groups
            .into_iter()
            .filter(|g| listed.contains(&g.id) == want)
            .collect())
    }
}
