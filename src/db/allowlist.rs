//! Chats allowed to issue bot commands.

use super::DbError;
use crate::chat::ChatIdentity;
use sqlx::SqlitePool;

pub struct AllowlistRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AllowlistRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Every allow-listed chat, ordered by identity.
    pub async fn list(&self) -> Result<Vec<ChatIdentity>, DbError> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT user, server FROM allowlisted_chats ORDER BY server, user",
        )
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|(user, server)| ChatIdentity::new(user, server))
            .collect())
    }

    pub async fn contains(&self, chat: &ChatIdentity) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM allowlisted_chats WHERE user = ? AND server = ?",
        )
        .bind(&chat.user)
        .bind(&chat.server)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(found.is_some())
    }

    /// Add `chat`. Adding an already listed chat is a no-op.
    pub async fn insert(&self, chat: &ChatIdentity) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT OR IGNORE INTO allowlisted_chats (user, server, added_at) VALUES (?, ?, ?)",
        )
        .bind(&chat.user)
        .bind(&chat.server)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Remove `chat`. Returns whether it was listed.
    pub async fn delete(&self, chat: &ChatIdentity) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM allowlisted_chats WHERE user = ? AND server = ?")
            .bind(&chat.user)
            .bind(&chat.server)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
