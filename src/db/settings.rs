//! Key/value bot settings.

use super::DbError;
use sqlx::SqlitePool;

/// Settings key holding the game-hosting API key.
pub const API_KEY: &str = "gs_api_key";

/// Repository for settings operations.
pub struct SettingsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SettingsRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let mut tx = self.pool.begin().await?;
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM server_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(value)
    }

    /// Insert or replace `key`.
    pub async fn upsert(&self, key: &str, value: &str) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO server_settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }
}
