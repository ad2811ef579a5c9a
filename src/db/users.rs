//! Operator credentials.

use super::DbError;
use sqlx::SqlitePool;
use std::sync::OnceLock;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: i64,
}

pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_name(&self, username: &str) -> Result<Option<User>, DbError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT id, username, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.map(|(id, username, created_at)| User {
            id,
            username,
            created_at,
        }))
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let mut tx = self.pool.begin().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(count)
    }

    /// Create a user with a bcrypt-hashed password.
    pub async fn create(&self, username: &str, password: &str) -> Result<User, DbError> {
        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(&password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::UserExists(username.to_string());
            }
            DbError::from(e)
        })?;
        tx.commit().await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            created_at: now,
        })
    }

    /// Check credentials. `None` for an unknown user or a wrong password.
    pub async fn verify(&self, username: &str, password: &str) -> Result<Option<User>, DbError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, (i64, String, String, i64)>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        let Some((id, username, password_hash, created_at)) = row else {
            // Spend the same time as a real check so the reply does not
            // reveal whether the user exists.
            dummy_password_verify(password);
            return Ok(None);
        };

        if !bcrypt::verify(password, &password_hash).unwrap_or(false) {
            return Ok(None);
        }

        Ok(Some(User {
            id,
            username,
            created_at,
        }))
    }

    /// Create the initial operator when no user exists yet.
    ///
    /// Returns whether a user was created.
    pub async fn seed_admin(&self, username: &str, password: &str) -> Result<bool, DbError> {
        if self.count().await? > 0 {
            return Ok(false);
        }
        match self.create(username, password).await {
            Ok(_) => Ok(true),
            Err(DbError::UserExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn hash_password(password: &str) -> Result<String, DbError> {
    bcrypt::hash(password, HASH_COST).map_err(|e| DbError::Hash(e.to_string()))
}

fn dummy_password_verify(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    if let Some(hash) = DUMMY_HASH
        .get_or_init(|| bcrypt::hash("dummy-password", HASH_COST).ok())
        .as_deref()
    {
        let _ = bcrypt::verify(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, DbError};

    #[tokio::test]
    async fn create_and_verify() {
        let db = Database::new(":memory:").await.unwrap();
        let users = db.users();

        let created = users.create("admin", "hunter2").await.unwrap();
        assert_eq!(created.username, "admin");

        let found = users.verify("admin", "hunter2").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(created.id));
        assert!(users.verify("admin", "wrong").await.unwrap().is_none());
        assert!(users.verify("ghost", "hunter2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let db = Database::new(":memory:").await.unwrap();
        db.users().create("admin", "a").await.unwrap();
        let err = db.users().create("admin", "b").await.unwrap_err();
        assert!(matches!(err, DbError::UserExists(name) if name == "admin"));
    }

    #[tokio::test]
    async fn seed_admin_only_on_empty_table() {
        let db = Database::new(":memory:").await.unwrap();
        let users = db.users();

        assert!(users.seed_admin("admin", "admin").await.unwrap());
        assert!(!users.seed_admin("root", "root").await.unwrap());
        assert!(users.find_by_name("root").await.unwrap().is_none());
        assert_eq!(users.count().await.unwrap(), 1);
    }
}
