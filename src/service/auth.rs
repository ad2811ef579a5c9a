//! Operator login, allow-list lookups and chat-session control.

use crate::chat::{ChatIdentity, ChatSession, PairingStream};
use crate::db::{Database, User};
use crate::error::{BotError, BotResult, PairingError};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AuthService {
    db: Database,
    session: Arc<ChatSession>,
}

impl AuthService {
    pub fn new(db: Database, session: Arc<ChatSession>) -> Self {
        Self { db, session }
    }

    /// Check operator credentials.
    pub async fn login(&self, username: &str, password: &str) -> BotResult<User> {
        match self.db.users().verify(username, password).await? {
            Some(user) => {
                info!(user = %user.username, "Operator logged in");
                Ok(user)
            }
            None => {
                warn!(user = %username, "Operator login failed");
                Err(BotError::WrongCredentials)
            }
        }
    }

    pub async fn allowlisted_chats(&self) -> BotResult<Vec<ChatIdentity>> {
        Ok(self.db.allowlist().list().await?)
    }

    pub async fn is_allowlisted(&self, chat: &ChatIdentity) -> BotResult<bool> {
        Ok(self.db.allowlist().contains(chat).await?)
    }

    /// Resume or pair the chat account. See [`ChatSession::login`].
    pub async fn chat_login(&self) -> Result<Option<PairingStream>, PairingError> {
        self.session.login().await
    }

    pub async fn chat_logout(&self) -> BotResult<()> {
        self.session.logout().await?;
        info!("Chat account logged out");
        Ok(())
    }

    pub fn chat_is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn phone_number(&self) -> Option<String> {
        self.session.phone_number()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::LoopbackClient;

    async fn service() -> (Database, AuthService) {
        let db = Database::new(":memory:").await.unwrap();
        let me = ChatIdentity::new("6281234", "s.whatsapp.net");
        let client = Arc::new(LoopbackClient::paired(me, None));
        let session = Arc::new(ChatSession::new(client));
        (db.clone(), AuthService::new(db, session))
    }

    #[tokio::test]
    async fn wrong_password_is_wrong_credentials() {
        let (db, auth) = service().await;
        db.users().create("admin", "admin").await.unwrap();

        assert_eq!(auth.login("admin", "admin").await.unwrap().username, "admin");
        assert!(matches!(
            auth.login("admin", "nope").await,
            Err(BotError::WrongCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "admin").await,
            Err(BotError::WrongCredentials)
        ));
    }

    #[tokio::test]
    async fn allowlist_lookup_matches_exact_identity() {
        let (db, auth) = service().await;
        let group = ChatIdentity::new("120363", "g.us");
        db.allowlist().insert(&group).await.unwrap();

        assert!(auth.is_allowlisted(&group).await.unwrap());
        assert!(!auth.is_allowlisted(&ChatIdentity::new("120364", "g.us")).await.unwrap());
        assert_eq!(auth.allowlisted_chats().await.unwrap(), vec![group]);
    }

    #[tokio::test]
    async fn chat_session_control() {
        let (_db, auth) = service().await;
        assert!(!auth.chat_is_logged_in());

        assert!(auth.chat_login().await.unwrap().is_none());
        assert!(auth.chat_is_logged_in());
        assert_eq!(auth.phone_number().as_deref(), Some("6281234"));

        auth.chat_logout().await.unwrap();
        assert!(!auth.chat_is_logged_in());
        assert_eq!(auth.phone_number(), None);
    }
}
