//! Gates in front of every route.

use crate::error::{BotError, BotResult};
use crate::router::{Context, Handler, Middleware, handler, middleware};
use crate::service::{AuthService, ServerSettingsService};
use std::sync::Arc;
use tracing::debug;

/// Rejects the message unless a hosting API key is stored and the provider
/// accepts it.
pub fn valid_api_key(settings: Arc<ServerSettingsService>) -> Middleware {
    middleware(move |next: Handler| {
        let settings = Arc::clone(&settings);
        handler(move |ctx| {
            let settings = Arc::clone(&settings);
            let next = Arc::clone(&next);
            async move {
                check_api_key(&settings).await?;
                next(ctx).await
            }
        })
    })
}

/// Rejects the message unless its chat is allow-listed.
pub fn allowlisted_chat(auth: Arc<AuthService>) -> Middleware {
    middleware(move |next: Handler| {
        let auth = Arc::clone(&auth);
        handler(move |ctx| {
            let auth = Arc::clone(&auth);
            let next = Arc::clone(&next);
            async move {
                check_allowlisted(&auth, &ctx).await?;
                next(ctx).await
            }
        })
    })
}

async fn check_api_key(settings: &ServerSettingsService) -> BotResult<()> {
    let api_key = settings
        .api_key()
        .await?
        .filter(|key| !key.is_empty())
        .ok_or(BotError::EmptyApiKey)?;
    settings.validate_api_key(&api_key).await?;
    Ok(())
}

async fn check_allowlisted(auth: &AuthService, ctx: &Context) -> BotResult<()> {
    if auth.is_allowlisted(&ctx.chat).await? {
        return Ok(());
    }
    debug!(chat = %ctx.chat, sender = %ctx.sender, "Chat not allow-listed");
    Err(BotError::ChatNotAllowlisted)
}
