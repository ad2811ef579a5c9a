//! Route error translation.

use crate::error::BotError;
use crate::router::{Context, ErrorHandler, error_handler};
use tracing::warn;

/// Error handler that answers user-facing errors in the chat and logs the
/// rest.
pub fn translator() -> ErrorHandler {
    error_handler(|ctx, err| async move { translate(&ctx, &err).await })
}

pub async fn translate(ctx: &Context, err: &BotError) {
    let Some(text) = err.user_reply() else {
        warn!(
            command = %ctx.command,
            chat = %ctx.chat,
            error = %err,
            "Unhandled command error"
        );
        return;
    };

    if let Err(e) = ctx.reply(text).await {
        warn!(chat = %ctx.chat, error = %e, "Failed to send error reply");
    }
}
