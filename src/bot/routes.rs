//! Route table.

use crate::commands::{Registry, parse_index};
use crate::error::BotResult;
use crate::router::{Context, Handler, Router, handler};
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry commands reachable from the chat.
pub const COMMAND_ROUTES: [&str; 5] = ["help", "servers", "start", "stop", "info"];

/// Register every route on `router`.
pub fn load_routes(router: &mut Router, registry: Arc<Registry>) {
    for name in COMMAND_ROUTES {
        router.register(
            &format!("/{name}"),
            command_route(Arc::clone(&registry), name),
            vec![],
        );
    }
    router.register("/players", handler(players), vec![]);
}

fn command_route(registry: Arc<Registry>, name: &'static str) -> Handler {
    handler(move |ctx| run_command(Arc::clone(&registry), name, ctx))
}

/// Send the command's text, then its follow-up once that resolves.
async fn run_command(registry: Arc<Registry>, name: &'static str, ctx: Context) -> BotResult<()> {
    let output = registry.execute(name, &ctx.args).await?;
    ctx.reply(&output.text).await?;

    if let Some(follow_up) = output.follow_up {
        tokio::spawn(async move {
            let text = follow_up.await;
            if let Err(e) = ctx.reply(&text).await {
                warn!(command = name, chat = %ctx.chat, error = %e, "Failed to send follow-up");
            }
        });
    }
    Ok(())
}

/// Player listing is not offered yet; only the argument is checked.
async fn players(ctx: Context) -> BotResult<()> {
    let index = parse_index(&ctx.args)?;
    debug!(index, chat = %ctx.chat, "Players requested");
    Ok(())
}
