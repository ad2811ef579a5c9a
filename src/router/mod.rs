//! Event router.
//!
//! Turns inbound chat messages into route invocations. A message is only
//! dispatched when the session has finished its offline sync, the first
//! token mentions the bot, and the second token names a registered route:
//!
//! ```text
//! @6281234 /start 0
//! ```
//!
//! Every dispatch runs on its own task inside a `bot.command` span, so a
//! slow route never blocks event delivery.

pub mod context;
pub mod middleware;

pub use context::Context;
pub use middleware::{
    ErrorHandler, Handler, Middleware, compose, error_handler, handler, middleware,
};

use crate::chat::{ChatEvent, ChatSession, HandlerId};
use crate::error::{BotError, BotResult};
use crate::telemetry::CommandTimer;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{Instrument, debug, debug_span, warn};

/// Outcome of matching one event against the route table.
pub(crate) enum Dispatch {
    Ignore,
    Run(Handler, Context),
    Fail(Context, BotError),
}

pub struct Router {
    session: Arc<ChatSession>,
    routes: HashMap<String, Handler>,
    middlewares: Vec<Middleware>,
    error_handler: Option<ErrorHandler>,
    subscription: Mutex<Option<HandlerId>>,
}

impl Router {
    pub fn new(session: Arc<ChatSession>) -> Self {
        Self {
            session,
            routes: HashMap::new(),
            middlewares: Vec::new(),
            error_handler: None,
            subscription: Mutex::new(None),
        }
    }

    /// Append a global middleware. Applies to routes registered afterwards.
    pub fn use_middleware(&mut self, mw: Middleware) {
        self.middlewares.push(mw);
    }

    /// Register `route` (including its leading slash).
    ///
    /// Global middlewares run first, then `route_mws` in order. Registering
    /// the same route twice replaces the earlier handler.
    pub fn register(&mut self, route: &str, handler: Handler, route_mws: Vec<Middleware>) {
        let chain: Vec<Middleware> = self
            .middlewares
            .iter()
            .cloned()
            .chain(route_mws)
            .collect();
        if self
            .routes
            .insert(route.to_string(), compose(handler, &chain))
            .is_some()
        {
            debug!(route, "Route replaced");
        }
    }

    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = Some(handler);
    }

    pub fn has_route(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    pub fn session(&self) -> &Arc<ChatSession> {
        &self.session
    }

    /// Subscribe to the session's events. Calling it again while running is a
    /// no-op.
    ///
    /// Must be called from inside a tokio runtime; dispatches are spawned
    /// onto it.
    pub fn run(self: &Arc<Self>) -> BotResult<()> {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return Ok(());
        }

        let runtime = Handle::try_current()
            .map_err(|e| BotError::Internal(format!("router needs a tokio runtime: {e}")))?;
        let router: Weak<Self> = Arc::downgrade(self);

        let id = self.session.subscribe(Arc::new(move |evt| {
            let Some(router) = router.upgrade() else {
                return;
            };
            match router.route(&evt) {
                Dispatch::Ignore => {}
                Dispatch::Run(handler, ctx) => {
                    runtime.spawn(async move { router.dispatch(handler, ctx).await });
                }
                Dispatch::Fail(ctx, err) => {
                    runtime.spawn(async move { router.handle_error(ctx, err).await });
                }
            }
        }));
        *subscription = Some(id);
        debug!(handler = id, "Router subscribed");
        Ok(())
    }

    /// Unsubscribe. In-flight dispatches keep running.
    pub fn stop(&self) {
        if let Some(id) = self.subscription.lock().take() {
            self.session.unsubscribe(id);
            debug!(handler = id, "Router unsubscribed");
        }
    }

    pub fn is_running(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Route `evt` and run the matched handler to completion on the calling
    /// task.
    pub async fn handle_event(&self, evt: &ChatEvent) {
        match self.route(evt) {
            Dispatch::Ignore => {}
            Dispatch::Run(handler, ctx) => self.dispatch(handler, ctx).await,
            Dispatch::Fail(ctx, err) => self.handle_error(ctx, err).await,
        }
    }

    pub(crate) fn route(&self, evt: &ChatEvent) -> Dispatch {
        if !self.session.is_sync_complete() {
            return Dispatch::Ignore;
        }
        let ChatEvent::Message(msg) = evt else {
            return Dispatch::Ignore;
        };
        let Some(text) = msg.text() else {
            return Dispatch::Ignore;
        };

        let tokens: Vec<&str> = text.split_whitespace().collect();
        let [tag, command, rest @ ..] = tokens.as_slice() else {
            return Dispatch::Ignore;
        };

        let ctx = Context::new(
            text,
            *command,
            rest.iter().map(|s| s.to_string()).collect(),
            msg.info.sender.clone(),
            msg.info.chat.clone(),
            Arc::clone(&self.session),
        );

        match self.mentions_self(tag) {
            Ok(true) => {}
            Ok(false) => return Dispatch::Ignore,
            Err(e) => return Dispatch::Fail(ctx, e),
        }

        if !command.starts_with('/') {
            return Dispatch::Ignore;
        }
        match self.routes.get(*command) {
            Some(handler) => Dispatch::Run(Arc::clone(handler), ctx),
            None => Dispatch::Ignore,
        }
    }

    /// Whether `tag` mentions the bot.
    ///
    /// The alternate identity is checked first; the phone number is the
    /// fallback and must be known.
    fn mentions_self(&self, tag: &str) -> BotResult<bool> {
        if let Some(alt) = self.session.alternate_identity()
            && !alt.user.is_empty()
            && tag.contains(alt.user.as_str())
        {
            return Ok(true);
        }

        let phone = self
            .session
            .phone_number()
            .filter(|p| !p.is_empty())
            .ok_or(BotError::SelfIdentityUnavailable)?;
        Ok(tag.contains(phone.as_str()))
    }

    async fn dispatch(&self, handler: Handler, ctx: Context) {
        let command = ctx.command.clone();
        let span = debug_span!(
            "bot.command",
            command = %command,
            chat = %ctx.chat,
            sender = %ctx.sender,
            args = ctx.args.len(),
        );

        let _timer = CommandTimer::new(command.as_str());
        let result = handler(ctx.clone()).instrument(span).await;

        if let Err(e) = result {
            crate::metrics::record_command_error(&command, e.error_code());
            debug!(command = %command, error = %e, "Command error");
            self.handle_error(ctx, e).await;
        }
    }

    async fn handle_error(&self, ctx: Context, err: BotError) {
        match &self.error_handler {
            Some(on_error) => on_error(ctx, err).await,
            None => warn!(command = %ctx.command, error = %err, "Unhandled route error"),
        }
    }
}
