//! Handler and middleware types, and chain composition.

use super::context::Context;
use crate::error::{BotError, BotResult};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// A route handler.
pub type Handler = Arc<dyn Fn(Context) -> BoxFuture<'static, BotResult<()>> + Send + Sync>;

/// Wraps a handler. Short-circuits by returning an error instead of calling
/// the inner handler.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Receives every error a dispatched handler returns.
pub type ErrorHandler = Arc<dyn Fn(Context, BotError) -> BoxFuture<'static, ()> + Send + Sync>;

/// Box an async function as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BotResult<()>> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// Box a handler transformer as a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn error_handler<F, Fut>(f: F) -> ErrorHandler
where
    F: Fn(Context, BotError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx, err| f(ctx, err).boxed())
}

/// Wrap `handler` so that `chain[0]` runs first (outermost).
pub fn compose(handler: Handler, chain: &[Middleware]) -> Handler {
    chain.iter().rev().fold(handler, |inner, mw| mw(inner))
}
