//! The chat bot: gates, routes and error replies wired onto a [`Router`].

pub mod errors;
pub mod middleware;
pub mod routes;

pub use errors::translator;
pub use middleware::{allowlisted_chat, valid_api_key};
pub use routes::load_routes;

use crate::chat::ChatSession;
use crate::commands::Registry;
use crate::router::Router;
use crate::service::{AuthService, ServerSettingsService};
use std::sync::Arc;

/// Router with the API key gate outermost, then the allow-list gate, then
/// every route.
pub fn build_router(
    session: Arc<ChatSession>,
    registry: Arc<Registry>,
    settings: Arc<ServerSettingsService>,
    auth: Arc<AuthService>,
) -> Router {
    let mut router = Router::new(session);
    router.use_middleware(valid_api_key(settings));
    router.use_middleware(allowlisted_chat(auth));
    router.set_error_handler(translator());
    load_routes(&mut router, registry);
    router
}
