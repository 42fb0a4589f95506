use crate::{AppState, gate::LOGIN_ROUTE, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session. The login page lives here; it must never be
/// gated or a failed check would redirect to itself.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(handlers::health))
        // GET /config
        // Public runtime config (the API base the browser should talk to).
        .route("/config", get(handlers::get_public_config))
        // GET /login
        // The redirect target of the session gate.
        .route(LOGIN_ROUTE, get(handlers::serve_shell))
}
