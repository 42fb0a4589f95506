use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Gated Router Module
///
/// Routes that only render after the session gate allows the request. The router built
/// here is wrapped by `session_gate_middleware` in `create_router`.
pub fn gated_routes(routes: &[String]) -> Router<AppState> {
    let mut router = Router::<AppState>::new()
        // GET /session
        // The user annotation attached by the gate, for pages that need the current user
        // without a second /me round trip.
        .route("/session", get(handlers::get_session));

    // Each configured prefix guards itself and everything below it.
    for route in routes {
        router = router
            .route(route, get(handlers::serve_shell))
            .route(&format!("{route}/{{*rest}}"), get(handlers::serve_shell));
    }

    router
}
