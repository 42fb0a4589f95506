use crate::{
    AppState,
    models::{CurrentUser, PublicRuntimeConfig},
};
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

// --- Handlers ---

/// health
///
/// [Public Route] Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Host is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// get_public_config
///
/// [Public Route] Exposes the public runtime configuration so the browser bundle learns
/// the API base at runtime instead of at build time.
#[utoipa::path(
    get,
    path = "/config",
    responses((status = 200, description = "Public runtime config", body = PublicRuntimeConfig))
)]
pub async fn get_public_config(State(state): State<AppState>) -> Json<PublicRuntimeConfig> {
    Json(PublicRuntimeConfig {
        api_base: state.config.api_base.clone(),
    })
}

/// get_session
///
/// [Gated Route] Returns the user annotation the session gate attached to this request.
///
/// *Note*: When the gate ran as a server-render pass it performed no check and attached
/// nothing, so the answer is 204 and the browser is expected to ask `/me` itself.
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 204, description = "No server-side session check performed"),
        (status = 303, description = "Not authenticated; redirected to /login")
    )
)]
pub async fn get_session(request: Request) -> Response {
    match request.extensions().get::<CurrentUser>() {
        Some(user) => Json(user.clone()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// serve_shell
///
/// Serves the frontend's `index.html`. Gated routes and the login page all resolve to
/// the same shell; the client router takes over from there.
pub async fn serve_shell(State(state): State<AppState>) -> Response {
    let index = state.config.index_file();

    match tokio::fs::read_to_string(&index).await {
        Ok(shell) => Html(shell).into_response(),
        Err(e) => {
            tracing::error!(path = %index.display(), error = %e, "page shell missing");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
