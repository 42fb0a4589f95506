use axum::{
    extract::{FromRef, Request, State},
    http::{HeaderName, header},
    Router,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// The session gate and the services it depends on.
pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod models;
pub mod navigation;

// HTTP host: handlers and access-segregated routers.
pub mod handlers;
pub mod routes;
use routes::{gated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use gate::{ExecutionContext, GateOutcome, HistoryMode, Navigation, SessionGate};
pub use identity::{HttpIdentityClient, IdentityState, MockIdentityService};
pub use navigation::{NavigationResult, Navigator, RouteTable};

/// ApiDoc
///
/// OpenAPI document for the host's own endpoints, plus the API payload schemas the
/// frontend consumes. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::get_public_config, handlers::get_session),
    components(
        schemas(
            models::MeResponse, models::CurrentUser, models::PublicRuntimeConfig,
            models::SearchResponse, models::StreamSearchEvent, models::Recipe,
            models::Post, models::MyPost, models::PostDetail, models::PostsResponse,
            models::RatingResponse,
        )
    ),
    tags(
        (name = "recipe-gate", description = "Recipe site frontend host")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state for every request: the session gate and the loaded config.
#[derive(Clone)]
pub struct AppState {
    pub gate: SessionGate,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(identity: IdentityState, config: AppConfig) -> Self {
        Self {
            gate: SessionGate::new(identity),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionGate {
    fn from_ref(app_state: &AppState) -> SessionGate {
        app_state.gate.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// session_gate_middleware
///
/// Runs the session gate in front of every gated route.
///
/// The request's path becomes the guarded navigation. In `RenderMode::Ssr` the gate is a
/// no-op and the request passes untouched. Otherwise the incoming `Cookie` header is
/// forwarded to the identity endpoint; on success the derived `CurrentUser` is inserted
/// into the request extensions, on any failure the client is sent to `/login`.
async fn session_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = state.config.execution_context();
    let cookies = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let mut navigation = Navigation::new(request.uri().path());

    match state
        .gate
        .guard(&ctx, &mut navigation, cookies.as_deref())
        .await
    {
        GateOutcome::Proceed { .. } => {
            if let Some(user) = navigation.current_user {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        GateOutcome::Redirect { target, mode } => redirect_response(&target, mode),
    }
}

/// redirect_response
///
/// `Replace` maps to 303 See Other (the browser does not keep the rejected request);
/// `Push` maps to 307 Temporary Redirect.
fn redirect_response(target: &str, mode: HistoryMode) -> Response {
    match mode {
        HistoryMode::Replace => Redirect::to(target).into_response(),
        HistoryMode::Push => Redirect::temporary(target).into_response(),
    }
}

/// create_router
///
/// Assembles the host's routing structure, applies the gate and the observability
/// layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // Unknown paths fall through to the built frontend, with index.html as SPA fallback.
    let static_files = ServeDir::new(&state.config.dist_dir)
        .fallback(ServeFile::new(state.config.index_file()));

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            gated::gated_routes(&state.config.gated_routes).route_layer(
                middleware::from_fn_with_state(state.clone(), session_gate_middleware),
            ),
        )
        .fallback_service(static_files)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span, tagged with the `x-request-id` set by the layer above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
