use recipe_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    identity::{HttpIdentityClient, IdentityState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point for the frontend host: configuration, logging, the identity client and
/// the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail fast on unusable values)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "recipe_gate=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Host starting in {:?} mode", config.env);
    tracing::info!(
        api_base = %config.api_base,
        render_mode = ?config.render_mode,
        gated_routes = ?config.gated_routes,
        "Session gate configured"
    );

    // 4. Identity Client
    let identity = Arc::new(
        HttpIdentityClient::new().expect("FATAL: failed to build the identity HTTP client"),
    ) as IdentityState;

    // 5. Router and Server Startup
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(identity, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind BIND_ADDR");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server terminated unexpectedly");
}
