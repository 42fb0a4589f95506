use reqwest::StatusCode;
use thiserror::Error;

/// GateError
///
/// Every way a session check against the identity endpoint can fail. The gate never
/// surfaces these to the user: each variant collapses into the same redirect to the
/// login page. They exist so the cause can be logged.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Invalid identity endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Identity request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Identity endpoint answered {0}")]
    UnexpectedStatus(StatusCode),

    #[error("Malformed session payload: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("Identity service unavailable: {0}")]
    Unavailable(String),
}

/// ConfigError
///
/// Raised by `AppConfig::load` when an environment variable holds a value the host
/// cannot run with.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("RENDER_MODE must be 'ssr' or 'forward', got '{0}'")]
    InvalidRenderMode(String),

    #[error("API_BASE is not an absolute URL: '{0}'")]
    InvalidApiBase(String),

    #[error("Gated route '{0}' must be a literal path starting with '/' and cannot shadow a route the host serves")]
    InvalidGatedRoute(String),
}
