use reqwest::Url;
use std::{env, path::PathBuf};

use crate::{error::ConfigError, gate::ExecutionContext, gate::LOGIN_ROUTE};

/// Fallback for `API_BASE`, matching the API server's local development address.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_GATED_ROUTES: &str = "/my-posts,/submit,/profile";

// Paths the host serves itself; a gated route may not shadow them.
const RESERVED_ROUTES: &[&str] = &[
    LOGIN_ROUTE,
    "/health",
    "/config",
    "/session",
    "/swagger-ui",
    "/api-docs",
];

/// AppConfig
///
/// Holds the host's entire configuration. Immutable once loaded and pulled into handlers
/// and middleware through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects the log format.
    pub env: Env,
    // Public base address of the API host (`apiBase`). The identity endpoint is `<api_base>/me`.
    pub api_base: String,
    // Whether the host's own render pass can see the session cookie.
    pub render_mode: RenderMode,
    pub bind_addr: String,
    // The built frontend (must contain index.html).
    pub dist_dir: PathBuf,
    // Route prefixes guarded by the session gate.
    pub gated_routes: Vec<String>,
}

/// Env
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// RenderMode
///
/// - `Ssr`: the host is on a different domain from the API, so the session cookie never
///   reaches it. The server pass of the gate is a no-op and the browser does the check.
/// - `Forward`: the host shares the API's cookie domain. The gate runs on the server and
///   forwards the incoming `Cookie` header to the identity endpoint.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RenderMode {
    Ssr,
    Forward,
}

impl RenderMode {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ssr" => Ok(RenderMode::Ssr),
            "forward" => Ok(RenderMode::Forward),
            _ => Err(ConfigError::InvalidRenderMode(raw.to_string())),
        }
    }
}

impl Default for AppConfig {
    /// Safe values for test setup; no environment variables are read.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base: DEFAULT_API_BASE.to_string(),
            render_mode: RenderMode::Ssr,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            gated_routes: parse_gated_routes(DEFAULT_GATED_ROUTES).unwrap_or_default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Missing variables fall back to
    /// defaults; present but unusable values are rejected so the host never starts with a
    /// gate pointing at a malformed endpoint.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_base = env::var("API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        if Url::parse(&api_base).is_err() {
            return Err(ConfigError::InvalidApiBase(api_base));
        }

        let render_mode = match env::var("RENDER_MODE") {
            Ok(raw) => RenderMode::parse(&raw)?,
            Err(_) => RenderMode::Ssr,
        };

        let gated_routes = parse_gated_routes(
            &env::var("GATED_ROUTES").unwrap_or_else(|_| DEFAULT_GATED_ROUTES.to_string()),
        )?;

        Ok(Self {
            env,
            api_base,
            render_mode,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            dist_dir: env::var("DIST_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DIST_DIR)),
            gated_routes,
        })
    }

    /// execution_context
    ///
    /// The context the host's middleware hands to the gate.
    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext {
            is_server_render: self.render_mode == RenderMode::Ssr,
            api_base_url: self.api_base.clone(),
        }
    }

    pub fn index_file(&self) -> PathBuf {
        self.dist_dir.join("index.html")
    }
}

/// parse_gated_routes
///
/// Splits a comma-separated route list. Blank entries are ignored, trailing slashes are
/// dropped and duplicates collapse. Routes are literal paths: `{`, `}` and `*` would be
/// read as path parameters by the router and are rejected.
pub fn parse_gated_routes(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut routes: Vec<String> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let route = entry.trim_end_matches('/');
        if !entry.starts_with('/')
            || route.is_empty()
            || route.contains(['{', '}', '*'])
            || is_reserved(route)
        {
            return Err(ConfigError::InvalidGatedRoute(entry.to_string()));
        }
        if !routes.iter().any(|existing| existing == route) {
            routes.push(route.to_string());
        }
    }

    Ok(routes)
}

fn is_reserved(route: &str) -> bool {
    RESERVED_ROUTES.iter().any(|reserved| {
        route == *reserved
            || route
                .strip_prefix(*reserved)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}
