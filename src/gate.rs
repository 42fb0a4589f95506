use reqwest::Url;
use uuid::Uuid;

use crate::{
    error::GateError,
    identity::IdentityState,
    models::{CurrentUser, MeResponse},
};

/// The redirect target for every failed session check.
pub const LOGIN_ROUTE: &str = "/login";

/// ExecutionContext
///
/// Describes where the gate is running. It is passed in explicitly so the gate has no
/// hidden dependency on global configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    /// True during a server-side render pass. The API host's session cookie is not
    /// visible there, so the gate steps aside and the browser performs the real check.
    pub is_server_render: bool,
    /// Base address of the API host, e.g. `http://localhost:8000/api`.
    pub api_base_url: String,
}

impl ExecutionContext {
    pub fn client(api_base_url: impl Into<String>) -> Self {
        Self {
            is_server_render: false,
            api_base_url: api_base_url.into(),
        }
    }

    pub fn server_render(api_base_url: impl Into<String>) -> Self {
        Self {
            is_server_render: true,
            api_base_url: api_base_url.into(),
        }
    }

    /// me_url
    ///
    /// Joins `<api_base_url>/me`. A trailing slash on the base is tolerated.
    pub fn me_url(&self) -> Result<Url, GateError> {
        let raw = format!("{}/me", self.api_base_url.trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| GateError::InvalidEndpoint(format!("{raw}: {e}")))
    }
}

/// HistoryMode
///
/// How a navigation lands in the history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Push,
    Replace,
}

/// Navigation
///
/// The in-flight route transition. A fresh value is created for every navigation and
/// the user annotation never outlives it.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    pub id: Uuid,
    pub from: Option<String>,
    pub to: String,
    pub mode: HistoryMode,
    pub current_user: Option<CurrentUser>,
}

impl Navigation {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: None,
            to: to.into(),
            mode: HistoryMode::Push,
            current_user: None,
        }
    }

    pub fn from_route(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_mode(mut self, mode: HistoryMode) -> Self {
        self.mode = mode;
        self
    }
}

/// GateState
///
/// `Checking` is transient; `Allowed` and `Redirected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Checking,
    Allowed,
    Redirected,
}

/// GateOutcome
///
/// The decision for one navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Let the navigation commit. `user` is `None` when the check was skipped.
    Proceed { user: Option<CurrentUser> },
    /// Abandon the navigation and go to `target` instead.
    Redirect { target: String, mode: HistoryMode },
}

impl GateOutcome {
    pub fn to_login() -> Self {
        GateOutcome::Redirect {
            target: LOGIN_ROUTE.to_string(),
            mode: HistoryMode::Replace,
        }
    }

    pub fn state(&self) -> GateState {
        match self {
            GateOutcome::Proceed { .. } => GateState::Allowed,
            GateOutcome::Redirect { .. } => GateState::Redirected,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.state() == GateState::Allowed
    }
}

/// SessionGate
///
/// Runs the authentication check in front of a navigation. Holds no session state of its
/// own: every call fetches `/me` again and the result is dropped once the decision is made.
#[derive(Clone)]
pub struct SessionGate {
    identity: IdentityState,
}

impl SessionGate {
    pub fn new(identity: IdentityState) -> Self {
        Self { identity }
    }

    /// check
    ///
    /// Decides a single navigation. Fails closed: any error, a `null` body, or anything
    /// other than `authenticated: true` redirects to the login route. There is no retry.
    pub async fn check(&self, ctx: &ExecutionContext, cookies: Option<&str>) -> GateOutcome {
        if ctx.is_server_render {
            return GateOutcome::Proceed { user: None };
        }

        match self.fetch(ctx, cookies).await {
            Ok(Some(session)) if session.is_authenticated() => GateOutcome::Proceed {
                user: Some(session.current_user()),
            },
            Ok(_) => {
                tracing::debug!("session not authenticated");
                GateOutcome::to_login()
            }
            Err(e) => {
                tracing::warn!(error = %e, "session check failed");
                GateOutcome::to_login()
            }
        }
    }

    /// guard
    ///
    /// Runs `check` for `navigation` and, when allowed, attaches the derived user to it.
    pub async fn guard(
        &self,
        ctx: &ExecutionContext,
        navigation: &mut Navigation,
        cookies: Option<&str>,
    ) -> GateOutcome {
        tracing::debug!(
            navigation = %navigation.id,
            to = %navigation.to,
            state = ?GateState::Checking,
            "guarding navigation"
        );

        let outcome = self.check(ctx, cookies).await;

        if let GateOutcome::Proceed { user } = &outcome {
            navigation.current_user = user.clone();
        }

        tracing::debug!(
            navigation = %navigation.id,
            state = ?outcome.state(),
            "navigation resolved"
        );

        outcome
    }

    async fn fetch(
        &self,
        ctx: &ExecutionContext,
        cookies: Option<&str>,
    ) -> Result<Option<MeResponse>, GateError> {
        let me_url = ctx.me_url()?;
        self.identity.fetch_session(&me_url, cookies).await
    }
}
