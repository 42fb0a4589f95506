use async_trait::async_trait;
use reqwest::{
    Url,
    cookie::Jar,
    header::{ACCEPT, COOKIE},
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use crate::{error::GateError, models::MeResponse};

// 1. IdentityService Contract
/// IdentityService
///
/// Abstract contract for the external identity endpoint. The gate only ever talks to
/// this trait, so the HTTP client can be swapped for `MockIdentityService` in tests.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Issues one `GET` against `me_url` with credentials included.
    ///
    /// `cookies` is a raw `Cookie` header forwarded from an incoming request. When it is
    /// `None` the implementation sends only credentials it owns itself (a jar-backed
    /// client), or none at all.
    ///
    /// Returns `Ok(None)` when the endpoint answered with a JSON `null` body.
    async fn fetch_session(
        &self,
        me_url: &Url,
        cookies: Option<&str>,
    ) -> Result<Option<MeResponse>, GateError>;
}

// 2. The Real Implementation (reqwest)
/// HttpIdentityClient
///
/// Calls the API host's `/me` endpoint. The API host is cross-origin to the frontend, so
/// the HttpOnly session cookie has to travel with the request.
///
/// - `new()` keeps no cookie state: it sends exactly the `Cookie` header it is handed and
///   ignores any `Set-Cookie` in the answer. This is the only mode a shared host may use,
///   since one client serves every visitor.
/// - `with_jar()` holds credentials in a cookie jar, for a single browser-like client
///   such as a `Navigator`.
///
/// No timeout is set; reqwest's defaults apply.
#[derive(Clone)]
pub struct HttpIdentityClient {
    client: reqwest::Client,
    jar: Option<Arc<Jar>>,
}

impl HttpIdentityClient {
    /// new
    ///
    /// Builds a stateless client that only forwards explicit cookies.
    pub fn new() -> Result<Self, GateError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self { client, jar: None })
    }

    /// with_jar
    ///
    /// Builds a client sharing an existing cookie jar, e.g. one populated by a login flow.
    pub fn with_jar(jar: Arc<Jar>) -> Result<Self, GateError> {
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;

        Ok(Self {
            client,
            jar: Some(jar),
        })
    }

    pub fn jar(&self) -> Option<Arc<Jar>> {
        self.jar.clone()
    }
}

#[async_trait]
impl IdentityService for HttpIdentityClient {
    async fn fetch_session(
        &self,
        me_url: &Url,
        cookies: Option<&str>,
    ) -> Result<Option<MeResponse>, GateError> {
        let mut request = self
            .client
            .get(me_url.clone())
            .header(ACCEPT, "application/json");

        // An explicit Cookie header takes precedence over the jar.
        if let Some(cookies) = cookies {
            request = request.header(COOKIE, cookies);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::UnexpectedStatus(status));
        }

        let body = response.bytes().await?;
        let session = serde_json::from_slice::<Option<MeResponse>>(&body)?;

        Ok(session)
    }
}

// 3. The Mock Implementation (For Tests)
/// MockIdentityService
///
/// Answers every call with a fixed result and records what it was asked, so tests can
/// assert on call counts, the requested URL, and forwarded cookies.
#[derive(Clone, Default)]
pub struct MockIdentityService {
    /// The body returned on success. `None` simulates a JSON `null` body.
    pub session: Option<MeResponse>,
    /// When true, every call fails as if the endpoint were unreachable.
    pub should_fail: bool,
    calls: Arc<AtomicUsize>,
    last_url: Arc<Mutex<Option<String>>>,
    last_cookies: Arc<Mutex<Option<String>>>,
}

impl MockIdentityService {
    pub fn new(session: MeResponse) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    pub fn new_authenticated(user_id: i64, username: &str) -> Self {
        Self::new(MeResponse {
            authenticated: Some(true),
            user_id: Some(user_id),
            username: Some(username.to_string()),
            ..MeResponse::default()
        })
    }

    pub fn new_unauthenticated() -> Self {
        Self::new(MeResponse {
            authenticated: Some(false),
            ..MeResponse::default()
        })
    }

    pub fn new_empty_body() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().ok().and_then(|url| url.clone())
    }

    pub fn last_cookies(&self) -> Option<String> {
        self.last_cookies
            .lock()
            .ok()
            .and_then(|cookies| cookies.clone())
    }
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn fetch_session(
        &self,
        me_url: &Url,
        cookies: Option<&str>,
    ) -> Result<Option<MeResponse>, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut url) = self.last_url.lock() {
            *url = Some(me_url.to_string());
        }
        if let Ok(mut last) = self.last_cookies.lock() {
            *last = cookies.map(str::to_owned);
        }

        if self.should_fail {
            return Err(GateError::Unavailable(
                "Mock Identity Error: Simulation requested".to_string(),
            ));
        }

        Ok(self.session.clone())
    }
}

/// IdentityState
///
/// The shared handle to the identity service held by the gate.
pub type IdentityState = Arc<dyn IdentityService>;
