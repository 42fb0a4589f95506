use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use recipe_gate::{
    error::GateError,
    gate::{ExecutionContext, GateOutcome, LOGIN_ROUTE, SessionGate},
    identity::{HttpIdentityClient, IdentityService},
    models::CurrentUser,
};
use reqwest::{Url, cookie::Jar};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

// --- Fake Identity Backend ---

/// Authenticates only requests carrying `session=valid`.
async fn me(headers: HeaderMap) -> impl IntoResponse {
    let has_session = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookies| cookies.contains("session=valid"));

    if has_session {
        Json(json!({ "authenticated": true, "user_id": 7, "username": "alice" }))
    } else {
        Json(json!({ "authenticated": false }))
    }
}

/// Like `me`, but hands out a fresh session cookie with every authenticated answer.
async fn refresh(headers: HeaderMap) -> axum::response::Response {
    let has_session = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookies| cookies.contains("session=valid"));

    if has_session {
        (
            [(header::SET_COOKIE, "session=valid; Path=/; HttpOnly")],
            Json(json!({ "authenticated": true, "user_id": 7 })),
        )
            .into_response()
    } else {
        Json(json!({ "authenticated": false })).into_response()
    }
}

async fn spawn_identity_backend() -> String {
    let router = Router::new()
        .route("/api/me", get(me))
        .route("/refresh/me", get(refresh))
        .route(
            "/big/me",
            get(|| async {
                Json(json!({ "authenticated": true, "user_id": 3_000_000_000_i64, "username": "big" }))
            }),
        )
        .route(
            "/odd/me",
            get(|| async {
                Json(json!({ "authenticated": true, "user_id": 7, "points": 12.5, "admin": "no" }))
            }),
        )
        .route("/broken/me", get(|| async { "<html>not json</html>" }))
        .route("/null/me", get(|| async { Json(serde_json::Value::Null) }))
        .route(
            "/down/me",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

/// An address nothing listens on.
async fn unreachable_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api", port)
}

fn me_url(base: &str) -> Url {
    ExecutionContext::client(base).me_url().unwrap()
}

// --- Client Tests ---

#[tokio::test]
async fn test_client_forwards_cookie_header() {
    let address = spawn_identity_backend().await;
    let client = HttpIdentityClient::new().unwrap();

    let session = client
        .fetch_session(&me_url(&format!("{}/api", address)), Some("session=valid"))
        .await
        .unwrap()
        .unwrap();

    assert!(session.is_authenticated());
    assert_eq!(session.user_id, Some(7));
    assert_eq!(session.username.as_deref(), Some("alice"));
    assert_eq!(session.email, None);
}

#[tokio::test]
async fn test_client_sends_cookies_from_jar() {
    let address = spawn_identity_backend().await;
    let jar = Arc::new(Jar::default());
    let origin: Url = address.parse().unwrap();
    jar.add_cookie_str("session=valid; Path=/", &origin);
    let client = HttpIdentityClient::with_jar(jar).unwrap();

    let session = client
        .fetch_session(&me_url(&format!("{}/api", address)), None)
        .await
        .unwrap()
        .unwrap();

    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_client_without_credentials_is_unauthenticated() {
    let address = spawn_identity_backend().await;
    let client = HttpIdentityClient::new().unwrap();

    let session = client
        .fetch_session(&me_url(&format!("{}/api", address)), None)
        .await
        .unwrap()
        .unwrap();

    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_stateless_client_ignores_set_cookie() {
    let address = spawn_identity_backend().await;
    let client = HttpIdentityClient::new().unwrap();
    let url = me_url(&format!("{}/refresh", address));

    assert!(client.jar().is_none());

    let first = client
        .fetch_session(&url, Some("session=valid"))
        .await
        .unwrap()
        .unwrap();
    let second = client.fetch_session(&url, None).await.unwrap().unwrap();

    assert!(first.is_authenticated());
    // The refreshed cookie from the first answer is not replayed.
    assert!(!second.is_authenticated());
}

#[tokio::test]
async fn test_client_rejects_non_success_status() {
    let address = spawn_identity_backend().await;
    let client = HttpIdentityClient::new().unwrap();

    let result = client
        .fetch_session(&me_url(&format!("{}/down", address)), None)
        .await;

    match result {
        Err(GateError::UnexpectedStatus(status)) => {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
        }
        other => panic!("expected an unexpected-status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_rejects_malformed_body() {
    let address = spawn_identity_backend().await;
    let client = HttpIdentityClient::new().unwrap();

    let result = client
        .fetch_session(&me_url(&format!("{}/broken", address)), None)
        .await;

    assert!(matches!(result, Err(GateError::MalformedBody(_))));
}

#[tokio::test]
async fn test_client_maps_null_body_to_none() {
    let address = spawn_identity_backend().await;
    let client = HttpIdentityClient::new().unwrap();

    let result = client
        .fetch_session(&me_url(&format!("{}/null", address)), None)
        .await
        .unwrap();

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_client_reports_transport_failure() {
    let client = HttpIdentityClient::new().unwrap();

    let result = client
        .fetch_session(&me_url(&unreachable_base().await), None)
        .await;

    assert!(matches!(result, Err(GateError::Transport(_))));
}

// --- Gate over HTTP ---

#[tokio::test]
async fn test_gate_scenario_authenticated_alice() {
    let address = spawn_identity_backend().await;
    let gate = SessionGate::new(Arc::new(HttpIdentityClient::new().unwrap()));

    let outcome = gate
        .check(
            &ExecutionContext::client(format!("{}/api", address)),
            Some("session=valid"),
        )
        .await;

    assert_eq!(
        outcome,
        GateOutcome::Proceed {
            user: Some(CurrentUser {
                id: Some(7),
                username: Some("alice".to_string()),
                email: None,
            })
        }
    );
}

#[tokio::test]
async fn test_gate_scenario_unauthenticated() {
    let address = spawn_identity_backend().await;
    let gate = SessionGate::new(Arc::new(HttpIdentityClient::new().unwrap()));

    let outcome = gate
        .check(&ExecutionContext::client(format!("{}/api", address)), None)
        .await;

    assert_eq!(outcome, GateOutcome::to_login());
}

#[tokio::test]
async fn test_gate_scenario_network_error() {
    let gate = SessionGate::new(Arc::new(HttpIdentityClient::new().unwrap()));

    let outcome = gate
        .check(&ExecutionContext::client(unreachable_base().await), None)
        .await;

    match outcome {
        GateOutcome::Redirect { target, .. } => assert_eq!(target, LOGIN_ROUTE),
        other => panic!("expected a redirect, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gate_accepts_id_beyond_32_bits() {
    let address = spawn_identity_backend().await;
    let gate = SessionGate::new(Arc::new(HttpIdentityClient::new().unwrap()));

    let outcome = gate
        .check(&ExecutionContext::client(format!("{}/big", address)), None)
        .await;

    assert_eq!(
        outcome,
        GateOutcome::Proceed {
            user: Some(CurrentUser {
                id: Some(3_000_000_000),
                username: Some("big".to_string()),
                email: None,
            })
        }
    );
}

#[tokio::test]
async fn test_gate_ignores_odd_values_in_fields_it_does_not_read() {
    let address = spawn_identity_backend().await;
    let gate = SessionGate::new(Arc::new(HttpIdentityClient::new().unwrap()));

    let outcome = gate
        .check(&ExecutionContext::client(format!("{}/odd", address)), None)
        .await;

    assert!(outcome.is_allowed());
}
