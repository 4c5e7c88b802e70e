//! The axum middleware in front of a registry router.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Extension;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{Request, StatusCode};
use axum::routing::{any, get};
use axum::{Router, middleware};
use serde_json::Value;
use tower::ServiceExt;

use crate::claims::{Capability, TOKEN_USERNAME, TokenPayload};
use crate::credentials::encode_basic;
use crate::e2e_tests::helpers::{Fixture, TestTokens};
use crate::middleware::{API_VERSION_HEADER, AuthState, require_token};

async fn ping() -> &'static str {
    "{}"
}

async fn whoami(Extension(payload): Extension<TokenPayload>) -> String {
    payload.account_id.unwrap_or_default()
}

fn router(tokens: TestTokens) -> Router {
    let state = AuthState::new(Arc::new(tokens), "test-registry");
    Router::new()
        .route("/v2/", get(ping))
        .route("/v2/{*rest}", any(whoami))
        .layer(middleware::from_fn_with_state(
            state,
            require_token::<TestTokens>,
        ))
}

fn request(method: &str, path: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(Body::empty()).expect("build request")
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}

#[tokio::test]
async fn test_verified_request_reaches_handler_with_payload() {
    let fixture = Fixture::new();
    let token = fixture.issue(&[Capability::Pull], &["teamA"], None, Some("acct-9"));
    let credentials = encode_basic(TOKEN_USERNAME, &token);

    let response = router(fixture.tokens)
        .oneshot(request(
            "GET",
            "/v2/teamA/manifests/latest",
            Some(credentials.as_str()),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "acct-9");
}

#[tokio::test]
async fn test_missing_credentials_get_challenge() {
    let fixture = Fixture::new();

    let response = router(fixture.tokens)
        .oneshot(request("GET", "/v2/", None))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok()),
        Some("Basic realm=\"test-registry\"")
    );
    assert_eq!(
        response
            .headers()
            .get(API_VERSION_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("registry/2.0")
    );
}

#[tokio::test]
async fn test_denials_are_indistinguishable() {
    let fixture = Fixture::new();
    let pull_only = fixture.issue(&[Capability::Pull], &["teamA"], None, None);
    let pull_only = encode_basic(TOKEN_USERNAME, &pull_only);
    let expired = fixture.issue(&[Capability::Pull], &[], Some(0.0), None);
    let expired = encode_basic(TOKEN_USERNAME, &expired);
    let garbage = encode_basic(TOKEN_USERNAME, "a.b.c");

    let app = router(fixture.tokens);
    let cases = [
        request("GET", "/v2/teamB/manifests/1", Some(pull_only.as_str())),
        request("PUT", "/v2/teamA/manifests/1", Some(pull_only.as_str())),
        request("GET", "/v2/teamA/manifests/1", Some(expired.as_str())),
        request("GET", "/v2/teamA/manifests/1", Some(garbage.as_str())),
        request("GET", "/v2/teamA/manifests/1", Some("Bearer nope")),
    ];

    let mut bodies = Vec::new();
    for case in cases {
        let response = app.clone().oneshot(case).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(body_string(response).await);
    }

    let first: Value = serde_json::from_str(&bodies[0]).expect("body is JSON");
    assert_eq!(first["errors"][0]["code"], "UNAUTHORIZED");
    assert!(bodies.iter().all(|body| body == &bodies[0]));
}

#[tokio::test]
async fn test_ping_through_middleware() {
    let fixture = Fixture::new();
    let token = fixture.issue(&[Capability::Push], &["teamA"], None, None);
    let credentials = encode_basic(TOKEN_USERNAME, &token);

    let response = router(fixture.tokens)
        .oneshot(request("GET", "/v2/", Some(credentials.as_str())))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "{}");
}
