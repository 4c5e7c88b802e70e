//! axum middleware enforcing registry tokens.
//!
//! On success the verified [`TokenPayload`](crate::TokenPayload) is inserted
//! into the request extensions for downstream handlers. On denial the client
//! gets a registry-style 401 that carries no hint of why.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::registry_tokens::Authenticator;
use crate::verification::Verification;

/// Header registries attach to every v2 API response.
pub const API_VERSION_HEADER: &str = "docker-distribution-api-version";

/// State for [`require_token`].
pub struct AuthState<A> {
    authenticator: Arc<A>,
    realm: Arc<str>,
}

// Manual impl: deriving would require `A: Clone`.
impl<A> Clone for AuthState<A> {
    #[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected for shared state
    fn clone(&self) -> Self {
        Self {
            authenticator: Arc::clone(&self.authenticator),
            realm: Arc::clone(&self.realm),
        }
    }
}

impl<A> AuthState<A> {
    pub fn new(authenticator: Arc<A>, realm: impl Into<Arc<str>>) -> Self {
        Self {
            authenticator,
            realm: realm.into(),
        }
    }
}

/// Middleware for `axum::middleware::from_fn_with_state`.
pub async fn require_token<A: Authenticator + 'static>(
    State(state): State<AuthState<A>>,
    mut request: Request,
    next: Next,
) -> Response {
    let verification = state.authenticator.check_credentials(&request);
    match verification {
        Verification::Verified(payload) => {
            request.extensions_mut().insert(payload);
            next.run(request).await
        }
        Verification::Denied => unauthorized(&state.realm),
    }
}

/// Registry-style 401 response.
#[must_use]
pub fn unauthorized(realm: &str) -> Response {
    let challenge = HeaderValue::from_str(&format!("Basic realm=\"{realm}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
    let body = json!({
        "errors": [{
            "code": "UNAUTHORIZED",
            "message": "authentication required",
        }]
    });

    (
        StatusCode::UNAUTHORIZED,
        [
            (WWW_AUTHENTICATE, challenge),
            (
                HeaderName::from_static(API_VERSION_HEADER),
                HeaderValue::from_static("registry/2.0"),
            ),
        ],
        Json(body),
    )
        .into_response()
}
