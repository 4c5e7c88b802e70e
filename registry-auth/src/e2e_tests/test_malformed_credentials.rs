//! Credential extraction failures are denied before any signature work.

use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::Request;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::claims::Capability;
use crate::credentials::encode_basic;
use crate::e2e_tests::helpers::Fixture;
use crate::registry_tokens::{Authenticator, RegistryTokens};
use crate::verification::Verification;
use crate::verifier::VerifyToken;

/// Counts calls; the tests expect none.
struct UnreachableVerifier {
    calls: AtomicUsize,
}

impl VerifyToken for UnreachableVerifier {
    fn verify<B>(&self, _request: &Request<B>, _token: &str) -> Verification {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Verification::Denied
    }
}

fn request_with(authorization: Option<&str>) -> Request<()> {
    let mut builder = Request::get("/v2/teamA/manifests/latest");
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(()).expect("build request")
}

fn malformed_headers() -> Vec<Option<String>> {
    vec![
        None,
        Some("Bearer a.b.c".to_string()),
        Some("Digest username=\"v0\"".to_string()),
        Some("Basic".to_string()),
        Some("Basic ***".to_string()),
        Some(format!("Basic {}", STANDARD.encode("no-colon-here"))),
    ]
}

#[test]
fn test_malformed_credentials_never_reach_verifier() {
    let tokens = RegistryTokens::with_verifier(UnreachableVerifier {
        calls: AtomicUsize::new(0),
    });

    for header in malformed_headers() {
        let request = request_with(header.as_deref());
        assert_eq!(
            tokens.check_credentials(&request),
            Verification::Denied,
            "{header:?}"
        );
    }
    assert_eq!(tokens.verifier().calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_valid_token_in_bearer_scheme_is_denied() {
    let fixture = Fixture::new();
    let token = fixture.issue(&[Capability::Pull], &[], None, None);

    let bearer = format!("Bearer {token}");
    let bearer = request_with(Some(bearer.as_str()));
    assert!(!fixture.tokens.check_credentials(&bearer).is_verified());

    let basic = encode_basic("anyone", &token);
    let basic = request_with(Some(basic.as_str()));
    assert!(fixture.tokens.check_credentials(&basic).is_verified());
}

#[test]
fn test_username_is_ignored() {
    let fixture = Fixture::new();
    let token = fixture.issue(&[Capability::Pull], &[], None, None);

    for username in ["v0", "", "someone-else"] {
        let header = encode_basic(username, &token);
        let request = request_with(Some(header.as_str()));
        assert!(
            fixture.tokens.check_credentials(&request).is_verified(),
            "{username:?}"
        );
    }
}
