//! Common helpers for end-to-end tests.

use std::collections::BTreeSet;

use axum::http::Request;
use axum::http::header::AUTHORIZATION;

use crate::claims::{Capability, TOKEN_USERNAME};
use crate::credentials::encode_basic;
use crate::issuer::issue_at;
use crate::keys::{KeyPair, VerifyingKey, generate_key_pair};
use crate::registry_tokens::{Authenticator, RegistryTokens};
use crate::time::FixedClock;
use crate::verification::Verification;
use crate::verifier::TokenVerifier;

/// Issuance time used by every fixture.
pub const NOW: u64 = 1_700_000_000;

pub type TestTokens = RegistryTokens<TokenVerifier<FixedClock>>;

/// A key pair plus a façade that verifies at a fixed instant.
pub struct Fixture {
    pub keys: KeyPair,
    pub tokens: TestTokens,
}

impl Fixture {
    /// Fresh key pair, verifier clock at [`NOW`].
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::expect_used)]
        let keys = generate_key_pair().expect("Failed to generate key pair");
        let tokens = tokens_at(&keys, NOW);
        Self { keys, tokens }
    }

    /// A façade over the same public key whose clock reads `now`.
    #[must_use]
    pub fn verifier_at(&self, now: u64) -> TestTokens {
        tokens_at(&self.keys, now)
    }

    /// Issue a token at [`NOW`].
    pub fn issue(
        &self,
        capabilities: &[Capability],
        namespaces: &[&str],
        expiry_minutes: Option<f64>,
        account_id: Option<&str>,
    ) -> String {
        #[allow(clippy::expect_used)]
        let token = issue_at(
            &FixedClock(NOW),
            &capabilities.iter().copied().collect::<BTreeSet<_>>(),
            &self.keys.private_key,
            &namespaces.iter().map(ToString::to_string).collect::<Vec<_>>(),
            expiry_minutes,
            account_id,
        )
        .expect("Failed to issue token");
        token
    }

    /// Check `token` against `method path` through the façade.
    pub fn check(&self, method: &str, path: &str, token: &str) -> Verification {
        self.tokens.check_credentials(&request(method, path, token))
    }
}

fn tokens_at(keys: &KeyPair, now: u64) -> TestTokens {
    #[allow(clippy::expect_used)]
    let public_key = VerifyingKey::decode(&keys.public_key).expect("Failed to decode public key");
    #[allow(clippy::expect_used)]
    let verifier = TokenVerifier::new(&public_key)
        .expect("Failed to create verifier")
        .with_clock(FixedClock(now));
    RegistryTokens::with_verifier(verifier)
}

/// Request carrying `token` as Basic credentials.
pub fn request(method: &str, path: &str, token: &str) -> Request<()> {
    #[allow(clippy::expect_used)]
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header(AUTHORIZATION, encode_basic(TOKEN_USERNAME, token))
        .body(())
        .expect("Failed to build request");
    request
}

/// Every subset of {pull, push}.
pub fn capability_subsets() -> [Vec<Capability>; 4] {
    [
        vec![],
        vec![Capability::Pull],
        vec![Capability::Push],
        vec![Capability::Pull, Capability::Push],
    ]
}
