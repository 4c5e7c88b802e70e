//! Registry token façade.
//!
//! `RegistryTokens` is what an HTTP layer holds: one decoded public key and the
//! credential check built on it. Issuance and key generation are exposed as
//! associated functions because the façade never holds a private key.
//!
//! # Pre-conditions
//! - The public key passed at construction is in transport form.
//!
//! # Post-conditions
//! - The public key is decoded exactly once, at construction.
//!
//! # Invariants
//! - Shared state is read-only, so one instance can serve concurrent requests
//!   without locking.

use std::collections::BTreeSet;

use axum::http::Request;

use crate::claims::Capability;
use crate::config::AuthConfig;
use crate::credentials;
use crate::issuer::{self, IssueError};
use crate::keys::{self, KeyError, KeyPair, VerifyingKey};
use crate::verification::Verification;
use crate::verifier::{TokenVerifier, VerifyToken};

/// Decides whether an HTTP request carries acceptable credentials.
pub trait Authenticator: Send + Sync {
    fn check_credentials<B>(&self, request: &Request<B>) -> Verification;
}

/// Issues and checks registry tokens against a single public key.
pub struct RegistryTokens<V = TokenVerifier> {
    verifier: V,
}

impl RegistryTokens {
    /// Create from a public key in transport form.
    ///
    /// # Errors
    /// Returns `KeyError::MalformedKey` if the key cannot be decoded.
    pub fn new(public_key: &str) -> Result<Self, KeyError> {
        let public_key = VerifyingKey::decode(public_key).inspect_err(|e| {
            tracing::warn!("configured public key is unusable: {e}");
        })?;
        Ok(Self::with_verifier(TokenVerifier::new(&public_key)?))
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, KeyError> {
        Self::new(&config.public_key)
    }

    /// Generate a key pair for a new deployment.
    pub fn create_key_pair() -> Result<KeyPair, KeyError> {
        keys::generate_key_pair()
    }

    /// Issue a token signed with `private_key`.
    ///
    /// See [`issuer::issue`].
    pub fn issue(
        capabilities: &BTreeSet<Capability>,
        private_key: &str,
        namespaces: &[String],
        expiry_minutes: Option<f64>,
        account_id: Option<&str>,
    ) -> Result<String, IssueError> {
        issuer::issue(
            capabilities,
            private_key,
            namespaces,
            expiry_minutes,
            account_id,
        )
    }
}

impl<V> RegistryTokens<V> {
    /// Wrap an existing verifier.
    #[must_use]
    pub const fn with_verifier(verifier: V) -> Self {
        Self { verifier }
    }

    #[must_use]
    pub const fn verifier(&self) -> &V {
        &self.verifier
    }
}

impl<V: VerifyToken> Authenticator for RegistryTokens<V> {
    fn check_credentials<B>(&self, request: &Request<B>) -> Verification {
        match credentials::extract(request.headers()) {
            Ok(token) => self.verifier.verify(request, &token),
            Err(reason) => {
                tracing::debug!(%reason, path = request.uri().path(), "registry token denied");
                Verification::Denied
            }
        }
    }
}
