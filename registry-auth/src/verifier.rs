//! Token verification.
//!
//! Verification is a short-circuiting pipeline:
//! signature, then expiry, then capability by method, then namespace.
//!
//! # Pre-conditions
//! - The verifier holds exactly one ES256 public key.
//!
//! # Post-conditions
//! - `verify` never panics or returns an error; every failure is
//!   `Verification::Denied`.
//!
//! # Invariants
//! - Expiry is judged by the verifier's clock, never by the token's `iat`.

use axum::http::Request;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::claims::TokenPayload;
use crate::keys::{KeyError, VerifyingKey};
use crate::policy;
use crate::time::{Clock, SystemClock};
use crate::verification::{Denial, Verification};

/// Checks a token against the request it was presented with.
pub trait VerifyToken: Send + Sync {
    fn verify<B>(&self, request: &Request<B>, token: &str) -> Verification;
}

/// ES256 verifier bound to one public key.
#[derive(Clone)]
pub struct TokenVerifier<C = SystemClock> {
    decoding_key: DecodingKey,
    validation: Validation,
    clock: C,
}

impl TokenVerifier {
    /// Create a verifier for `public_key` using the system clock.
    pub fn new(public_key: &VerifyingKey) -> Result<Self, KeyError> {
        Ok(Self {
            decoding_key: public_key.decoding_key()?,
            validation: es256_validation(),
            clock: SystemClock,
        })
    }
}

impl<C: Clock> TokenVerifier<C> {
    /// Replace the clock used for expiry checks.
    #[must_use]
    pub fn with_clock<D: Clock>(self, clock: D) -> TokenVerifier<D> {
        TokenVerifier {
            decoding_key: self.decoding_key,
            validation: self.validation,
            clock,
        }
    }

    /// Run the full pipeline, keeping the denial reason.
    pub(crate) fn decide(
        &self,
        method: &str,
        path: &str,
        token: &str,
    ) -> Result<TokenPayload, Denial> {
        let claims = self.decode_claims(token)?;

        if claims.is_expired_at(self.clock.now_secs()) {
            return Err(Denial::TokenExpired);
        }

        policy::authorize(method, path, &claims)?;
        Ok(claims)
    }

    /// Check the signature and decode the claims.
    fn decode_claims(&self, token: &str) -> Result<TokenPayload, Denial> {
        decode::<TokenPayload>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token failed signature check");
                Denial::SignatureInvalid
            })
    }
}

impl<C: Clock> VerifyToken for TokenVerifier<C> {
    fn verify<B>(&self, request: &Request<B>, token: &str) -> Verification {
        let method = request.method().as_str();
        let path = request.uri().path();

        match self.decide(method, path, token) {
            Ok(payload) => Verification::Verified(payload),
            Err(reason) => {
                tracing::debug!(%reason, method, path, "registry token denied");
                Verification::Denied
            }
        }
    }
}

/// ES256 only. `exp` is checked by the verifier's own clock and `aud` by the
/// namespace policy, so the library's built-in claim checks are disabled.
fn es256_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}
