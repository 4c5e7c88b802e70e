//! Token issuance.
//!
//! Issuance is permissive: capabilities and namespaces are signed as given,
//! and every policy decision is left to verification.

use std::collections::BTreeSet;
use std::fmt;

use jsonwebtoken::{Algorithm, Header, encode};

use crate::claims::{Capability, TOKEN_USERNAME, TokenPayload};
use crate::keys::{KeyError, SigningKey};
use crate::time::{Clock, SystemClock};

/// Error returned when a token cannot be issued.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueError {
    /// The private key could not be decoded.
    Key(KeyError),
    /// The expiry is negative or not a finite number of minutes.
    InvalidExpiry(f64),
    /// The signer rejected the claims or key.
    Signing(String),
}

impl fmt::Display for IssueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(e) => write!(f, "{e}"),
            Self::InvalidExpiry(minutes) => {
                write!(f, "invalid expiry: {minutes} minutes")
            }
            Self::Signing(reason) => write!(f, "failed to sign token: {reason}"),
        }
    }
}

impl std::error::Error for IssueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Key(e) => Some(e),
            _ => None,
        }
    }
}

impl From<KeyError> for IssueError {
    fn from(error: KeyError) -> Self {
        Self::Key(error)
    }
}

/// Issue a signed token using the system clock.
///
/// # Arguments
/// * `capabilities` - What the bearer may do.
/// * `private_key` - Private key in transport form.
/// * `namespaces` - Audience; empty means every namespace.
/// * `expiry_minutes` - Lifetime; `None` never expires.
/// * `account_id` - Opaque account reference.
pub fn issue(
    capabilities: &BTreeSet<Capability>,
    private_key: &str,
    namespaces: &[String],
    expiry_minutes: Option<f64>,
    account_id: Option<&str>,
) -> Result<String, IssueError> {
    issue_at(
        &SystemClock,
        capabilities,
        private_key,
        namespaces,
        expiry_minutes,
        account_id,
    )
}

/// Issue a signed token, reading `iat` from `clock`.
pub fn issue_at(
    clock: &impl Clock,
    capabilities: &BTreeSet<Capability>,
    private_key: &str,
    namespaces: &[String],
    expiry_minutes: Option<f64>,
    account_id: Option<&str>,
) -> Result<String, IssueError> {
    let signing_key = SigningKey::decode(private_key)?;
    let payload = build_payload(
        clock.now_secs(),
        capabilities,
        namespaces,
        expiry_minutes,
        account_id,
    )?;
    sign(&payload, &signing_key)
}

/// Sign an already-built payload with ES256.
pub fn sign(payload: &TokenPayload, signing_key: &SigningKey) -> Result<String, IssueError> {
    let header = Header::new(Algorithm::ES256);
    let token = encode(&header, payload, &signing_key.encoding_key()?)
        .map_err(|e| IssueError::Signing(e.to_string()))?;

    tracing::debug!(
        capabilities = ?payload.capabilities,
        aud = ?payload.aud,
        exp = ?payload.exp,
        "issued registry token"
    );
    Ok(token)
}

fn build_payload(
    now: u64,
    capabilities: &BTreeSet<Capability>,
    namespaces: &[String],
    expiry_minutes: Option<f64>,
    account_id: Option<&str>,
) -> Result<TokenPayload, IssueError> {
    let exp = expiry_minutes
        .map(|minutes| lifetime_secs(minutes).map(|secs| now.saturating_add(secs)))
        .transpose()?;

    Ok(TokenPayload {
        username: TOKEN_USERNAME.to_string(),
        account_id: account_id.map(ToString::to_string),
        capabilities: capabilities.clone(),
        iat: now,
        exp,
        aud: namespaces.to_vec(),
    })
}

/// Whole seconds in `minutes`, rounded to the nearest second.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // checked finite and non-negative; `as` saturates
fn lifetime_secs(minutes: f64) -> Result<u64, IssueError> {
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(IssueError::InvalidExpiry(minutes));
    }
    Ok((minutes * 60.0).round() as u64)
}
