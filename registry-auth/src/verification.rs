//! Outcome of checking a request's credentials.
//!
//! Callers only ever see [`Verification`]. The specific [`Denial`] reason is
//! kept inside the crate and written to the trace log, so a client cannot
//! tell a bad signature from a missing capability or a foreign namespace.

use std::fmt;

use crate::claims::TokenPayload;

/// Result of verifying a request against a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Every check passed. The payload is trustworthy.
    Verified(TokenPayload),
    /// Some check failed. Nothing from the token may be trusted.
    Denied,
}

impl Verification {
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    #[must_use]
    pub const fn payload(&self) -> Option<&TokenPayload> {
        match self {
            Self::Verified(payload) => Some(payload),
            Self::Denied => None,
        }
    }

    #[must_use]
    pub fn into_payload(self) -> Option<TokenPayload> {
        match self {
            Self::Verified(payload) => Some(payload),
            Self::Denied => None,
        }
    }
}

impl From<Result<TokenPayload, Denial>> for Verification {
    fn from(result: Result<TokenPayload, Denial>) -> Self {
        result.map_or(Self::Denied, Self::Verified)
    }
}

/// Why a request was denied. Internal diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The `Authorization` header is missing, not Basic, or undecodable.
    MalformedCredentials,
    /// The token is malformed, uses another algorithm, or fails the signature check.
    SignatureInvalid,
    /// The token's `exp` is at or before the verifier's current time.
    TokenExpired,
    /// The token lacks the capability the request method needs.
    CapabilityDenied,
    /// The request targets a namespace outside the token's audience.
    NamespaceDenied,
    /// The request method is never allowed.
    UnsupportedMethod,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedCredentials => write!(f, "malformed credentials"),
            Self::SignatureInvalid => write!(f, "invalid token signature"),
            Self::TokenExpired => write!(f, "token has expired"),
            Self::CapabilityDenied => write!(f, "missing capability"),
            Self::NamespaceDenied => write!(f, "namespace not in audience"),
            Self::UnsupportedMethod => write!(f, "unsupported method"),
        }
    }
}
