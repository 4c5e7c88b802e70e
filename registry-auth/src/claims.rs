//! Claim set carried inside a registry token.
//!
//! # Invariants
//! - `iat` is stamped by the issuer's clock at signing time.
//! - `exp`, when present, is `iat` plus the requested lifetime.
//! - An empty `aud` places no restriction on namespaces.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Protocol marker written into every token's `username` claim.
pub const TOKEN_USERNAME: &str = "v0";

/// A coarse permission granted by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Read access: manifests, blobs, tag listings.
    Pull,
    /// Write access: uploads, manifest puts, deletes.
    Push,
}

impl Capability {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCapability(pub String);

impl fmt::Display for UnknownCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown capability '{}' (expected pull or push)", self.0)
    }
}

impl std::error::Error for UnknownCapability {}

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pull" => Ok(Self::Pull),
            "push" => Ok(Self::Push),
            _ => Err(UnknownCapability(s.to_string())),
        }
    }
}

/// The signed claim set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Always [`TOKEN_USERNAME`] for tokens issued by this crate.
    pub username: String,
    /// Opaque account reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    /// Issued-at, seconds since Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since Unix epoch. `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Namespace allow-list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub aud: Vec<String>,
}

impl TokenPayload {
    /// Whether the token grants at least one capability.
    #[must_use]
    pub fn has_any_capability(&self) -> bool {
        !self.capabilities.is_empty()
    }

    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether `now` is at or past the expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.exp.is_some_and(|exp| now >= exp)
    }

    /// Whether the audience admits `namespace`.
    ///
    /// An empty audience admits everything, including a missing namespace.
    #[must_use]
    pub fn allows_namespace(&self, namespace: Option<&str>) -> bool {
        if self.aud.is_empty() {
            return true;
        }
        namespace.is_some_and(|ns| self.aud.iter().any(|allowed| allowed == ns))
    }
}

/// JWT permits `aud` as a single string as well as an array.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
