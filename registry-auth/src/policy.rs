//! Authorization policy: which capability and namespace a request needs.
//!
//! | method                   | requirement                              |
//! |--------------------------|------------------------------------------|
//! | HEAD                     | `pull` or `push`                         |
//! | GET `/v2/`               | any capability, namespace not checked    |
//! | GET (other paths)        | `pull`                                   |
//! | POST, PUT, DELETE, PATCH | `push`                                   |
//! | anything else            | denied                                   |
//!
//! Every request except the version ping also needs its namespace (the
//! segment after `/v2/`) to be in the token's audience when the audience is
//! non-empty.

use crate::claims::{Capability, TokenPayload};
use crate::verification::Denial;

/// Registry API version check endpoint.
pub const VERSION_PING_PATH: &str = "/v2/";

/// What a request demands of a token's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// At least one capability, then the namespace check.
    AnyCapability,
    /// At least one capability; the namespace check is skipped.
    VersionPing,
    /// This capability, then the namespace check.
    Capability(Capability),
    /// Never allowed.
    Forbidden,
}

/// Map a request method and path to its requirement.
///
/// The method is compared case-insensitively.
#[must_use]
pub fn requirement(method: &str, path: &str) -> Requirement {
    match (method.to_ascii_uppercase().as_str(), path) {
        ("HEAD", _) => Requirement::AnyCapability,
        ("GET", VERSION_PING_PATH) => Requirement::VersionPing,
        ("GET", _) => Requirement::Capability(Capability::Pull),
        ("POST" | "PUT" | "DELETE" | "PATCH", _) => Requirement::Capability(Capability::Push),
        _ => Requirement::Forbidden,
    }
}

/// The namespace a request path targets: `/v2/<namespace>/...`.
#[must_use]
pub fn namespace_of(path: &str) -> Option<&str> {
    path.split('/').nth(2)
}

/// Decide whether `claims` permit `method` on `path`.
pub fn authorize(method: &str, path: &str, claims: &TokenPayload) -> Result<(), Denial> {
    match requirement(method, path) {
        Requirement::Forbidden => return Err(Denial::UnsupportedMethod),
        Requirement::VersionPing => {
            return if claims.has_any_capability() {
                Ok(())
            } else {
                Err(Denial::CapabilityDenied)
            };
        }
        Requirement::AnyCapability => {
            if !claims.has_any_capability() {
                return Err(Denial::CapabilityDenied);
            }
        }
        Requirement::Capability(capability) => {
            if !claims.has_capability(capability) {
                return Err(Denial::CapabilityDenied);
            }
        }
    }

    if claims.allows_namespace(namespace_of(path)) {
        Ok(())
    } else {
        Err(Denial::NamespaceDenied)
    }
}
