//! Bearer token extraction from `Authorization: Basic`.
//!
//! Docker clients send registry tokens as the password half of Basic
//! credentials. The username half is ignored.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::verification::Denial;

const BASIC_SCHEME: &str = "Basic";

/// Pull the token out of the request's `Authorization` header.
///
/// Returns `Denial::MalformedCredentials` when the header is missing, not
/// Basic, not base64, not UTF-8, or has no `:` separator.
pub fn extract(headers: &HeaderMap) -> Result<String, Denial> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(Denial::MalformedCredentials)?
        .to_str()
        .map_err(|_| Denial::MalformedCredentials)?;

    let (scheme, encoded) = value
        .trim()
        .split_once(' ')
        .ok_or(Denial::MalformedCredentials)?;
    if !scheme.eq_ignore_ascii_case(BASIC_SCHEME) {
        return Err(Denial::MalformedCredentials);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| Denial::MalformedCredentials)?;
    let credentials = String::from_utf8(decoded).map_err(|_| Denial::MalformedCredentials)?;
    let (_username, password) = credentials
        .split_once(':')
        .ok_or(Denial::MalformedCredentials)?;

    Ok(password.to_string())
}

/// Build a `Basic` header value for `username:password`.
#[must_use]
pub fn encode_basic(username: &str, password: &str) -> String {
    format!(
        "{BASIC_SCHEME} {}",
        STANDARD.encode(format!("{username}:{password}"))
    )
}
