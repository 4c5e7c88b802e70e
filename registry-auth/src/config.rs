//! Verifier configuration module.
//!
//! This module loads the verifier's configuration from environment variables.
//!
//! # Environment Variables
//!
//! - `REGISTRY_AUTH_PUBLIC_KEY`: Public key in transport form (base64 of a JSON Web Key)
//! - `REGISTRY_AUTH_PUBLIC_KEY_FILE`: File holding the public key (used when the variable above is unset)
//! - `REGISTRY_AUTH_REALM`: Realm advertised in `WWW-Authenticate` (default: `registry`)
//!
//! # Invariants
//!
//! - `public_key` is never empty. It is not decoded here; decoding happens once
//!   when `RegistryTokens` is constructed.

use std::path::PathBuf;

pub const PUBLIC_KEY_VAR: &str = "REGISTRY_AUTH_PUBLIC_KEY";
pub const PUBLIC_KEY_FILE_VAR: &str = "REGISTRY_AUTH_PUBLIC_KEY_FILE";
pub const REALM_VAR: &str = "REGISTRY_AUTH_REALM";

/// Verifier configuration.
///
/// # Post-conditions
///
/// - `public_key` is non-empty and trimmed.
/// - `realm` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// The single public key tokens are verified against.
    pub public_key: String,
    /// Realm advertised to clients on a 401.
    pub realm: String,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl AuthConfig {
    /// Default realm for `WWW-Authenticate`.
    pub const DEFAULT_REALM: &'static str = "registry";

    /// Configuration for a known public key with the default realm.
    #[must_use]
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            realm: Self::DEFAULT_REALM.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Neither `REGISTRY_AUTH_PUBLIC_KEY` nor `REGISTRY_AUTH_PUBLIC_KEY_FILE` is set
    /// - The key (or key file) is empty, or the key file cannot be read
    /// - `REGISTRY_AUTH_REALM` is set but empty
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let public_key = Self::load_public_key(&lookup)?;
        let realm = Self::load_realm(&lookup)?;

        Ok(Self { public_key, realm })
    }

    /// Load the public key, preferring the inline variable over the file.
    fn load_public_key(lookup: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        let (name, raw) = if let Some(value) = lookup(PUBLIC_KEY_VAR) {
            (PUBLIC_KEY_VAR, value)
        } else if let Some(path) = lookup(PUBLIC_KEY_FILE_VAR) {
            let path = PathBuf::from(path);
            let contents =
                std::fs::read_to_string(&path).map_err(|e| ConfigError::InvalidValue {
                    name: PUBLIC_KEY_FILE_VAR.to_string(),
                    message: format!("cannot read {}: {e}", path.display()),
                })?;
            (PUBLIC_KEY_FILE_VAR, contents)
        } else {
            return Err(ConfigError::MissingEnvVar(PUBLIC_KEY_VAR.to_string()));
        };

        let key = raw.trim();
        if key.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: name.to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(key.to_string())
    }

    /// Load the realm. Returns the default if not set.
    fn load_realm(lookup: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        match lookup(REALM_VAR) {
            Some(realm) if realm.trim().is_empty() => Err(ConfigError::InvalidValue {
                name: REALM_VAR.to_string(),
                message: "must not be empty".to_string(),
            }),
            Some(realm) => Ok(realm.trim().to_string()),
            None => Ok(Self::DEFAULT_REALM.to_string()),
        }
    }
}
