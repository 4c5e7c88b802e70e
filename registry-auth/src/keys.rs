//! P-256 key material and its transport encoding.
//!
//! Keys travel as standard (padded) base64 of a JSON Web Key. This string is
//! what the key generator prints, what the issuer takes as its private key and
//! what the verifier is configured with.
//!
//! # Pre-conditions
//! - Encoded keys are EC keys on curve P-256.
//!
//! # Post-conditions
//! - A decoded `SigningKey` always matches the `x`/`y` coordinates it was
//!   encoded with.
//!
//! # Invariants
//! - `VerifyingKey` never carries private material.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use jsonwebtoken::{DecodingKey, EncodingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::EncodePrivateKey;
use p256::{PublicKey, SecretKey};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

/// File name used for the private half when a key pair is written to disk.
pub const PRIVATE_KEY_FILE: &str = "private.key";
/// File name used for the public half when a key pair is written to disk.
pub const PUBLIC_KEY_FILE: &str = "public.key";

const COORDINATE_LEN: usize = 32;

/// Error returned when key material cannot be decoded or encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The key string is not a well-formed P-256 JSON Web Key.
    MalformedKey(String),
    /// The key could not be serialized.
    Encoding(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedKey(reason) => write!(f, "malformed key: {reason}"),
            Self::Encoding(reason) => write!(f, "failed to encode key: {reason}"),
        }
    }
}

impl std::error::Error for KeyError {}

/// Wire form of a key.
#[derive(Debug, Serialize, Deserialize)]
struct JsonWebKey {
    kty: String,
    crv: String,
    x: String,
    y: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    key_ops: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ext: Option<bool>,
}

impl JsonWebKey {
    fn from_public(public: &PublicKey, key_ops: &[&str]) -> Result<Self, KeyError> {
        let point = public.to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(KeyError::Encoding("public key has no affine coordinates".to_string()));
        };
        Ok(Self {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x: URL_SAFE_NO_PAD.encode(x),
            y: URL_SAFE_NO_PAD.encode(y),
            d: None,
            key_ops: key_ops.iter().map(ToString::to_string).collect(),
            ext: Some(true),
        })
    }

    fn to_transport(&self) -> Result<String, KeyError> {
        let json = serde_json::to_string(self).map_err(|e| KeyError::Encoding(e.to_string()))?;
        Ok(STANDARD.encode(json))
    }

    fn from_transport(encoded: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| KeyError::MalformedKey(format!("invalid base64: {e}")))?;
        let jwk: Self = serde_json::from_slice(&bytes)
            .map_err(|e| KeyError::MalformedKey(format!("invalid JSON Web Key: {e}")))?;

        if jwk.kty != "EC" {
            return Err(KeyError::MalformedKey(format!(
                "unsupported key type '{}'",
                jwk.kty
            )));
        }
        if jwk.crv != "P-256" {
            return Err(KeyError::MalformedKey(format!(
                "unsupported curve '{}'",
                jwk.crv
            )));
        }
        Ok(jwk)
    }

    fn public_key(&self) -> Result<PublicKey, KeyError> {
        let x = decode_coordinate("x", &self.x)?;
        let y = decode_coordinate("y", &self.y)?;

        let mut sec1 = Vec::with_capacity(1 + 2 * COORDINATE_LEN);
        sec1.push(0x04);
        sec1.extend_from_slice(&x);
        sec1.extend_from_slice(&y);

        PublicKey::from_sec1_bytes(&sec1)
            .map_err(|_| KeyError::MalformedKey("point is not on curve P-256".to_string()))
    }
}

fn decode_coordinate(name: &str, value: &str) -> Result<Vec<u8>, KeyError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| KeyError::MalformedKey(format!("invalid '{name}' coordinate: {e}")))?;
    if bytes.len() != COORDINATE_LEN {
        return Err(KeyError::MalformedKey(format!(
            "'{name}' coordinate must be {COORDINATE_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Private half of a key pair. Signs tokens.
#[derive(Clone)]
pub struct SigningKey {
    secret: SecretKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Generate a fresh key from the operating system's RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    /// Decode a private key from its transport string.
    pub fn decode(encoded: &str) -> Result<Self, KeyError> {
        let jwk = JsonWebKey::from_transport(encoded)?;
        let Some(d) = jwk.d.as_deref() else {
            return Err(KeyError::MalformedKey(
                "private key is missing the 'd' parameter".to_string(),
            ));
        };
        let d = decode_coordinate("d", d)?;
        let secret = SecretKey::from_slice(&d)
            .map_err(|_| KeyError::MalformedKey("'d' is not a valid P-256 scalar".to_string()))?;

        if secret.public_key() != jwk.public_key()? {
            return Err(KeyError::MalformedKey(
                "public coordinates do not match the private scalar".to_string(),
            ));
        }

        Ok(Self { secret })
    }

    /// Encode to the transport string.
    pub fn encode(&self) -> Result<String, KeyError> {
        let mut jwk = JsonWebKey::from_public(&self.secret.public_key(), &["sign"])?;
        jwk.d = Some(URL_SAFE_NO_PAD.encode(self.secret.to_bytes()));
        jwk.to_transport()
    }

    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            public: self.secret.public_key(),
        }
    }

    /// Key handle for `jsonwebtoken` ES256 signing.
    pub(crate) fn encoding_key(&self) -> Result<EncodingKey, KeyError> {
        let der = self
            .secret
            .to_pkcs8_der()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        Ok(EncodingKey::from_ec_der(der.as_bytes()))
    }
}

/// Public half of a key pair. Verifies tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    public: PublicKey,
}

impl VerifyingKey {
    /// Decode a public key from its transport string.
    ///
    /// A private JWK is accepted too; only its public coordinates are kept.
    pub fn decode(encoded: &str) -> Result<Self, KeyError> {
        let jwk = JsonWebKey::from_transport(encoded)?;
        Ok(Self {
            public: jwk.public_key()?,
        })
    }

    /// Encode to the transport string.
    pub fn encode(&self) -> Result<String, KeyError> {
        JsonWebKey::from_public(&self.public, &["verify"])?.to_transport()
    }

    /// Key handle for `jsonwebtoken` ES256 verification.
    pub(crate) fn decoding_key(&self) -> Result<DecodingKey, KeyError> {
        let jwk = JsonWebKey::from_public(&self.public, &[])?;
        DecodingKey::from_ec_components(&jwk.x, &jwk.y)
            .map_err(|e| KeyError::MalformedKey(e.to_string()))
    }
}

/// Both halves of a freshly generated key, in transport form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key: String,
    pub public_key: String,
}

impl KeyPair {
    /// Write both halves into `directory` as [`PRIVATE_KEY_FILE`] and
    /// [`PUBLIC_KEY_FILE`]. Returns the two paths in that order.
    pub fn write_to_dir(&self, directory: &Path) -> std::io::Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(directory)?;
        let private_path = directory.join(PRIVATE_KEY_FILE);
        let public_path = directory.join(PUBLIC_KEY_FILE);
        std::fs::write(&private_path, &self.private_key)?;
        std::fs::write(&public_path, &self.public_key)?;
        Ok((private_path, public_path))
    }
}

/// Create a fresh P-256 key pair exported through the transport encoding.
pub fn generate_key_pair() -> Result<KeyPair, KeyError> {
    let signing_key = SigningKey::generate();
    let private_key = signing_key.encode()?;
    let public_key = signing_key.verifying_key().encode()?;
    tracing::debug!("generated P-256 key pair");
    Ok(KeyPair {
        private_key,
        public_key,
    })
}
