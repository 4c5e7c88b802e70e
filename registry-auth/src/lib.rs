// Life of a request:
// 1. The client sends `Authorization: Basic base64(v0:<token>)`
// 2. The token is pulled out of the password half
// 3. Signature is checked against the one configured public key (ES256)
// 4. `exp` is compared with our own clock
// 5. The method decides which capability is needed (`/v2/` only needs any)
// 6. The path's namespace must be in `aud`, unless `aud` is empty
//
// Any failure is `Verification::Denied`; the reason only goes to the log.
//
// Issuance runs offline: generate a key pair once, then sign tokens with the
// private half. The verifying side only ever sees the public half.

pub mod claims;
pub mod config;
pub mod credentials;
pub mod expiry;
pub mod issuer;
pub mod keys;
pub mod middleware;
pub mod policy;
pub mod registry_tokens;
pub mod time;
pub mod verification;
pub mod verifier;


pub use claims::{Capability, TOKEN_USERNAME, TokenPayload};
pub use config::AuthConfig;
pub use keys::{KeyError, KeyPair, SigningKey, VerifyingKey};
pub use registry_tokens::{Authenticator, RegistryTokens};
pub use verification::Verification;
pub use verifier::{TokenVerifier, VerifyToken};
