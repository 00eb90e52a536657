//! Cryptographic error types for `cachet-crypto-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Input is not valid URL-safe base64 (bad character, impossible length).
    #[error("base64url decode failed: {0}")]
    Decode(String),

    /// Salt text could not be decoded into bytes.
    #[error("invalid salt: {0}")]
    InvalidSalt(String),

    /// Key-derivation parameters are out of range (zero iterations,
    /// output length not a whole number of bytes).
    #[error("invalid KDF parameter: {0}")]
    InvalidParameter(String),

    /// Key material has the wrong length or is otherwise unusable.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Token authentication failed — tag mismatch from a wrong key,
    /// a corrupted token, or tampering. Carries no detail.
    #[error("token authentication failed")]
    Authentication,

    /// Token could not be parsed (truncated, wrong version, not base64url).
    #[error("malformed token: {0}")]
    MalformedToken(String),
}
