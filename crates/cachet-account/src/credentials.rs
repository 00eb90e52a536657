//! Credential derivation — one password, one salt, two unrelated keys.
//!
//! The protocol derives two values from the same server-issued salt:
//!
//! - the **auth hash**, sent to the server as proof of password knowledge
//!   (pepper-free, 100 000 iterations);
//! - the **encryption key**, which seals the profile envelope and never
//!   leaves the client (password wrapped in fixed pepper strings, 152 734
//!   iterations).
//!
//! The differing pepper and iteration count keep the two outputs
//! cryptographically unrelated, so the server can verify the first without
//! learning anything about the second. All four constants are
//! interoperability-critical: changing any of them orphans every existing
//! account.

use crate::error::AccountError;
use cachet_crypto_core::kdf::{self, DerivedKey, HashAlgorithm, KdfParams};
use cachet_crypto_core::CryptoError;
use zeroize::Zeroizing;

/// Iteration count for the server-verifiable auth hash.
pub const AUTH_HASH_ITERATIONS: u32 = 100_000;

/// Iteration count for the envelope encryption key.
pub const ENCRYPTION_KEY_ITERATIONS: u32 = 152_734;

/// Output length of both derivations in bits.
pub const KEY_BITS: u32 = 256;

/// Fixed pepper prepended to the password for the encryption key.
const PEPPER_PREFIX: &str = "o7C@";

/// Fixed pepper appended to the password for the encryption key.
const PEPPER_SUFFIX: &str = "Lö§s";

fn auth_params() -> KdfParams {
    KdfParams {
        iterations: AUTH_HASH_ITERATIONS,
        output_bits: KEY_BITS,
        algorithm: HashAlgorithm::Sha256,
    }
}

fn encryption_params() -> KdfParams {
    KdfParams {
        iterations: ENCRYPTION_KEY_ITERATIONS,
        output_bits: KEY_BITS,
        algorithm: HashAlgorithm::Sha256,
    }
}

/// Derive the server-verifiable auth hash.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidSalt`] if the salt is not valid URL-safe
/// base64.
pub fn auth_hash(password: &str, salt_b64url: &str) -> Result<DerivedKey, CryptoError> {
    kdf::derive(password, salt_b64url, &auth_params())
}

/// Derive the envelope encryption key from the pepper-wrapped password.
///
/// The pepper concatenation order (prefix + password + suffix) is part of
/// the wire protocol.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidSalt`] if the salt is not valid URL-safe
/// base64.
pub fn encryption_key(password: &str, salt_b64url: &str) -> Result<DerivedKey, CryptoError> {
    let peppered = Zeroizing::new(format!("{PEPPER_PREFIX}{password}{PEPPER_SUFFIX}"));
    kdf::derive(&peppered, salt_b64url, &encryption_params())
}

/// Derive both credentials concurrently.
///
/// The two derivations have no ordering dependency; each runs on the
/// blocking pool so the async executor is never stalled by the iteration
/// counts. Each call is independent — nothing is memoized across passwords.
///
/// # Errors
///
/// Returns [`AccountError::Crypto`] if either derivation fails and
/// [`AccountError::Task`] if a blocking task dies before completing.
pub async fn derive_credentials(
    password: &str,
    salt_b64url: &str,
) -> Result<(DerivedKey, DerivedKey), AccountError> {
    let auth_password = Zeroizing::new(password.to_owned());
    let auth_salt = salt_b64url.to_owned();
    let auth_task =
        tokio::task::spawn_blocking(move || auth_hash(&auth_password, &auth_salt));

    let enc_password = Zeroizing::new(password.to_owned());
    let enc_salt = salt_b64url.to_owned();
    let enc_task =
        tokio::task::spawn_blocking(move || encryption_key(&enc_password, &enc_salt));

    let (auth, enc) = tokio::try_join!(auth_task, enc_task)
        .map_err(|e| AccountError::Task(e.to_string()))?;
    Ok((auth?, enc?))
}

/// Derive only the encryption key, off the async executor (login path).
///
/// # Errors
///
/// Returns [`AccountError::Crypto`] if the derivation fails and
/// [`AccountError::Task`] if the blocking task dies before completing.
pub async fn derive_encryption_key(
    password: &str,
    salt_b64url: &str,
) -> Result<DerivedKey, AccountError> {
    let password = Zeroizing::new(password.to_owned());
    let salt = salt_b64url.to_owned();
    let key = tokio::task::spawn_blocking(move || encryption_key(&password, &salt))
        .await
        .map_err(|e| AccountError::Task(e.to_string()))??;
    Ok(key)
}
