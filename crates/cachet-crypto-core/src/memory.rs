//! Secret memory types for key material and unsealed plaintext.
//!
//! [`SecretBuffer`] wraps sensitive bytes so that they are:
//! - Zeroed on drop via [`zeroize`] (through `secrecy`'s built-in handling)
//! - Masked in `Debug`/`Display` output to prevent accidental leakage
//!
//! Secrets in this crate are short-lived — they exist for the duration of a
//! single derive/seal/unseal call — so there is no page-locking machinery;
//! zeroization on drop is the guarantee callers rely on.

use secrecy::{ExposeSecret, SecretSlice};
use std::fmt;

/// Variable-length buffer for sensitive data.
///
/// Wraps [`SecretSlice<u8>`] from the `secrecy` crate and adds masked
/// `Debug`/`Display` output (`SecretBuffer(***)`).
pub struct SecretBuffer {
    inner: SecretSlice<u8>,
}

impl SecretBuffer {
    /// Create a new `SecretBuffer` from the given data.
    ///
    /// The data is copied into a new allocation. The caller should zeroize
    /// the source buffer after calling this.
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        Self {
            inner: data.to_vec().into(),
        }
    }

    /// Take ownership of an existing buffer without copying.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { inner: data.into() }
    }

    /// Expose the underlying bytes. Use sparingly — only when the raw
    /// bytes are needed for a cryptographic operation or final consumption.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    /// Returns the number of bytes in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Returns `true` if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

impl fmt::Display for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}
