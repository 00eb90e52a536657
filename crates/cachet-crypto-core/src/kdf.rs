//! PBKDF2 key derivation over URL-safe base64 inputs and outputs.
//!
//! This module provides:
//! - [`derive`] — stretch a password + salt into a fixed-length key
//! - [`KdfParams`] — iteration count, output length, hash algorithm
//! - [`HashAlgorithm`] — the HMAC hash underlying the derivation
//! - [`DerivedKey`] — zeroize-on-drop, masked wrapper around the output
//!
//! Salts arrive as URL-safe base64 text (the transport encoding of the whole
//! protocol) and the derived key leaves the same way, ready to feed an
//! [`Envelope`](crate::envelope::Envelope) or a server-side verifier.
//!
//! Determinism is the property everything above this module depends on:
//! identical inputs always produce identical output, across processes and
//! across time. No result is cached — every call runs the full iteration
//! count, so callers with distinct passwords never share state.

use crate::encoding;
use crate::error::CryptoError;
use ring::pbkdf2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use zeroize::{Zeroize, Zeroizing};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Hash algorithm underlying the PBKDF2-HMAC construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// HMAC-SHA-1 (legacy interop only).
    Sha1,
    /// HMAC-SHA-256 — the algorithm the bootstrap protocol uses.
    Sha256,
    /// HMAC-SHA-384.
    Sha384,
    /// HMAC-SHA-512.
    Sha512,
}

impl HashAlgorithm {
    fn ring_algorithm(self) -> pbkdf2::Algorithm {
        match self {
            Self::Sha1 => pbkdf2::PBKDF2_HMAC_SHA1,
            Self::Sha256 => pbkdf2::PBKDF2_HMAC_SHA256,
            Self::Sha384 => pbkdf2::PBKDF2_HMAC_SHA384,
            Self::Sha512 => pbkdf2::PBKDF2_HMAC_SHA512,
        }
    }
}

/// PBKDF2 parameter set.
///
/// `output_bits` must be a positive multiple of 8; `iterations` must be
/// non-zero. Both are validated by [`derive`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Number of HMAC iterations (time cost).
    pub iterations: u32,
    /// Output length in bits (e.g. 256 for a 32-byte key).
    pub output_bits: u32,
    /// The HMAC hash algorithm.
    pub algorithm: HashAlgorithm,
}

/// A derived key, held as URL-safe unpadded base64 text.
///
/// The backing string is zeroized on drop and `Debug`/`Display` output is
/// masked. Call [`DerivedKey::as_str`] only at the point of consumption —
/// keying an envelope or filling a request payload.
pub struct DerivedKey {
    encoded: Zeroizing<String>,
}

impl DerivedKey {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            encoded: Zeroizing::new(encoding::encode(bytes)),
        }
    }

    /// The key as URL-safe unpadded base64 text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(***)")
    }
}

impl fmt::Display for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(***)")
    }
}

// ---------------------------------------------------------------------------
// Core KDF
// ---------------------------------------------------------------------------

/// Derive a key from a password and a URL-safe base64 salt using PBKDF2.
///
/// The password is consumed as its UTF-8 bytes; the salt is decoded via the
/// codec before any hashing work begins.
///
/// # Errors
///
/// - [`CryptoError::InvalidParameter`] if `iterations` is zero or
///   `output_bits` is zero or not a multiple of 8
/// - [`CryptoError::InvalidSalt`] if the salt is not valid URL-safe base64
pub fn derive(
    password: &str,
    salt_b64url: &str,
    params: &KdfParams,
) -> Result<DerivedKey, CryptoError> {
    let iterations = NonZeroU32::new(params.iterations).ok_or_else(|| {
        CryptoError::InvalidParameter("iterations must be non-zero".into())
    })?;

    if params.output_bits == 0 || params.output_bits % 8 != 0 {
        return Err(CryptoError::InvalidParameter(format!(
            "output length must be a positive multiple of 8 bits, got {}",
            params.output_bits
        )));
    }

    // Parameter and salt validation happen before any hashing work.
    let salt = encoding::decode(salt_b64url)
        .map_err(|e| CryptoError::InvalidSalt(e.to_string()))?;

    let key_len = usize::try_from(params.output_bits / 8)
        .map_err(|_| CryptoError::InvalidParameter("output length overflow".into()))?;

    let mut out = vec![0u8; key_len];
    pbkdf2::derive(
        params.algorithm.ring_algorithm(),
        iterations,
        &salt,
        password.as_bytes(),
        &mut out,
    );

    let key = DerivedKey::from_bytes(&out);
    out.zeroize();
    Ok(key)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// "salt" as URL-safe base64.
    const SALT_B64: &str = "c2FsdA";

    fn params(iterations: u32, output_bits: u32, algorithm: HashAlgorithm) -> KdfParams {
        KdfParams {
            iterations,
            output_bits,
            algorithm,
        }
    }

    // Standard PBKDF2 test vectors ("password"/"salt"), re-encoded as
    // URL-safe base64.

    #[test]
    fn sha256_known_vector_one_iteration() {
        let key = derive("password", SALT_B64, &params(1, 256, HashAlgorithm::Sha256))
            .expect("derive should succeed");
        assert_eq!(key.as_str(), "Eg-2z_z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs");
    }

    #[test]
    fn sha256_known_vector_two_iterations() {
        let key = derive("password", SALT_B64, &params(2, 256, HashAlgorithm::Sha256))
            .expect("derive should succeed");
        assert_eq!(key.as_str(), "rk0Mla9rRtMtCt_5KPBt0CowP47zwlHf1uLYWpVHTEM");
    }

    #[test]
    fn sha1_known_vector() {
        let key = derive("password", SALT_B64, &params(1, 160, HashAlgorithm::Sha1))
            .expect("derive should succeed");
        assert_eq!(key.as_str(), "DGDID5YfDnHzqbUkr2ASBi_gN6Y");
    }

    #[test]
    fn sha384_known_vector() {
        let key = derive("password", SALT_B64, &params(1, 384, HashAlgorithm::Sha384))
            .expect("derive should succeed");
        assert_eq!(
            key.as_str(),
            "wOFPBuSeMtc_n1Ld8dDFxxkWCSM2MdrddqVn20K3hnazj8gAzFPdtkL1x0RC5ivk"
        );
    }

    #[test]
    fn sha512_known_vector() {
        let key = derive("password", SALT_B64, &params(1, 512, HashAlgorithm::Sha512))
            .expect("derive should succeed");
        assert_eq!(
            key.as_str(),
            "hn9wzxreAs_zdSWZo6U9xK80x6ZpgVrl1RNVThyM8lLALUcKKFoFAbrZmb_pQ8CPBQI119aLHaVeY_c7YKV_zg"
        );
    }

    #[test]
    fn derive_is_deterministic() {
        let p = params(100, 256, HashAlgorithm::Sha256);
        let a = derive("correct horse", SALT_B64, &p).expect("derive should succeed");
        let b = derive("correct horse", SALT_B64, &p).expect("derive should succeed");
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn different_passwords_produce_different_keys() {
        let p = params(10, 256, HashAlgorithm::Sha256);
        let a = derive("password_a", SALT_B64, &p).expect("derive should succeed");
        let b = derive("password_b", SALT_B64, &p).expect("derive should succeed");
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let p = params(10, 256, HashAlgorithm::Sha256);
        let a = derive("password", "c2FsdA", &p).expect("derive should succeed");
        let b = derive("password", "c2FsdDI", &p).expect("derive should succeed");
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn output_is_unpadded_base64() {
        // 256 bits = 32 bytes = 43 base64 characters unpadded.
        let key = derive("password", SALT_B64, &params(1, 256, HashAlgorithm::Sha256))
            .expect("derive should succeed");
        assert_eq!(key.as_str().len(), 43);
        assert!(!key.as_str().contains('='));
    }

    #[test]
    fn rejects_malformed_salt_before_hashing() {
        let err = derive("password", "not!base64", &params(100_000, 256, HashAlgorithm::Sha256))
            .expect_err("should reject bad salt");
        assert!(matches!(err, CryptoError::InvalidSalt(_)));
    }

    #[test]
    fn rejects_zero_iterations() {
        let err = derive("password", SALT_B64, &params(0, 256, HashAlgorithm::Sha256))
            .expect_err("should reject zero iterations");
        assert!(matches!(err, CryptoError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_non_byte_output_length() {
        let err = derive("password", SALT_B64, &params(1, 12, HashAlgorithm::Sha256))
            .expect_err("should reject 12 bits");
        assert!(matches!(err, CryptoError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_zero_output_length() {
        let err = derive("password", SALT_B64, &params(1, 0, HashAlgorithm::Sha256))
            .expect_err("should reject 0 bits");
        assert!(matches!(err, CryptoError::InvalidParameter(_)));
    }

    #[test]
    fn derived_key_debug_is_masked() {
        let key = derive("password", SALT_B64, &params(1, 256, HashAlgorithm::Sha256))
            .expect("derive should succeed");
        assert_eq!(format!("{key:?}"), "DerivedKey(***)");
        assert_eq!(format!("{key}"), "DerivedKey(***)");
    }

    #[test]
    fn kdf_params_serde_roundtrip() {
        let p = params(152_734, 256, HashAlgorithm::Sha256);
        let json = serde_json::to_string(&p).expect("serialize should succeed");
        let back: KdfParams = serde_json::from_str(&json).expect("deserialize should succeed");
        assert_eq!(p, back);
    }
}
