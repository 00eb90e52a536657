//! Fernet-compatible authenticated envelope tokens.
//!
//! This module provides:
//! - [`Envelope`] — a cipher instance bound to one 256-bit key
//! - [`Envelope::seal`] — encrypt a payload into a self-describing token
//! - [`Envelope::unseal`] — authenticate and decrypt a token
//!
//! # Token layout (Fernet, version 0x80)
//!
//! | Offset | Size | Field                          |
//! |--------|------|--------------------------------|
//! | 0      | 1    | version (0x80)                 |
//! | 1      | 8    | timestamp (u64 BE, seconds)    |
//! | 9      | 16   | IV                             |
//! | 25     | N    | AES-128-CBC/PKCS7 ciphertext   |
//! | 25+N   | 32   | HMAC-SHA256 over bytes 0..25+N |
//!
//! The whole token travels as URL-safe base64 text. [`Envelope::seal`] emits
//! unpadded output; [`Envelope::unseal`] accepts padded or unpadded input,
//! so tokens from other Fernet implementations round-trip unchanged.
//!
//! The HMAC is verified in constant time **before** any decryption work, and
//! a failed verification returns [`CryptoError::Authentication`] with no
//! detail — wrong key, corruption, and tampering are indistinguishable.

use crate::encoding;
use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use ring::hmac;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Fernet format version byte.
pub const VERSION: u8 = 0x80;

/// Envelope key length in bytes (128-bit signing half + 128-bit cipher half).
pub const KEY_LEN: usize = 32;

/// IV length in bytes (one AES block).
const IV_LEN: usize = 16;

/// HMAC-SHA256 tag length in bytes.
const TAG_LEN: usize = 32;

/// AES block size in bytes.
const BLOCK_LEN: usize = 16;

/// version (1) + timestamp (8) + IV (16).
const HEADER_LEN: usize = 25;

/// Offset where the IV begins.
const IV_OFFSET: usize = 9;

/// Minimum decoded token: header + one ciphertext block + tag.
const MIN_TOKEN_LEN: usize = 73;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Authenticated symmetric cipher bound to one key.
///
/// The key is supplied as URL-safe base64 text (the form in which derived
/// keys circulate in this protocol) and split per the Fernet layout: first
/// 16 bytes sign, last 16 bytes encrypt. Both halves are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Envelope {
    signing_key: [u8; 16],
    encryption_key: [u8; 16],
}

impl Envelope {
    /// Create an envelope cipher from a URL-safe base64 key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyMaterial`] if the key does not decode
    /// or does not decode to exactly 32 bytes.
    pub fn new(key_b64url: &str) -> Result<Self, CryptoError> {
        let mut key_bytes = encoding::decode(key_b64url)
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("key decode failed: {e}")))?;

        if key_bytes.len() != KEY_LEN {
            key_bytes.zeroize();
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "invalid key length: expected {KEY_LEN} bytes"
            )));
        }

        let mut signing_key = [0u8; 16];
        let mut encryption_key = [0u8; 16];
        signing_key.copy_from_slice(&key_bytes[..16]);
        encryption_key.copy_from_slice(&key_bytes[16..]);
        key_bytes.zeroize();

        Ok(Self {
            signing_key,
            encryption_key,
        })
    }

    /// Encrypt a payload into a token with a fresh random IV and the current
    /// Unix timestamp.
    ///
    /// # Errors
    ///
    /// This operation is infallible for any payload once the envelope exists;
    /// the `Result` is kept for signature stability with [`Self::unseal`].
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());

        Ok(self.seal_parts(plaintext, timestamp, &iv))
    }

    /// Assemble a token from explicit parts. `seal` supplies the random IV
    /// and clock; known-answer tests pin both.
    fn seal_parts(&self, plaintext: &[u8], timestamp: u64, iv: &[u8; IV_LEN]) -> String {
        let ciphertext = Aes128CbcEnc::new(&self.encryption_key.into(), &(*iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut token = Vec::with_capacity(
            HEADER_LEN
                .saturating_add(ciphertext.len())
                .saturating_add(TAG_LEN),
        );
        token.push(VERSION);
        token.extend_from_slice(&timestamp.to_be_bytes());
        token.extend_from_slice(iv);
        token.extend_from_slice(&ciphertext);

        let mac_key = hmac::Key::new(hmac::HMAC_SHA256, &self.signing_key);
        let tag = hmac::sign(&mac_key, &token);
        token.extend_from_slice(tag.as_ref());

        encoding::encode(&token)
    }

    /// Authenticate and decrypt a token.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MalformedToken`] if the token is not base64url, is
    ///   truncated, carries an unknown version byte, or has a ciphertext
    ///   region that is not whole AES blocks
    /// - [`CryptoError::Authentication`] if the HMAC does not verify (wrong
    ///   key, corruption, tampering) or the padding is inconsistent after an
    ///   authentic decryption
    pub fn unseal(&self, token: &str) -> Result<SecretBuffer, CryptoError> {
        let data = encoding::decode(token)
            .map_err(|e| CryptoError::MalformedToken(format!("token decode failed: {e}")))?;

        if data.len() < MIN_TOKEN_LEN {
            return Err(CryptoError::MalformedToken(format!(
                "token too short: {} bytes (minimum {MIN_TOKEN_LEN})",
                data.len()
            )));
        }
        if data[0] != VERSION {
            return Err(CryptoError::MalformedToken(format!(
                "unsupported token version: 0x{:02x}",
                data[0]
            )));
        }

        let tag_start = data
            .len()
            .checked_sub(TAG_LEN)
            .ok_or(CryptoError::Authentication)?;

        let ct_len = tag_start
            .checked_sub(HEADER_LEN)
            .ok_or(CryptoError::Authentication)?;
        if ct_len == 0 || ct_len % BLOCK_LEN != 0 {
            return Err(CryptoError::MalformedToken(
                "ciphertext is not whole cipher blocks".into(),
            ));
        }

        // Verify the tag before touching the ciphertext. ring's verify is
        // constant-time.
        let mac_key = hmac::Key::new(hmac::HMAC_SHA256, &self.signing_key);
        hmac::verify(&mac_key, &data[..tag_start], &data[tag_start..])
            .map_err(|_| CryptoError::Authentication)?;

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&data[IV_OFFSET..HEADER_LEN]);

        let plaintext = Aes128CbcDec::new(&self.encryption_key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&data[HEADER_LEN..tag_start])
            .map_err(|_| CryptoError::Authentication)?;

        Ok(SecretBuffer::from_vec(plaintext))
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Envelope(***)")
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Bytes 0x00..0x1f as an unpadded base64url key.
    const TEST_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

    fn test_envelope() -> Envelope {
        Envelope::new(TEST_KEY).expect("key should be valid")
    }

    #[test]
    fn seal_unseal_roundtrip() {
        let env = test_envelope();
        let token = env.seal(b"profile payload").expect("seal should succeed");
        let plain = env.unseal(&token).expect("unseal should succeed");
        assert_eq!(plain.expose(), b"profile payload");
    }

    #[test]
    fn seal_roundtrips_empty_payload() {
        let env = test_envelope();
        let token = env.seal(b"").expect("seal should succeed");
        let plain = env.unseal(&token).expect("unseal should succeed");
        assert!(plain.expose().is_empty());
    }

    #[test]
    fn token_is_unpadded_base64url() {
        let env = test_envelope();
        let token = env.seal(b"data").expect("seal should succeed");
        assert!(!token.contains('='));
        assert!(encoding::decode(&token).is_ok());
    }

    #[test]
    fn token_starts_with_version_byte() {
        let env = test_envelope();
        let token = env.seal(b"data").expect("seal should succeed");
        let raw = encoding::decode(&token).expect("token should decode");
        assert_eq!(raw[0], VERSION);
        // 0x80 makes the first base64 character 'g'.
        assert!(token.starts_with('g'));
    }

    #[test]
    fn two_seals_produce_different_tokens() {
        let env = test_envelope();
        let a = env.seal(b"same data").expect("seal should succeed");
        let b = env.seal(b"same data").expect("seal should succeed");
        assert_ne!(a, b, "IVs should differ");
    }

    #[test]
    fn unseal_with_wrong_key_fails_authentication() {
        let env = test_envelope();
        let token = env.seal(b"data").expect("seal should succeed");
        let wrong = Envelope::new(&encoding::encode(&[0x42u8; 32])).expect("key should be valid");
        let result = wrong.unseal(&token);
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let env = test_envelope();
        let token = env.seal(b"data to protect").expect("seal should succeed");
        let mut raw = encoding::decode(&token).expect("token should decode");
        raw[HEADER_LEN] ^= 0xFF;
        let result = env.unseal(&encoding::encode(&raw));
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn tampered_timestamp_fails_authentication() {
        let env = test_envelope();
        let token = env.seal(b"data").expect("seal should succeed");
        let mut raw = encoding::decode(&token).expect("token should decode");
        raw[3] ^= 0x01;
        let result = env.unseal(&encoding::encode(&raw));
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn tampered_iv_fails_authentication() {
        let env = test_envelope();
        let token = env.seal(b"data").expect("seal should succeed");
        let mut raw = encoding::decode(&token).expect("token should decode");
        raw[IV_OFFSET] ^= 0x01;
        let result = env.unseal(&encoding::encode(&raw));
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn tampered_tag_fails_authentication() {
        let env = test_envelope();
        let token = env.seal(b"data").expect("seal should succeed");
        let mut raw = encoding::decode(&token).expect("token should decode");
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let result = env.unseal(&encoding::encode(&raw));
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn truncated_token_is_malformed() {
        let env = test_envelope();
        let result = env.unseal("gAAAAA");
        assert!(matches!(result, Err(CryptoError::MalformedToken(_))));
    }

    #[test]
    fn wrong_version_is_malformed() {
        let env = test_envelope();
        let token = env.seal(b"data").expect("seal should succeed");
        let mut raw = encoding::decode(&token).expect("token should decode");
        raw[0] = 0x81;
        let result = env.unseal(&encoding::encode(&raw));
        assert!(matches!(result, Err(CryptoError::MalformedToken(_))));
    }

    #[test]
    fn non_base64_token_is_malformed() {
        let env = test_envelope();
        let result = env.unseal("not a token!");
        assert!(matches!(result, Err(CryptoError::MalformedToken(_))));
    }

    #[test]
    fn ragged_ciphertext_is_malformed() {
        // Structurally valid length but ciphertext not whole blocks:
        // header (25) + 17 + tag (32) = 74 bytes.
        let env = test_envelope();
        let mut raw = vec![0u8; 74];
        raw[0] = VERSION;
        let result = env.unseal(&encoding::encode(&raw));
        assert!(matches!(result, Err(CryptoError::MalformedToken(_))));
    }

    #[test]
    fn rejects_short_key() {
        let short = encoding::encode(&[0u8; 16]);
        let result = Envelope::new(&short);
        assert!(matches!(result, Err(CryptoError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn rejects_undecodable_key() {
        let result = Envelope::new("!!!");
        assert!(matches!(result, Err(CryptoError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn envelope_debug_is_masked() {
        let env = test_envelope();
        assert_eq!(format!("{env:?}"), "Envelope(***)");
    }

    #[test]
    fn accepts_padded_token_input() {
        let env = test_envelope();
        let token = env.seal(b"padded transport").expect("seal should succeed");
        let padded = match token.len() % 4 {
            2 => format!("{token}=="),
            3 => format!("{token}="),
            _ => token.clone(),
        };
        let plain = env.unseal(&padded).expect("unseal should accept padding");
        assert_eq!(plain.expose(), b"padded transport");
    }

    // Known-answer vectors generated with the Python `cryptography` Fernet
    // implementation (key = bytes 0x00..0x1f).

    #[test]
    fn interop_seal_matches_reference_implementation() {
        let env = test_envelope();
        let iv: [u8; 16] = [
            0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D,
            0x1E, 0x1F,
        ];
        let token = env.seal_parts(b"hello", 499_162_800, &iv);
        assert_eq!(
            token,
            "gAAAAAAdwJ6wEBESExQVFhcYGRobHB0eH7MVoJwBJDmy4UbB1AeW3ldlsRSgitdRuiGrHetrew5UCmTeWBv5GkfBRsmRgGHdxA"
        );
    }

    #[test]
    fn interop_unseal_reference_token() {
        let env = test_envelope();
        let plain = env
            .unseal("gAAAAAAdwJ6wEBESExQVFhcYGRobHB0eH7MVoJwBJDmy4UbB1AeW3ldlsRSgitdRuiGrHetrew5UCmTeWBv5GkfBRsmRgGHdxA")
            .expect("reference token should unseal");
        assert_eq!(plain.expose(), b"hello");
    }

    #[test]
    fn interop_unseal_reference_json_token() {
        let env = test_envelope();
        let plain = env
            .unseal("gAAAAABlU_EAq6urq6urq6urq6urq6urq8ziRr9_G7Xh--gWKs1qQcUSEx3hVQUNIyPR5sDOhsxwd6qCcha81mYQtorsiBTG8ZLIzlXRov1iIR5zGfuZ-B0")
            .expect("reference token should unseal");
        assert_eq!(plain.expose(), b"{\"firstName\":\"Ada\"}");
    }
}
