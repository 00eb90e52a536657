//! URL-safe base64 codec — the transport encoding for salts, keys, and tokens.
//!
//! Everything that crosses the wire in this protocol (salts, derived keys,
//! envelope tokens) travels as URL-safe base64 **without** padding. Peers are
//! not all consistent about emitting padding or canonical trailing bits, so
//! [`decode`] accepts padded or unpadded input and tolerates non-zero
//! trailing bits (matching the lenient decoders on the other side of the
//! wire); [`encode`] always emits canonical unpadded output.

use crate::error::CryptoError;
use data_encoding::{Encoding, Specification, BASE64URL_NOPAD};
use std::sync::LazyLock;

/// Lenient decoder: URL-safe alphabet, no padding, trailing bits ignored.
static BASE64URL_LENIENT: LazyLock<Encoding> = LazyLock::new(|| {
    let mut spec = Specification::new();
    spec.symbols
        .push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_");
    spec.check_trailing_bits = false;
    spec.encoding()
        .expect("static base64url specification is valid")
});

/// Encode bytes as URL-safe base64 with the `=` padding stripped.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    BASE64URL_NOPAD.encode(bytes)
}

/// Decode URL-safe base64 text into bytes.
///
/// Trailing `=` padding is stripped before decoding, so both padded and
/// unpadded input are accepted; non-zero trailing bits are ignored rather
/// than rejected.
///
/// # Errors
///
/// Returns [`CryptoError::Decode`] if the input contains characters outside
/// the URL-safe alphabet or has an impossible length.
pub fn decode(text: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = text.trim_end_matches('=');
    BASE64URL_LENIENT
        .decode(trimmed.as_bytes())
        .map_err(|e| CryptoError::Decode(e.to_string()))
}
