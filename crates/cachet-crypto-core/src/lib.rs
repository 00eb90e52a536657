//! `cachet-crypto-core` — Pure cryptographic primitives for CACHET.
//!
//! This crate is the audit target: zero network, zero async dependencies.
//! It holds the deterministic pieces the bootstrap protocol depends on for
//! interoperability — the base64url transport codec, PBKDF2 key stretching,
//! and the Fernet-compatible authenticated envelope.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod encoding;

pub mod kdf;

pub mod envelope;

pub use encoding::{decode, encode};
pub use envelope::Envelope;
pub use error::CryptoError;
pub use kdf::{derive, DerivedKey, HashAlgorithm, KdfParams};
pub use memory::SecretBuffer;
