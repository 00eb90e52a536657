//! `cachet-account` — the credential bootstrap protocol.
//!
//! From a plaintext password and a server-issued salt this crate derives a
//! server-verifiable auth hash and a separate envelope encryption key,
//! seals/unseals the user's profile record, and orchestrates the three
//! flows against the remote account service:
//!
//! - **account creation** — salt fetch, concurrent derivation, seal, submit
//! - **login** — authenticate, re-derive, unseal, install identity
//! - **unlock** — recognised-session variant of login
//!
//! The deterministic primitives live in `cachet-crypto-core`; this crate
//! owns the protocol constants (peppers, iteration counts), the wire DTOs,
//! and the session state.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;

pub mod profile;

pub mod credentials;

pub mod api;

pub mod bootstrap;

pub mod session;

pub mod authorize;

pub use api::{AccountApi, ApiConfig, CipherBundle, CreateAccountPayload, LoginPayload};
pub use authorize::{authorize_email, AuthToken};
pub use bootstrap::{create_account, login, unlock, CreateAccountRequest, LoginRequest};
pub use credentials::{
    auth_hash, derive_credentials, derive_encryption_key, encryption_key,
    AUTH_HASH_ITERATIONS, ENCRYPTION_KEY_ITERATIONS, KEY_BITS,
};
pub use error::AccountError;
pub use profile::ProfileRecord;
pub use session::{ActiveIdentity, SessionContext};
