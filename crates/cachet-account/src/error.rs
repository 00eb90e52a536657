//! Error types for `cachet-account`.

use cachet_crypto_core::CryptoError;
use thiserror::Error;

/// Errors produced by account-service operations and bootstrap flows.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Cryptographic operation failed (delegated from crypto-core).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Network or HTTP-level failure talking to the account service.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with an error body or a non-success status.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Generic login/unlock failure. Deliberately carries no detail —
    /// a wrong password, a stale salt, and a corrupted envelope must be
    /// indistinguishable to an observer.
    #[error("login failed")]
    LoginFailed,

    /// Profile record could not be serialized or parsed.
    #[error("profile serialization failed: {0}")]
    Profile(String),

    /// Email-authorization token is unparseable or inconsistent.
    #[error("invalid authorization token: {0}")]
    InvalidAuthToken(String),

    /// The operation requires an active identity and none is set.
    #[error("no active session")]
    NotAuthenticated,

    /// A background derivation task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<reqwest::Error> for AccountError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors can embed the full request URL; keep only the
        // error's own description so logs never carry query material.
        Self::Transport(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for AccountError {
    fn from(err: serde_json::Error) -> Self {
        Self::Profile(err.to_string())
    }
}
