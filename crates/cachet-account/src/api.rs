//! HTTP client for the remote account service.
//!
//! [`AccountApi`] wraps a `reqwest::Client` with the service's endpoint set.
//! Salts, derived hashes, and envelope tokens all cross this boundary as
//! URL-safe unpadded base64 text inside JSON bodies (or as plain text for
//! the salt/TOTP provisioning calls).
//!
//! There is deliberately **no retry logic** at this layer: a failed exchange
//! aborts the surrounding flow, and only an explicit user-initiated restart
//! tries again.

use crate::error::AccountError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Account-service client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Service origin, e.g. `https://accounts.example.org`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ApiConfig {
    /// Configuration with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Full account-creation submission.
///
/// Carries the plaintext-visible profile fields (for server-side indexing),
/// the auth hash, the sealed profile envelope, the salt both were derived
/// from, and the TOTP secret — never the password, never the encryption key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub title: String,
    pub gender: String,
    pub country: String,
    pub legal_name_different: bool,
    pub legal_first_name: String,
    pub legal_last_name: String,
    pub legal_gender: String,
    pub additional_information: String,
    /// Server-verifiable auth hash (URL-safe base64).
    pub hash: String,
    /// Sealed profile envelope token.
    pub cipher: String,
    /// The server-issued salt both derivations used.
    pub salt: String,
    /// TOTP secret provisioned for this account.
    pub totp: String,
}

/// Login submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
    /// Six-digit TOTP code.
    pub code: String,
}

/// Salt + sealed envelope, as returned by login and the unlock path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CipherBundle {
    /// Sealed profile envelope token.
    pub cipher: String,
    /// URL-safe base64 salt to re-derive the encryption key from.
    pub salt: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[allow(dead_code)]
    success: String,
    cipher: String,
    salt: String,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    email: String,
}

/// Generic `{ success }` / `{ error }` server answer.
#[derive(Debug, Deserialize)]
struct ServerMessage {
    #[allow(dead_code)]
    success: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmailAuthorizePayload<'a> {
    url: &'a str,
    token: &'a str,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the remote account service.
#[derive(Debug, Clone)]
pub struct AccountApi {
    client: reqwest::Client,
    base_url: String,
}

impl AccountApi {
    /// Build a client from configuration.
    ///
    /// The client keeps a cookie store: the unlock path depends on the
    /// server recognising an existing session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, AccountError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| AccountError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Request a fresh account-creation salt.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Transport`] on network failure or
    /// [`AccountError::Rejected`] on a non-success status.
    pub async fn fetch_salt(&self) -> Result<String, AccountError> {
        debug!("requesting account-creation salt");
        self.post_text("/api/v1/account/create/salt").await
    }

    /// Request a fresh TOTP secret for enrollment.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Transport`] on network failure or
    /// [`AccountError::Rejected`] on a non-success status.
    pub async fn fetch_totp_secret(&self) -> Result<String, AccountError> {
        debug!("requesting TOTP secret");
        self.post_text("/api/v1/account/create/totp").await
    }

    /// Submit the full account-creation payload.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Transport`] on network failure or
    /// [`AccountError::Rejected`] if the server reports an error.
    pub async fn create(&self, payload: &CreateAccountPayload) -> Result<(), AccountError> {
        debug!("submitting account creation");
        let response = self
            .client
            .post(self.url("/api/v1/account/create"))
            .json(payload)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    /// Submit credentials; on acceptance the server answers with the salt
    /// and the sealed profile envelope.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Transport`] on network failure or
    /// [`AccountError::Rejected`] if the server declines the credentials.
    pub async fn login(&self, payload: &LoginPayload) -> Result<CipherBundle, AccountError> {
        debug!("submitting login");
        let response = self
            .client
            .post(self.url("/api/v1/account/login"))
            .json(payload)
            .send()
            .await?;

        let body: LoginResponse = Self::parse_json(response).await?;
        Ok(CipherBundle {
            cipher: body.cipher,
            salt: body.salt,
        })
    }

    /// Fetch the sealed envelope for an already-recognised session
    /// (unlock path).
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Transport`] on network failure or
    /// [`AccountError::Rejected`] if the session is not recognised.
    pub async fn fetch_cipher(&self) -> Result<CipherBundle, AccountError> {
        debug!("fetching sealed envelope for recognised session");
        let response = self
            .client
            .get(self.url("/api/v1/account/cipher"))
            .send()
            .await?;
        Self::parse_json(response).await
    }

    /// Probe whether the server recognises the current session cookie.
    /// Returns the account e-mail on recognition.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Transport`] on network failure or
    /// [`AccountError::Rejected`] if the session is not recognised.
    pub async fn check(&self) -> Result<String, AccountError> {
        debug!("probing session recognition");
        let response = self
            .client
            .post(self.url("/api/v1/account/check"))
            .send()
            .await?;
        let body: CheckResponse = Self::parse_json(response).await?;
        Ok(body.email)
    }

    /// Authorize an e-mail action token against its origin service.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Transport`] on network failure or
    /// [`AccountError::Rejected`] if the server reports an error.
    pub async fn authorize_email(&self, url: &str, token: &str) -> Result<(), AccountError> {
        debug!("submitting e-mail authorization");
        let response = self
            .client
            .post(self.url("/api/v1/email/authorize"))
            .json(&EmailAuthorizePayload { url, token })
            .send()
            .await?;
        Self::expect_success(response).await
    }

    // -- response plumbing --------------------------------------------------

    async fn post_text(&self, path: &str) -> Result<String, AccountError> {
        let response = self.client.post(self.url(path)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body.trim().to_owned())
        } else {
            Err(Self::rejection(status, &body))
        }
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AccountError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            serde_json::from_str(&body)
                .map_err(|e| AccountError::Transport(format!("unexpected response shape: {e}")))
        } else {
            Err(Self::rejection(status, &body))
        }
    }

    async fn expect_success(response: reqwest::Response) -> Result<(), AccountError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            // Bodies are `{ success }` or `{ error }`; an error body with a
            // 2xx status still counts as a rejection.
            if let Ok(message) = serde_json::from_str::<ServerMessage>(&body) {
                if let Some(error) = message.error {
                    return Err(AccountError::Rejected(error));
                }
            }
            Ok(())
        } else {
            Err(Self::rejection(status, &body))
        }
    }

    fn rejection(status: reqwest::StatusCode, body: &str) -> AccountError {
        if let Ok(message) = serde_json::from_str::<ServerMessage>(body) {
            if let Some(error) = message.error {
                return AccountError::Rejected(error);
            }
        }
        AccountError::Rejected(format!("server answered {status}"))
    }
}
