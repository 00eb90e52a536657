//! E-mail authorization hand-off.
//!
//! Third-party services confirm an e-mail address by sending the user here
//! with an opaque token. The token is URL-safe base64 JSON naming the
//! requesting service's endpoint (`url`), where to send the user afterwards
//! (`redirect`), and a bearer secret. The client authorizes only when the
//! endpoint and redirect agree on their hostname and an identity is active,
//! then hands the user to the redirect.

use crate::api::AccountApi;
use crate::error::AccountError;
use crate::session::SessionContext;
use cachet_crypto_core::encoding;
use serde::Deserialize;
use std::fmt;
use tracing::info;

/// A parsed and validated e-mail authorization token.
#[derive(Clone, Deserialize)]
pub struct AuthToken {
    url: String,
    redirect: String,
    secret: String,
}

impl AuthToken {
    /// Parse a token from its URL-safe base64 text form and validate that
    /// the endpoint and redirect share a hostname.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidAuthToken`] if the token does not
    /// decode, does not parse, carries unparseable URLs, or if the endpoint
    /// and redirect hostnames differ.
    pub fn parse(token_b64url: &str) -> Result<Self, AccountError> {
        let bytes = encoding::decode(token_b64url)
            .map_err(|e| AccountError::InvalidAuthToken(e.to_string()))?;
        let token: Self = serde_json::from_slice(&bytes)
            .map_err(|e| AccountError::InvalidAuthToken(e.to_string()))?;
        token.validate()?;
        Ok(token)
    }

    fn validate(&self) -> Result<(), AccountError> {
        let url = reqwest::Url::parse(&self.url)
            .map_err(|e| AccountError::InvalidAuthToken(format!("bad service url: {e}")))?;
        let redirect = reqwest::Url::parse(&self.redirect)
            .map_err(|e| AccountError::InvalidAuthToken(format!("bad redirect url: {e}")))?;
        if url.host_str().is_none() || url.host_str() != redirect.host_str() {
            return Err(AccountError::InvalidAuthToken(
                "service and redirect hostnames differ".into(),
            ));
        }
        Ok(())
    }

    /// The requesting service's authorization endpoint.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Where to send the user after authorization.
    #[must_use]
    pub fn redirect(&self) -> &str {
        &self.redirect
    }

    /// The bearer secret to present to the service.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("url", &self.url)
            .field("redirect", &self.redirect)
            .field("secret", &"***")
            .finish()
    }
}

/// Authorize an e-mail action and return the redirect target.
///
/// Requires an active identity — an anonymous client must not be able to
/// confirm e-mail ownership.
///
/// # Errors
///
/// - [`AccountError::NotAuthenticated`] if no identity is active
/// - [`AccountError::Transport`] / [`AccountError::Rejected`] if the server
///   exchange fails
pub async fn authorize_email(
    api: &AccountApi,
    session: &SessionContext,
    token: &AuthToken,
) -> Result<String, AccountError> {
    if !session.is_authenticated() {
        return Err(AccountError::NotAuthenticated);
    }
    api.authorize_email(token.url(), token.secret()).await?;
    info!("e-mail authorization granted");
    Ok(token.redirect().to_owned())
}
