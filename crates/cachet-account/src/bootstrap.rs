//! Credential bootstrap flows — account creation, login, unlock.
//!
//! Each flow is a straight-line ceremony over one attempt. Nothing is
//! retained between attempts and nothing resumes: a failure at any step
//! aborts the whole flow and a fresh attempt starts from the beginning.
//! Dropping the returned future abandons the flow; the session context is
//! only written after a fully successful unseal, so an abandoned flow never
//! leaves half-updated state behind.
//!
//! Login and unlock collapse every post-transport failure into the generic
//! [`AccountError::LoginFailed`]: a wrong password, a mismatched salt, and a
//! corrupted envelope must be indistinguishable to an observer.

use crate::api::{AccountApi, CipherBundle, CreateAccountPayload, LoginPayload};
use crate::credentials;
use crate::error::AccountError;
use crate::profile::ProfileRecord;
use crate::session::SessionContext;
use cachet_crypto_core::Envelope;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Parameters for the account-creation flow.
///
/// The caller has already collected the profile and a password meeting the
/// strength policy, and has provisioned a TOTP secret via
/// [`AccountApi::fetch_totp_secret`] (the secret is displayed for enrollment
/// before submission).
pub struct CreateAccountRequest<'a> {
    /// The profile to seal and submit.
    pub profile: &'a ProfileRecord,
    /// The user's password. Never transmitted.
    pub password: &'a str,
    /// Free-form information submitted alongside the profile.
    pub additional_information: &'a str,
    /// TOTP secret provisioned for this account.
    pub totp_secret: &'a str,
}

/// Parameters for the login flow.
pub struct LoginRequest<'a> {
    /// Account e-mail address.
    pub email: &'a str,
    /// The user's password. Transmitted for server-side verification only
    /// alongside the second factor; the encryption key derived from it
    /// never leaves the client.
    pub password: &'a str,
    /// Six-digit TOTP code.
    pub totp_code: &'a str,
}

// ---------------------------------------------------------------------------
// Account creation
// ---------------------------------------------------------------------------

/// Run the account-creation flow.
///
/// Ceremony:
/// 1. Request a fresh salt from the server
/// 2. Derive the auth hash and the encryption key concurrently from that
///    salt (distinct peppers and iteration counts)
/// 3. Serialize the profile canonically and seal it with the encryption key
/// 4. Submit the plaintext-visible fields, auth hash, envelope, salt, and
///    TOTP secret — never the password, never the encryption key
///
/// Either the full payload is submitted or nothing is; there is no partial
/// submission and no retry.
///
/// # Errors
///
/// - [`AccountError::Transport`] if a server exchange fails
/// - [`AccountError::Rejected`] if the server declines the submission
/// - [`AccountError::Crypto`] if derivation or sealing fails
pub async fn create_account(
    api: &AccountApi,
    req: &CreateAccountRequest<'_>,
) -> Result<(), AccountError> {
    // Step 1: fresh salt.
    let salt = api.fetch_salt().await?;

    // Step 2: both derivations share the salt; neither depends on the other,
    // so they run concurrently on the blocking pool.
    let (auth_hash, encryption_key) =
        credentials::derive_credentials(req.password, &salt).await?;

    // Step 3: canonical payload, sealed.
    let payload_bytes = req.profile.to_canonical_json()?;
    let envelope = Envelope::new(encryption_key.as_str())?;
    let cipher = envelope.seal(&payload_bytes)?;
    debug!("profile sealed for submission");

    // Step 4: full submission.
    let payload = CreateAccountPayload {
        first_name: req.profile.first_name.clone(),
        last_name: req.profile.last_name.clone(),
        email: req.profile.email.clone(),
        date_of_birth: req.profile.date_of_birth.clone(),
        title: req.profile.title.clone(),
        gender: req.profile.gender.clone(),
        country: req.profile.country.clone(),
        legal_name_different: req.profile.legal_name_different,
        legal_first_name: req.profile.legal_first_name.clone(),
        legal_last_name: req.profile.legal_last_name.clone(),
        legal_gender: req.profile.legal_gender.clone(),
        additional_information: req.additional_information.to_owned(),
        hash: auth_hash.as_str().to_owned(),
        cipher,
        salt,
        totp: req.totp_secret.to_owned(),
    };
    api.create(&payload).await?;

    info!("account creation confirmed");
    Ok(())
}

// ---------------------------------------------------------------------------
// Login / unlock
// ---------------------------------------------------------------------------

/// Run the login flow.
///
/// Ceremony:
/// 1. Submit e-mail, password, and TOTP code; the server answers with the
///    salt and the sealed envelope only after verifying them
/// 2. Re-derive the encryption key from the entered password and the
///    returned salt with the same parameters as creation
/// 3. Unseal the envelope and parse the profile
/// 4. Install the profile as the active identity (last success wins)
///
/// # Errors
///
/// - [`AccountError::Transport`] if the network exchange itself fails
/// - [`AccountError::LoginFailed`] for everything else — rejection, wrong
///   password, and corrupt envelope are deliberately indistinguishable
pub async fn login(
    api: &AccountApi,
    req: &LoginRequest<'_>,
    session: &SessionContext,
) -> Result<ProfileRecord, AccountError> {
    // Step 1: authenticate against the server.
    let bundle = api
        .login(&LoginPayload {
            email: req.email.to_owned(),
            password: req.password.to_owned(),
            code: req.totp_code.to_owned(),
        })
        .await
        .map_err(generic_login_failure)?;

    // Steps 2-4.
    unseal_into_session(req.password, &bundle, session).await
}

/// Run the unlock flow for an already-recognised session.
///
/// Ceremony:
/// 1. Probe the server's session recognition
/// 2. Fetch the sealed envelope and salt
/// 3. Re-derive the encryption key from the entered password
/// 4. Unseal and install the profile as the active identity
///
/// # Errors
///
/// - [`AccountError::NotAuthenticated`] if the server does not recognise
///   the session
/// - [`AccountError::Transport`] if a network exchange itself fails
/// - [`AccountError::LoginFailed`] for everything else
pub async fn unlock(
    api: &AccountApi,
    password: &str,
    session: &SessionContext,
) -> Result<ProfileRecord, AccountError> {
    // Step 1: recognition probe. A rejection here is public information
    // (no session), not an oracle.
    api.check().await.map_err(|err| match err {
        AccountError::Transport(_) => err,
        _ => AccountError::NotAuthenticated,
    })?;

    // Step 2: fetch the envelope.
    let bundle = api.fetch_cipher().await.map_err(generic_login_failure)?;

    // Steps 3-4.
    unseal_into_session(password, &bundle, session).await
}

/// Shared tail of login and unlock: derive, unseal, parse, install.
async fn unseal_into_session(
    password: &str,
    bundle: &CipherBundle,
    session: &SessionContext,
) -> Result<ProfileRecord, AccountError> {
    let key = credentials::derive_encryption_key(password, &bundle.salt)
        .await
        .map_err(generic_login_failure)?;

    let envelope = Envelope::new(key.as_str()).map_err(|_| AccountError::LoginFailed)?;
    let plaintext = envelope
        .unseal(&bundle.cipher)
        .map_err(|_| AccountError::LoginFailed)?;
    let profile = ProfileRecord::from_json_slice(plaintext.expose())
        .map_err(|_| AccountError::LoginFailed)?;

    session.replace(profile.clone());
    info!("active identity installed");
    Ok(profile)
}

/// Collapse a failure into the generic login error, keeping transport
/// failures distinguishable (they say nothing about credentials). The log
/// line deliberately omits which step failed.
fn generic_login_failure(err: AccountError) -> AccountError {
    match err {
        AccountError::Transport(_) => err,
        _ => {
            debug!("login flow step failed");
            AccountError::LoginFailed
        }
    }
}
