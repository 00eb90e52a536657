//! The user profile record — the payload the envelope seals.
//!
//! The record is what the client holds after a successful login and what it
//! serializes, seals, and submits at account creation. Field names follow
//! the server's JSON convention (camelCase). The canonical payload is the
//! serde_json rendering in struct field order; login only requires that the
//! unsealed JSON parses back into an equal record, not byte equality.

use crate::error::AccountError;
use serde::{Deserialize, Serialize};

/// A user's profile attributes, as sealed inside the envelope token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    /// Preferred first name.
    pub first_name: String,
    /// Preferred last name.
    pub last_name: String,
    /// Contact e-mail address.
    pub email: String,
    /// Date of birth as an ISO `YYYY-MM-DD` string.
    pub date_of_birth: String,
    /// Salutation (e.g. `mr`, `dr`, `mx`).
    pub title: String,
    /// Self-described gender.
    pub gender: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    /// Whether the legal name differs from the preferred name.
    pub legal_name_different: bool,
    /// Legal first name (empty when not different).
    pub legal_first_name: String,
    /// Legal last name (empty when not different).
    pub legal_last_name: String,
    /// Legal gender (empty when not different).
    pub legal_gender: String,
}

impl ProfileRecord {
    /// Serialize to the canonical JSON payload sealed by the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Profile`] if serialization fails.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, AccountError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a record from unsealed JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Profile`] if the payload is not a valid
    /// profile record.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, AccountError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample() -> ProfileRecord {
        ProfileRecord {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.org".into(),
            date_of_birth: "1815-12-10".into(),
            title: "ms".into(),
            gender: "female".into(),
            country: "UK".into(),
            legal_name_different: false,
            legal_first_name: String::new(),
            legal_last_name: String::new(),
            legal_gender: String::new(),
        }
    }

    #[test]
    fn canonical_json_roundtrip() {
        let profile = sample();
        let json = profile.to_canonical_json().expect("serialize");
        let back = ProfileRecord::from_json_slice(&json).expect("parse");
        assert_eq!(profile, back);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let json = String::from_utf8(sample().to_canonical_json().expect("serialize"))
            .expect("utf-8");
        assert!(json.contains("\"firstName\""));
        assert!(json.contains("\"dateOfBirth\""));
        assert!(json.contains("\"legalNameDifferent\""));
        assert!(!json.contains("first_name"));
    }

    #[test]
    fn parses_server_shaped_json() {
        let json = br#"{
            "firstName": "Grace",
            "lastName": "Hopper",
            "email": "grace@example.org",
            "dateOfBirth": "1906-12-09",
            "title": "dr",
            "gender": "female",
            "country": "US",
            "legalNameDifferent": true,
            "legalFirstName": "Grace",
            "legalLastName": "Murray Hopper",
            "legalGender": "female"
        }"#;
        let profile = ProfileRecord::from_json_slice(json).expect("parse");
        assert_eq!(profile.last_name, "Hopper");
        assert!(profile.legal_name_different);
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let result = ProfileRecord::from_json_slice(b"not json at all");
        assert!(matches!(result, Err(AccountError::Profile(_))));
    }
}
