//! `WebAuthn` ceremony types
//!
//! This module defines the data crossing the ceremony boundary: the challenge
//! issued by the server, the credential returned by the platform, and the
//! submission handed back to the host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::CeremonyError;

/// Which ceremony is being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FlowMode {
    /// Authenticate with an already registered credential
    Sign,
    /// Register a new credential
    Enroll,
}

impl FlowMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FlowMode::Sign => "sign",
            FlowMode::Enroll => "enroll",
        }
    }

    /// Challenge field carrying the CBOR options for this mode
    #[must_use]
    pub fn challenge_field(self) -> &'static str {
        match self {
            FlowMode::Sign => "webAuthnAuthenticationData",
            FlowMode::Enroll => "webAuthnRegisterData",
        }
    }
}

impl fmt::Display for FlowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowMode {
    type Err = CeremonyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sign" => Ok(FlowMode::Sign),
            "enroll" => Ok(FlowMode::Enroll),
            other => Err(CeremonyError::UnsupportedMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for FlowMode {
    type Error = CeremonyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Server-issued challenge payload
///
/// Only the field matching the flow mode is read. Everything else is kept so
/// the payload serializes back to the host unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeData {
    #[serde(
        rename = "webAuthnAuthenticationData",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub authentication_data: Option<String>,
    #[serde(
        rename = "webAuthnRegisterData",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub register_data: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChallengeData {
    /// Challenge for a sign ceremony
    pub fn for_sign(authentication_data: impl Into<String>) -> Self {
        Self {
            authentication_data: Some(authentication_data.into()),
            ..Self::default()
        }
    }

    /// Challenge for an enroll ceremony
    pub fn for_enroll(register_data: impl Into<String>) -> Self {
        Self {
            register_data: Some(register_data.into()),
            ..Self::default()
        }
    }

    /// Base64url CBOR blob for the given mode
    #[must_use]
    pub fn encoded_options(&self, mode: FlowMode) -> Option<&str> {
        match mode {
            FlowMode::Sign => self.authentication_data.as_deref(),
            FlowMode::Enroll => self.register_data.as_deref(),
        }
    }

    /// JSON form sent alongside the response
    ///
    /// # Errors
    ///
    /// Returns an error if an extra field cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Authenticator response attached to a credential
///
/// Assertions (sign) fill `signature` and `authenticator_data`; attestations
/// (enroll) fill `attestation_object`. Absent fields encode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorResponse {
    #[serde(rename = "clientDataJSON", default)]
    pub client_data_json: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signature: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub authenticator_data: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attestation_object: Option<Vec<u8>>,
}

/// Credential returned by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredential {
    pub id: String,
    #[serde(default)]
    pub raw_id: Vec<u8>,
    #[serde(rename = "type", default = "default_credential_type")]
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub response: Option<AuthenticatorResponse>,
}

fn default_credential_type() -> String {
    "public-key".to_string()
}

impl PublicKeyCredential {
    /// Credential carrying an assertion response
    pub fn assertion(
        id: impl Into<String>,
        client_data_json: Vec<u8>,
        signature: Vec<u8>,
        authenticator_data: Vec<u8>,
    ) -> Self {
        let id = id.into();
        Self {
            raw_id: id.as_bytes().to_vec(),
            id,
            r#type: default_credential_type(),
            response: Some(AuthenticatorResponse {
                client_data_json,
                signature: Some(signature),
                authenticator_data: Some(authenticator_data),
                ..AuthenticatorResponse::default()
            }),
        }
    }

    /// Credential carrying an attestation response
    pub fn attestation(
        id: impl Into<String>,
        raw_id: Vec<u8>,
        client_data_json: Vec<u8>,
        attestation_object: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            raw_id,
            r#type: default_credential_type(),
            response: Some(AuthenticatorResponse {
                client_data_json,
                attestation_object: Some(attestation_object),
                ..AuthenticatorResponse::default()
            }),
        }
    }
}

/// What the ceremony hands back to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapSubmission {
    /// Canonical response JSON
    pub response: String,
    /// JSON of the original challenge data
    pub challenge: String,
}

/// Host-facing ceremony configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CeremonyProps {
    pub challenge_data: ChallengeData,
    pub flow_mode: FlowMode,
    #[serde(default)]
    pub silent_if_unsupported: bool,
}
