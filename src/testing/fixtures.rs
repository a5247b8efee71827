//! Test fixtures providing pre-built challenges and credentials
//!
//! Challenges are real CBOR blobs so tests exercise the same decode path as
//! a server-issued challenge.

use ciborium::value::Value;

use super::constants::{TEST_CHALLENGE_BYTES, TEST_CREDENTIAL_ID, TEST_RP_ID};
use crate::utils::base64url::buffer_to_base64url;
use crate::webauthn::{ChallengeData, PublicKeyCredential};

/// Central fixture provider for ceremony test data
pub struct TestFixtures;

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

impl TestFixtures {
    /// CBOR-encode a value and wrap it in base64url
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be serialized as CBOR.
    #[must_use]
    pub fn encode_cbor(value: &Value) -> String {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(value, &mut bytes).unwrap();
        buffer_to_base64url(&bytes)
    }

    /// Request options a sign challenge decodes to
    #[must_use]
    pub fn sign_options() -> Value {
        Value::Map(vec![
            (text("challenge"), Value::Bytes(TEST_CHALLENGE_BYTES.to_vec())),
            (text("timeout"), Value::Integer(60_000_u32.into())),
            (text("rpId"), text(TEST_RP_ID)),
            (
                text("allowCredentials"),
                Value::Array(vec![Value::Map(vec![
                    (text("type"), text("public-key")),
                    (text("id"), Value::Bytes(TEST_CREDENTIAL_ID.as_bytes().to_vec())),
                ])]),
            ),
            (text("userVerification"), text("discouraged")),
        ])
    }

    /// The `publicKey` entry an enroll challenge carries
    #[must_use]
    pub fn enroll_public_key() -> Value {
        Value::Map(vec![
            (text("challenge"), Value::Bytes(TEST_CHALLENGE_BYTES.to_vec())),
            (
                text("rp"),
                Value::Map(vec![(text("id"), text(TEST_RP_ID)), (text("name"), text("Example"))]),
            ),
            (
                text("user"),
                Value::Map(vec![
                    (text("id"), Value::Bytes(vec![1, 2, 3, 4])),
                    (text("name"), text("test@example.com")),
                    (text("displayName"), text("Test User")),
                ]),
            ),
            (
                text("pubKeyCredParams"),
                Value::Array(vec![Value::Map(vec![
                    (text("type"), text("public-key")),
                    (text("alg"), Value::Integer((-7_i64).into())),
                ])]),
            ),
        ])
    }

    /// Sign challenge with an unrelated extra field
    #[must_use]
    pub fn sign_challenge() -> ChallengeData {
        let mut challenge = ChallengeData::for_sign(Self::encode_cbor(&Self::sign_options()));
        challenge.extra.insert(
            "appId".to_string(),
            serde_json::Value::String(format!("https://{TEST_RP_ID}")),
        );
        challenge
    }

    /// Enroll challenge wrapping [`enroll_public_key`](Self::enroll_public_key)
    #[must_use]
    pub fn enroll_challenge() -> ChallengeData {
        let wrapped = Value::Map(vec![(text("publicKey"), Self::enroll_public_key())]);
        ChallengeData::for_enroll(Self::encode_cbor(&wrapped))
    }

    #[must_use]
    pub fn assertion_credential() -> PublicKeyCredential {
        PublicKeyCredential::assertion(
            TEST_CREDENTIAL_ID,
            br#"{"type":"webauthn.get","challenge":"dGVzdA"}"#.to_vec(),
            vec![0x30, 0x45, 0x02, 0x21, 0xfb, 0xff],
            vec![0x49, 0x96, 0x0d, 0xe5, 0x01],
        )
    }

    #[must_use]
    pub fn attestation_credential() -> PublicKeyCredential {
        PublicKeyCredential::attestation(
            TEST_CREDENTIAL_ID,
            vec![0xde, 0xad, 0xbe, 0xef],
            br#"{"type":"webauthn.create","challenge":"dGVzdA"}"#.to_vec(),
            vec![0xa3, 0x63, 0x66, 0x6d, 0x74],
        )
    }
}
