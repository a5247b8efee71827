//! CBOR processing for ceremony challenges
//!
//! The server wraps the credential options in CBOR and transports the blob as
//! base64url text. Only the first CBOR item is read; trailing bytes are ignored.

use ciborium::de::from_reader;
use ciborium::value::Value;

use super::errors::CeremonyError;
use super::types::{ChallengeData, FlowMode};
use crate::utils::base64url::base64url_to_buffer;

/// Decode the first CBOR item from a byte buffer
///
/// # Errors
///
/// Returns `CeremonyError::Decode` if the buffer does not start with a
/// well-formed CBOR item.
pub fn decode_first(buffer: &[u8]) -> Result<Value, CeremonyError> {
    from_reader(buffer).map_err(|e| CeremonyError::Decode(format!("Invalid CBOR challenge: {e}")))
}

/// Decode the credential options carried by a challenge
///
/// For `sign` this is the request options value itself. For `enroll` it is
/// the `publicKey` entry of the decoded map; a missing entry yields CBOR
/// `null` and is left for the platform to reject.
///
/// # Errors
///
/// Returns an error if the mode's challenge field is absent, is not valid
/// base64url, or does not decode as CBOR.
pub fn decode_challenge_options(
    challenge: &ChallengeData,
    mode: FlowMode,
) -> Result<Value, CeremonyError> {
    // 1. Pick the field for this mode
    let encoded = challenge.encoded_options(mode).ok_or_else(|| {
        CeremonyError::Decode(format!("Missing {} in challenge", mode.challenge_field()))
    })?;

    // 2. base64url -> bytes
    let bytes = base64url_to_buffer(encoded)?;

    // 3. First CBOR item
    let decoded = decode_first(&bytes)?;
    log::debug!(
        "Decoded {} challenge ({} bytes, map: {})",
        mode,
        bytes.len(),
        decoded.is_map()
    );

    Ok(match mode {
        FlowMode::Sign => decoded,
        FlowMode::Enroll => map_entry(&decoded, "publicKey").cloned().unwrap_or(Value::Null),
    })
}

/// Look up a text key in a CBOR map
#[must_use]
pub fn map_entry<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_map().and_then(|map| {
        map.iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::base64url::buffer_to_base64url;

    fn encode(value: &Value) -> String {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(value, &mut bytes).unwrap();
        buffer_to_base64url(&bytes)
    }

    #[test]
    fn test_decode_sign_options() {
        let options = Value::Map(vec![(
            Value::Text("challenge".into()),
            Value::Bytes(vec![1, 2, 3]),
        )]);
        let challenge = ChallengeData::for_sign(encode(&options));

        let decoded = decode_challenge_options(&challenge, FlowMode::Sign).unwrap();
        assert_eq!(decoded, options);
    }

    #[test]
    fn test_decode_enroll_extracts_public_key() {
        let public_key = Value::Map(vec![(
            Value::Text("rp".into()),
            Value::Map(vec![(Value::Text("id".into()), Value::Text("example.com".into()))]),
        )]);
        let wrapper = Value::Map(vec![(Value::Text("publicKey".into()), public_key.clone())]);
        let challenge = ChallengeData::for_enroll(encode(&wrapper));

        let decoded = decode_challenge_options(&challenge, FlowMode::Enroll).unwrap();
        assert_eq!(decoded, public_key);
    }

    #[test]
    fn test_decode_enroll_without_public_key_is_null() {
        let challenge = ChallengeData::for_enroll(encode(&Value::Map(vec![])));
        let decoded = decode_challenge_options(&challenge, FlowMode::Enroll).unwrap();
        assert_eq!(decoded, Value::Null);
    }

    #[test]
    fn test_decode_first_ignores_trailing_items() {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&Value::Integer(7_u8.into()), &mut bytes).unwrap();
        ciborium::ser::into_writer(&Value::Text("ignored".into()), &mut bytes).unwrap();

        assert_eq!(decode_first(&bytes).unwrap(), Value::Integer(7_u8.into()));
    }

    #[test]
    fn test_decode_failures() {
        // Field for the wrong mode
        let challenge = ChallengeData::for_sign(encode(&Value::Map(vec![])));
        assert!(matches!(
            decode_challenge_options(&challenge, FlowMode::Enroll),
            Err(CeremonyError::Decode(_))
        ));

        // Not base64url
        let challenge = ChallengeData::for_sign("%%%");
        assert!(matches!(
            decode_challenge_options(&challenge, FlowMode::Sign),
            Err(CeremonyError::Codec(_))
        ));

        // Truncated CBOR: a map header promising one entry
        let challenge = ChallengeData::for_sign(buffer_to_base64url(&[0xa1]));
        assert!(matches!(
            decode_challenge_options(&challenge, FlowMode::Sign),
            Err(CeremonyError::Decode(_))
        ));
    }
}
