//! Base64URL codec for credential fields
//!
//! Binary `WebAuthn` fields travel as URL-safe base64 without padding. Decoding
//! accepts both padded and unpadded input.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::webauthn::CodecError;

/// URL-safe engine: never pads on encode, tolerates padding on decode
const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode a byte buffer as unpadded base64url
#[must_use]
pub fn buffer_to_base64url(buffer: &[u8]) -> String {
    BASE64URL.encode(buffer)
}

/// Decode base64url text into a byte buffer
///
/// Padding is restored before decoding and standard-alphabet characters
/// (`+`, `/`) are translated, so values produced by non-URL-safe encoders
/// still decode.
///
/// # Errors
///
/// Returns a `CodecError` if the text is not valid base64url.
pub fn base64url_to_buffer(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut normalized: String = text
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let padding = padding_for(normalized.len());
    normalized.extend(std::iter::repeat('=').take(padding));

    BASE64URL
        .decode(normalized.as_bytes())
        .map_err(|e| CodecError::InvalidBase64Url(e.to_string()))
}

/// Number of `=` characters needed to pad `len` base64 characters
fn padding_for(len: usize) -> usize {
    (4 - len % 4) % 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_uses_url_safe_alphabet_without_padding() {
        // 0xfb 0xff encodes to "+/8=" in standard base64
        assert_eq!(buffer_to_base64url(&[0xfb, 0xff]), "-_8");
        assert_eq!(buffer_to_base64url(b"public-key"), "cHVibGljLWtleQ");
        assert_eq!(buffer_to_base64url(&[]), "");
    }

    #[test]
    fn test_decode_accepts_padded_and_unpadded() {
        assert_eq!(base64url_to_buffer("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(base64url_to_buffer("-_8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(base64url_to_buffer("+/8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(base64url_to_buffer("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(base64url_to_buffer("not base64!").is_err());
        // A single trailing character can never be a complete quantum
        assert!(base64url_to_buffer("abcde").is_err());
    }

    #[test]
    fn test_padding_for() {
        assert_eq!(padding_for(0), 0);
        assert_eq!(padding_for(2), 2);
        assert_eq!(padding_for(3), 1);
        assert_eq!(padding_for(8), 0);
    }

    proptest! {
        #[test]
        fn buffer_survives_base64url(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let encoded = buffer_to_base64url(&bytes);
            prop_assert!(!encoded.contains('='));
            prop_assert_eq!(base64url_to_buffer(&encoded).unwrap(), bytes);
        }

        #[test]
        fn canonical_text_survives_buffer(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            // Every canonical unpadded string is the encoding of some buffer
            let text = buffer_to_base64url(&bytes);
            let decoded = base64url_to_buffer(&text).unwrap();
            prop_assert_eq!(buffer_to_base64url(&decoded), text);
        }
    }
}
