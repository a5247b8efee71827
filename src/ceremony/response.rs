//! Canonical response encoding
//!
//! Turns the credential returned by the platform into the JSON string the
//! relying party expects for each flow.

use serde::Serialize;

use crate::utils::base64url::buffer_to_base64url;
use crate::webauthn::{FlowMode, PublicKeyCredential};

/// Sign response, shaped for the U2F-era server endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse<'a> {
    key_handle: &'a str,
    client_data: String,
    signature_data: String,
    authenticator_data: String,
}

#[derive(Debug, Serialize)]
struct EnrollAttestation {
    #[serde(rename = "attestationObject")]
    attestation_object: String,
    #[serde(rename = "clientDataJSON")]
    client_data_json: String,
}

/// Enroll response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnrollResponse<'a> {
    id: &'a str,
    raw_id: String,
    response: EnrollAttestation,
    #[serde(rename = "type")]
    r#type: String,
}

fn encode_optional(bytes: Option<&[u8]>) -> String {
    bytes.map_or_else(String::new, buffer_to_base64url)
}

/// Encode a platform credential for delivery
///
/// A credential without an authenticator response is serialized as-is.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn encode_credential(
    credential: &PublicKeyCredential,
    mode: FlowMode,
) -> Result<String, serde_json::Error> {
    let Some(response) = credential.response.as_ref() else {
        return serde_json::to_string(credential);
    };

    match mode {
        FlowMode::Sign => serde_json::to_string(&SignResponse {
            key_handle: &credential.id,
            client_data: buffer_to_base64url(&response.client_data_json),
            signature_data: encode_optional(response.signature.as_deref()),
            authenticator_data: encode_optional(response.authenticator_data.as_deref()),
        }),
        FlowMode::Enroll => serde_json::to_string(&EnrollResponse {
            id: &credential.id,
            raw_id: buffer_to_base64url(&credential.raw_id),
            response: EnrollAttestation {
                attestation_object: encode_optional(response.attestation_object.as_deref()),
                client_data_json: buffer_to_base64url(&response.client_data_json),
            },
            // The credential type is a plain string but the server historically
            // receives it base64url-encoded like the binary fields.
            r#type: buffer_to_base64url(credential.r#type.as_bytes()),
        }),
    }
}
