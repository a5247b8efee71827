//! Error types for credential ceremonies
//!
//! Classified device failures are ceremony *state*, not errors; see
//! [`crate::ceremony::DeviceFailure`]. The types here describe what can go
//! wrong at each seam and which failures are fatal to the host.

use thiserror::Error;

/// Errors from the base64url codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Invalid base64url data: {0}")]
    InvalidBase64Url(String),
}

/// Metadata attached to a platform rejection
///
/// The relying-party integration tags known rejections with a `type` such as
/// `DEVICE_INELIGIBLE` or `BAD_REQUEST`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlatformErrorMetadata {
    #[serde(rename = "type")]
    pub r#type: Option<String>,
}

/// Rejection from the platform credential API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Platform error: {message}")]
pub struct PlatformError {
    pub message: String,
    pub meta_data: Option<PlatformErrorMetadata>,
}

impl PlatformError {
    /// Rejection without metadata
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            meta_data: None,
        }
    }

    /// Rejection tagged with a metadata type
    pub fn with_type(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            meta_data: Some(PlatformErrorMetadata {
                r#type: Some(error_type.into()),
            }),
        }
    }

    /// The metadata `type`, if any
    #[must_use]
    pub fn metadata_type(&self) -> Option<&str> {
        self.meta_data.as_ref().and_then(|m| m.r#type.as_deref())
    }
}

/// Errors raised by a response sink while delivering a submission
#[derive(Debug, Error)]
pub enum SinkError {
    /// The host callback rejected the submission
    #[error("Callback rejected: {0}")]
    Rejected(String),

    /// No form action is configured for the classic form path
    #[error("Form not configured: {0}")]
    NotConfigured(String),

    /// The form post could not be sent or was refused
    #[error("Form submission failed: {0}")]
    Transport(String),
}

/// Errors surfaced by the ceremony API
#[derive(Debug, Error)]
pub enum CeremonyError {
    /// The flow mode is not `sign` or `enroll`; a programmer error
    #[error("Unsupported flow mode '{0}'")]
    UnsupportedMode(String),

    /// Challenge text was not valid base64url
    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),

    /// Challenge data is missing or is not well-formed CBOR
    #[error("Decode error: {0}")]
    Decode(String),

    /// The platform credential API rejected the request
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Delivering the response failed
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The credential response could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The ceremony was asked to move between states that are not connected
    #[error("Invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    /// A retry was requested while no retryable failure is present
    #[error("Retry not allowed: {0}")]
    RetryNotAllowed(String),
}

impl CeremonyError {
    /// Whether this error must propagate to the host instead of becoming
    /// ceremony state
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CeremonyError::UnsupportedMode(_) | CeremonyError::InvalidTransition { .. }
        )
    }
}
