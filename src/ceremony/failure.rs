//! Device failure classification

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::webauthn::{FlowMode, PlatformError};

/// Metadata type for a device that cannot take part in this ceremony
pub const DEVICE_INELIGIBLE: &str = "DEVICE_INELIGIBLE";
/// Metadata type for a request the authenticator refused as malformed
pub const BAD_REQUEST: &str = "BAD_REQUEST";

/// Classified reason a ceremony attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceFailure {
    /// Generic platform rejection or challenge decode failure
    DeviceError,
    /// Enrolling a device that is already registered
    DuplicateDevice,
    /// Signing with a device the server does not know
    UnknownDevice,
    /// App id / registration mismatch; needs out-of-band re-registration
    #[serde(rename = "BAD_APPID")]
    BadAppId,
    /// The host rejected the delivered response
    UnknownError,
}

impl DeviceFailure {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            DeviceFailure::DeviceError => "DEVICE_ERROR",
            DeviceFailure::DuplicateDevice => "DUPLICATE_DEVICE",
            DeviceFailure::UnknownDevice => "UNKNOWN_DEVICE",
            DeviceFailure::BadAppId => "BAD_APPID",
            DeviceFailure::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Whether the user may simply try again
    #[must_use]
    pub fn is_retryable(self) -> bool {
        self != DeviceFailure::BadAppId
    }

    /// Classify a platform rejection for the given flow
    #[must_use]
    pub fn classify(error: &PlatformError, mode: FlowMode) -> Self {
        match error.metadata_type() {
            Some(DEVICE_INELIGIBLE) => match mode {
                FlowMode::Enroll => DeviceFailure::DuplicateDevice,
                FlowMode::Sign => DeviceFailure::UnknownDevice,
            },
            Some(BAD_REQUEST) => DeviceFailure::BadAppId,
            _ => DeviceFailure::DeviceError,
        }
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        let ineligible = PlatformError::with_type("ineligible", DEVICE_INELIGIBLE);
        assert_eq!(
            DeviceFailure::classify(&ineligible, FlowMode::Enroll),
            DeviceFailure::DuplicateDevice
        );
        assert_eq!(
            DeviceFailure::classify(&ineligible, FlowMode::Sign),
            DeviceFailure::UnknownDevice
        );

        let bad_request = PlatformError::with_type("bad request", BAD_REQUEST);
        for mode in [FlowMode::Sign, FlowMode::Enroll] {
            assert_eq!(
                DeviceFailure::classify(&bad_request, mode),
                DeviceFailure::BadAppId
            );
        }

        let unknown = PlatformError::with_type("odd", "TIMEOUT");
        let bare = PlatformError::new("NotAllowedError");
        for mode in [FlowMode::Sign, FlowMode::Enroll] {
            assert_eq!(DeviceFailure::classify(&unknown, mode), DeviceFailure::DeviceError);
            assert_eq!(DeviceFailure::classify(&bare, mode), DeviceFailure::DeviceError);
        }
    }

    #[test]
    fn test_only_bad_appid_is_final() {
        assert!(!DeviceFailure::BadAppId.is_retryable());
        for failure in [
            DeviceFailure::DeviceError,
            DeviceFailure::DuplicateDevice,
            DeviceFailure::UnknownDevice,
            DeviceFailure::UnknownError,
        ] {
            assert!(failure.is_retryable(), "{failure} should be retryable");
        }
    }

    #[test]
    fn test_codes_match_serde_names() {
        for failure in [
            DeviceFailure::DeviceError,
            DeviceFailure::DuplicateDevice,
            DeviceFailure::UnknownDevice,
            DeviceFailure::BadAppId,
            DeviceFailure::UnknownError,
        ] {
            let json = serde_json::to_string(&failure).unwrap();
            assert_eq!(json, format!("\"{}\"", failure.code()));
        }
    }
}
