//! Failure reporting
//!
//! Every classified failure is captured before the ceremony state changes.
//! Reporters are fire-and-forget: they cannot fail the ceremony.

use chrono::{DateTime, Utc};
use log::{error, warn};
use serde::Serialize;
use uuid::Uuid;

use super::failure::DeviceFailure;
use crate::webauthn::FlowMode;

/// One captured ceremony failure
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    /// Correlates every log line and report of one attempt
    pub attempt_id: Uuid,
    pub flow_mode: FlowMode,
    pub failure: DeviceFailure,
    /// Display text of the underlying error
    pub detail: String,
    /// Platform derived from the user agent, when known
    pub platform: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Error telemetry sink
pub trait FailureReporter: Send + Sync {
    fn capture(&self, report: &FailureReport);
}

/// Reporter writing through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl FailureReporter for LogReporter {
    fn capture(&self, report: &FailureReport) {
        if report.failure.is_retryable() {
            warn!(
                "⚠️  {} ceremony failed ({}) attempt={} platform={}: {}",
                report.flow_mode,
                report.failure,
                report.attempt_id,
                report.platform.as_deref().unwrap_or("Unknown"),
                report.detail
            );
        } else {
            error!(
                "❌ {} ceremony failed permanently ({}) attempt={} platform={}: {}",
                report.flow_mode,
                report.failure,
                report.attempt_id,
                report.platform.as_deref().unwrap_or("Unknown"),
                report.detail
            );
        }

        if let Ok(json) = serde_json::to_string(report) {
            log::debug!("Failure report: {json}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_codes() {
        let report = FailureReport {
            attempt_id: Uuid::nil(),
            flow_mode: FlowMode::Enroll,
            failure: DeviceFailure::DuplicateDevice,
            detail: "Platform error: ineligible".to_string(),
            platform: Some("macOS".to_string()),
            occurred_at: Utc::now(),
        };

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["flow_mode"], "enroll");
        assert_eq!(json["failure"], "DUPLICATE_DEVICE");
        assert_eq!(json["attempt_id"], "00000000-0000-0000-0000-000000000000");

        // Logging never panics, whatever the logger state
        LogReporter.capture(&report);
    }
}
