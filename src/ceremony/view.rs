//! Render model for a ceremony
//!
//! Hosts turn a [`CeremonyView`] into markup; the copy lives here so every
//! host shows the same text.

use serde::Serialize;

use super::failure::DeviceFailure;
use super::state::{CeremonyState, FailureMarker};
use crate::webauthn::FlowMode;

pub const UNSUPPORTED_MESSAGE: &str = "Unfortunately your browser does not support U2F. You need to use a different two-factor method or switch to a browser that supports it (Google Chrome or Microsoft Edge).";

/// What the host should render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CeremonyView {
    /// Nothing at all
    Hidden,
    /// The browser cannot run the ceremony
    Unsupported { message: String },
    /// Button starting the ceremony on a gesture-gated browser
    SafariPrompt { label: String },
    /// Failure panel
    Failure {
        code: String,
        message: String,
        can_try_again: bool,
    },
    /// Device prompt; `tapped` once a credential was obtained
    Prompt { tapped: bool },
}

/// Inputs to [`render`] beyond the state
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub flow_mode: FlowMode,
    pub is_safari: bool,
    pub fail_count: u32,
    pub silent_if_unsupported: bool,
    pub support_email: Option<&'a str>,
}

/// Label of the gesture button for a flow
#[must_use]
pub fn safari_label(mode: FlowMode) -> &'static str {
    match mode {
        FlowMode::Enroll => "Enroll with WebAuthn",
        FlowMode::Sign => "Sign in with WebAuthn",
    }
}

/// User-facing copy for a failure
#[must_use]
pub fn failure_message(failure: DeviceFailure, support_email: Option<&str>) -> String {
    match failure {
        DeviceFailure::UnknownError => "There was an unknown problem, please try again".to_string(),
        DeviceFailure::DeviceError => "Your U2F device reported an error.".to_string(),
        DeviceFailure::DuplicateDevice => "This device is already registered.".to_string(),
        DeviceFailure::UnknownDevice => "The device you used for sign-in is unknown.".to_string(),
        DeviceFailure::BadAppId => {
            let support = support_email.unwrap_or("Support");
            format!(
                "The server administrator modified the device registrations. \
                 You need to remove and re-add the device to continue using your U2F device. \
                 Use a different sign-in method or contact {support} for assistance."
            )
        }
    }
}

/// Compute the view for a state
#[must_use]
pub fn render(state: CeremonyState, ctx: &ViewContext<'_>) -> CeremonyView {
    match state.is_supported() {
        None => return CeremonyView::Hidden,
        Some(false) if ctx.silent_if_unsupported => return CeremonyView::Hidden,
        Some(false) => {
            return CeremonyView::Unsupported {
                message: UNSUPPORTED_MESSAGE.to_string(),
            }
        }
        Some(true) => {}
    }

    let Some(marker) = state.device_failure() else {
        return CeremonyView::Prompt {
            tapped: state.has_been_tapped(),
        };
    };

    if ctx.is_safari && ctx.fail_count == 0 {
        return CeremonyView::SafariPrompt {
            label: safari_label(ctx.flow_mode).to_string(),
        };
    }

    match marker {
        FailureMarker::Device(failure) => CeremonyView::Failure {
            code: failure.code().to_string(),
            message: failure_message(failure, ctx.support_email),
            can_try_again: failure.is_retryable(),
        },
        // A gesture-gated browser that already failed once falls back to the
        // regular retry affordance.
        FailureMarker::RequiresInteraction => CeremonyView::SafariPrompt {
            label: safari_label(ctx.flow_mode).to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::constants::TEST_SUPPORT_EMAIL;

    fn ctx(flow_mode: FlowMode, is_safari: bool, fail_count: u32) -> ViewContext<'static> {
        ViewContext {
            flow_mode,
            is_safari,
            fail_count,
            silent_if_unsupported: false,
            support_email: None,
        }
    }

    #[test]
    fn test_pending_and_unsupported() {
        let c = ctx(FlowMode::Sign, false, 0);
        assert_eq!(render(CeremonyState::Pending, &c), CeremonyView::Hidden);
        assert_eq!(
            render(CeremonyState::Unsupported, &c),
            CeremonyView::Unsupported {
                message: UNSUPPORTED_MESSAGE.to_string()
            }
        );

        let silent = ViewContext {
            silent_if_unsupported: true,
            ..c
        };
        assert_eq!(render(CeremonyState::Unsupported, &silent), CeremonyView::Hidden);
    }

    #[test]
    fn test_prompt_reflects_tap() {
        let c = ctx(FlowMode::Sign, false, 0);
        assert_eq!(
            render(CeremonyState::Running, &c),
            CeremonyView::Prompt { tapped: false }
        );
        assert_eq!(
            render(CeremonyState::Submitting, &c),
            CeremonyView::Prompt { tapped: true }
        );
    }

    #[test]
    fn test_safari_prompt_until_first_failure() {
        let state = CeremonyState::AwaitingInteraction;
        assert_eq!(
            render(state, &ctx(FlowMode::Enroll, true, 0)),
            CeremonyView::SafariPrompt {
                label: "Enroll with WebAuthn".to_string()
            }
        );

        let failed = CeremonyState::Failed(DeviceFailure::DeviceError);
        assert_eq!(
            render(failed, &ctx(FlowMode::Sign, true, 0)),
            CeremonyView::SafariPrompt {
                label: "Sign in with WebAuthn".to_string()
            }
        );

        // After a real failure the regular panel shows
        assert!(matches!(
            render(failed, &ctx(FlowMode::Sign, true, 1)),
            CeremonyView::Failure { can_try_again: true, .. }
        ));
    }

    #[test]
    fn test_bad_appid_has_no_retry_and_names_support() {
        let state = CeremonyState::Failed(DeviceFailure::BadAppId);
        let c = ViewContext {
            support_email: Some(TEST_SUPPORT_EMAIL),
            ..ctx(FlowMode::Sign, false, 1)
        };

        match render(state, &c) {
            CeremonyView::Failure {
                code,
                message,
                can_try_again,
            } => {
                assert_eq!(code, "BAD_APPID");
                assert!(!can_try_again);
                assert!(message.contains(TEST_SUPPORT_EMAIL));
            }
            other => panic!("unexpected view {other:?}"),
        }

        assert!(failure_message(DeviceFailure::BadAppId, None).contains("contact Support"));
    }

    #[test]
    fn test_view_serializes_with_kind_tag() {
        let json = serde_json::to_value(CeremonyView::Prompt { tapped: true }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "prompt", "tapped": true}));
    }
}
