//! Ceremony state machine
//!
//! A ceremony moves through these states over the lifetime of one controller:
//!
//! ```text
//! Pending -> Unsupported
//!         -> AwaitingInteraction -(Retry)-> Running
//!         -> Running -> Tapped -> Submitting -> Completed
//!                    -> Failed -(Retry, unless BAD_APPID)-> Running
//!            Submitting -> Failed (UNKNOWN_ERROR)
//! ```
//!
//! Transitions are pure; the controller owns the current value.

use std::fmt;

use super::failure::DeviceFailure;
use crate::webauthn::CeremonyError;

/// Marker shown while a gesture-gated browser waits for the user
pub const SAFARI_REQUIRES_INTERACTION: &str = "safari: requires interaction";

/// Where a ceremony currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyState {
    /// Capability not probed yet
    Pending,
    /// No public-key credential API; terminal
    Unsupported,
    /// The browser needs an explicit user gesture before the API may run
    AwaitingInteraction,
    /// Decoding the challenge or waiting on the platform
    Running,
    /// The platform returned a credential
    Tapped,
    /// The response is being delivered
    Submitting,
    /// The response was delivered
    Completed,
    /// The last attempt failed
    Failed(DeviceFailure),
}

/// Inputs that move a ceremony between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyEvent {
    /// Capability probe finished
    Probed {
        supported: bool,
        requires_gesture: bool,
    },
    /// The platform resolved with a credential
    Tapped,
    /// The response was written and handed to the sink
    Submitting,
    /// The sink accepted the response
    Delivered,
    /// The attempt failed with a classified reason
    Failed(DeviceFailure),
    /// The user asked to try again
    Retry,
}

/// What the UI shows as the current failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMarker {
    Device(DeviceFailure),
    RequiresInteraction,
}

impl FailureMarker {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureMarker::Device(failure) => failure.code(),
            FailureMarker::RequiresInteraction => SAFARI_REQUIRES_INTERACTION,
        }
    }
}

impl fmt::Display for FailureMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CeremonyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CeremonyState::Failed(failure) => write!(f, "Failed({failure})"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl CeremonyState {
    /// Apply an event, returning the next state
    ///
    /// # Errors
    ///
    /// Returns `CeremonyError::RetryNotAllowed` for a retry after `BAD_APPID`
    /// or with nothing to retry, and `CeremonyError::InvalidTransition` for
    /// any other event that does not apply to the current state.
    pub fn on_event(self, event: CeremonyEvent) -> Result<Self, CeremonyError> {
        use CeremonyEvent as E;
        use CeremonyState as S;

        match (self, event) {
            (
                S::Pending,
                E::Probed {
                    supported,
                    requires_gesture,
                },
            ) => Ok(if !supported {
                S::Unsupported
            } else if requires_gesture {
                S::AwaitingInteraction
            } else {
                S::Running
            }),
            (S::Running, E::Tapped) => Ok(S::Tapped),
            (S::Tapped, E::Submitting) => Ok(S::Submitting),
            (S::Submitting, E::Delivered) => Ok(S::Completed),
            (S::Running | S::Tapped | S::Submitting, E::Failed(failure)) => Ok(S::Failed(failure)),
            (S::AwaitingInteraction, E::Retry) => Ok(S::Running),
            (S::Failed(failure), E::Retry) if failure.is_retryable() => Ok(S::Running),
            (S::Failed(failure), E::Retry) => Err(CeremonyError::RetryNotAllowed(format!(
                "{failure} requires the device to be registered again"
            ))),
            (from, E::Retry) => Err(CeremonyError::RetryNotAllowed(format!(
                "nothing to retry in state {from}"
            ))),
            (from, event) => Err(CeremonyError::InvalidTransition {
                from: from.to_string(),
                event: format!("{event:?}"),
            }),
        }
    }

    /// True once the platform produced a credential for the current attempt
    #[must_use]
    pub fn has_been_tapped(self) -> bool {
        matches!(
            self,
            CeremonyState::Tapped | CeremonyState::Submitting | CeremonyState::Completed
        )
    }

    /// Failure to show, if any
    #[must_use]
    pub fn device_failure(self) -> Option<FailureMarker> {
        match self {
            CeremonyState::Failed(failure) => Some(FailureMarker::Device(failure)),
            CeremonyState::AwaitingInteraction => Some(FailureMarker::RequiresInteraction),
            _ => None,
        }
    }

    /// `None` while the capability probe is pending
    #[must_use]
    pub fn is_supported(self) -> Option<bool> {
        match self {
            CeremonyState::Pending => None,
            CeremonyState::Unsupported => Some(false),
            _ => Some(true),
        }
    }
}
