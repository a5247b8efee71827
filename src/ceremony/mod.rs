//! Credential ceremony orchestration
//!
//! Everything between a decoded challenge and a delivered response: the
//! state machine, failure classification, response encoding, delivery sinks
//! and the render model.

pub mod controller;
pub mod failure;
pub mod response;
pub mod sink;
pub mod state;
pub mod telemetry;
pub mod view;

// Re-exports for public use
pub use controller::CeremonyController;
pub use failure::{DeviceFailure, BAD_REQUEST, DEVICE_INELIGIBLE};
pub use response::encode_credential;
#[cfg(feature = "form-post")]
pub use sink::{FormPostSink, HiddenFormFields};
pub use sink::{CallbackSink, ResponseSink};
pub use state::{CeremonyEvent, CeremonyState, FailureMarker, SAFARI_REQUIRES_INTERACTION};
pub use telemetry::{FailureReport, FailureReporter, LogReporter};
pub use view::{render, CeremonyView, ViewContext};
