#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the keytap library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod ceremony;
pub mod settings;
pub mod utils;
pub mod webauthn;

// Testing utilities - available in test builds and when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use ceremony::{CeremonyController, CeremonyState, CeremonyView, DeviceFailure, ResponseSink};
pub use settings::CeremonySettings;
pub use utils::base64url::{base64url_to_buffer, buffer_to_base64url};
pub use utils::user_agent::{Environment, StaticEnvironment};
pub use webauthn::{
    CeremonyError, CeremonyProps, ChallengeData, CredentialsContainer, FlowMode,
    PublicKeyCredential, TapSubmission,
};
