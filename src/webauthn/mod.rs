//! `WebAuthn` client primitives
//!
//! This module provides the pieces of a credential ceremony that are
//! independent of any UI: challenge decoding, the platform API seam, and the
//! data types exchanged with the host.

mod cbor;
mod errors;
mod platform;
mod types;

// Re-exports for public use
pub use cbor::{decode_challenge_options, decode_first, map_entry};
pub use errors::{CeremonyError, CodecError, PlatformError, PlatformErrorMetadata, SinkError};
pub use platform::CredentialsContainer;
pub use types::*;
