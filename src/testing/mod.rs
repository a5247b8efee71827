//! Testing utilities for keytap ceremonies
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built challenges and credentials
//! - [`mock`] - Fake platform, sink and reporter implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keytap::testing::{fixtures::TestFixtures, mock::{MockCredentials, RecordingSink}};
//!
//! let credentials = Arc::new(
//!     MockCredentials::new().with_result(Ok(TestFixtures::assertion_credential())),
//! );
//! let sink = Arc::new(RecordingSink::accepting());
//! ```

pub mod fixtures;
pub mod mock;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use mock::{MockCredentials, RecordingReporter, RecordingSink};

/// Common test constants
pub mod constants {
    /// Desktop Safari on macOS
    pub const SAFARI_MAC_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";

    /// Chrome on macOS; also advertises Safari
    pub const CHROME_MAC_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    /// Default test credential id
    pub const TEST_CREDENTIAL_ID: &str = "cred-abc";

    /// Default relying party id
    pub const TEST_RP_ID: &str = "example.com";

    /// Default support contact
    pub const TEST_SUPPORT_EMAIL: &str = "support@example.com";

    /// Raw challenge bytes embedded in the fixtures
    pub const TEST_CHALLENGE_BYTES: &[u8] = b"test_challenge_32_bytes_long____";
}
