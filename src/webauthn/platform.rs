//! Platform credential API seam
//!
//! Abstracts `navigator.credentials` so ceremonies can run against a browser
//! bridge, a native authenticator library or a test double.

use async_trait::async_trait;
use ciborium::value::Value;

use super::errors::PlatformError;
use super::types::PublicKeyCredential;

/// The two credential operations a ceremony needs
#[async_trait]
pub trait CredentialsContainer: Send + Sync {
    /// Obtain an assertion for the given request options
    ///
    /// # Errors
    ///
    /// Returns a `PlatformError` when the authenticator or the user refuses.
    async fn get(&self, options: &Value) -> Result<PublicKeyCredential, PlatformError>;

    /// Create a credential for the given creation options
    ///
    /// # Errors
    ///
    /// Returns a `PlatformError` when the authenticator or the user refuses.
    async fn create(&self, options: &Value) -> Result<PublicKeyCredential, PlatformError>;
}
