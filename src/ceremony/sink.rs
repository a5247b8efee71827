//! Response delivery
//!
//! A ceremony hands its `{response, challenge}` pair to exactly one sink:
//! either a host callback or the classic hidden-form post.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::webauthn::{SinkError, TapSubmission};

/// Destination for a completed ceremony
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Deliver a submission
    ///
    /// # Errors
    ///
    /// Returns a `SinkError` if the host refuses the submission or it cannot
    /// be sent. The ceremony treats any error as `UNKNOWN_ERROR`.
    async fn deliver(&self, submission: &TapSubmission) -> Result<(), SinkError>;
}

/// Sink calling a host-supplied async function
pub struct CallbackSink<F> {
    callback: F,
}

impl<F> CallbackSink<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> fmt::Debug for CallbackSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut, E> ResponseSink for CallbackSink<F>
where
    F: Fn(TapSubmission) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    async fn deliver(&self, submission: &TapSubmission) -> Result<(), SinkError> {
        (self.callback)(submission.clone())
            .await
            .map_err(|e| SinkError::Rejected(e.to_string()))
    }
}

#[cfg(feature = "form-post")]
pub use form::{FormPostSink, HiddenFormFields};

#[cfg(feature = "form-post")]
mod form {
    use std::sync::{Mutex, PoisonError};

    use async_trait::async_trait;
    use url::Url;

    use super::ResponseSink;
    use crate::settings::CeremonySettings;
    use crate::webauthn::{ChallengeData, SinkError, TapSubmission};

    /// Values of the hidden `challenge` and `response` inputs
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct HiddenFormFields {
        pub challenge: Option<String>,
        pub response: Option<String>,
    }

    /// Sink posting the hidden form fields to the form action
    #[derive(Debug)]
    pub struct FormPostSink {
        action: Url,
        client: reqwest::Client,
        fields: Mutex<HiddenFormFields>,
    }

    impl FormPostSink {
        /// Create a form sink; the `challenge` field is bound immediately
        ///
        /// # Errors
        ///
        /// Returns `SinkError::NotConfigured` if the action is not a valid URL
        /// or the challenge cannot be serialized.
        pub fn new(action: &str, challenge: &ChallengeData) -> Result<Self, SinkError> {
            let action = Url::parse(action)
                .map_err(|e| SinkError::NotConfigured(format!("Invalid form action: {e}")))?;
            let challenge = challenge
                .to_json()
                .map_err(|e| SinkError::NotConfigured(format!("Unserializable challenge: {e}")))?;

            Ok(Self {
                action,
                client: reqwest::Client::new(),
                fields: Mutex::new(HiddenFormFields {
                    challenge: Some(challenge),
                    response: None,
                }),
            })
        }

        /// Create a form sink from the configured form action
        ///
        /// # Errors
        ///
        /// Returns `SinkError::NotConfigured` if no action is configured.
        pub fn from_settings(
            settings: &CeremonySettings,
            challenge: &ChallengeData,
        ) -> Result<Self, SinkError> {
            let action = settings.form.action_url.as_deref().ok_or_else(|| {
                SinkError::NotConfigured("form.action_url is not set".to_string())
            })?;
            Self::new(action, challenge)
        }

        /// Form action the fields are posted to
        #[must_use]
        pub fn action(&self) -> &Url {
            &self.action
        }

        /// Current values of the hidden fields
        #[must_use]
        pub fn fields(&self) -> HiddenFormFields {
            self.fields
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl ResponseSink for FormPostSink {
        async fn deliver(&self, submission: &TapSubmission) -> Result<(), SinkError> {
            let fields = {
                let mut fields = self.fields.lock().unwrap_or_else(PoisonError::into_inner);
                fields.response = Some(submission.response.clone());
                if fields.challenge.is_none() {
                    fields.challenge = Some(submission.challenge.clone());
                }
                fields.clone()
            };

            let form = [
                ("challenge", fields.challenge.unwrap_or_default()),
                ("response", fields.response.unwrap_or_default()),
            ];

            log::info!("📨 Submitting credential form to {}", self.action);
            self.client
                .post(self.action.clone())
                .form(&form)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| SinkError::Transport(e.to_string()))?;

            Ok(())
        }
    }

}
