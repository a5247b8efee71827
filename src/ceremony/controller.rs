//! Ceremony controller
//!
//! Owns one ceremony from capability probe to delivery. The controller
//! decodes the challenge, drives the platform credential API, encodes the
//! result and hands it to the sink, classifying every failure on the way.
//!
//! Recoverable failures never surface as `Err`; they land in
//! [`CeremonyState::Failed`] and are reported through the
//! [`FailureReporter`]. Only fatal errors (an impossible transition) and a
//! refused retry are returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ciborium::value::Value;
use log::{debug, info};
use uuid::Uuid;

use super::failure::DeviceFailure;
use super::response::encode_credential;
use super::sink::ResponseSink;
use super::state::{CeremonyEvent, CeremonyState, FailureMarker};
use super::telemetry::{FailureReport, FailureReporter, LogReporter};
use super::view::{render, CeremonyView, ViewContext};
use crate::settings::CeremonySettings;
use crate::utils::user_agent::{derive_platform_from_user_agent, Environment};
use crate::webauthn::{
    decode_challenge_options, CeremonyError, CeremonyProps, ChallengeData, CredentialsContainer,
    FlowMode, PlatformError, PublicKeyCredential, TapSubmission,
};

/// Whether a failure bumps the user-visible failure counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counted {
    Yes,
    No,
}

pub struct CeremonyController {
    credentials: Arc<dyn CredentialsContainer>,
    sink: Arc<dyn ResponseSink>,
    reporter: Arc<dyn FailureReporter>,
    environment: Arc<dyn Environment>,
    challenge: ChallengeData,
    flow_mode: FlowMode,
    state: CeremonyState,
    is_safari: bool,
    fail_count: u32,
    silent_if_unsupported: bool,
    support_email: Option<String>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for CeremonyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CeremonyController")
            .field("flow_mode", &self.flow_mode)
            .field("state", &self.state)
            .field("is_safari", &self.is_safari)
            .field("fail_count", &self.fail_count)
            .finish_non_exhaustive()
    }
}

impl CeremonyController {
    /// Create a controller for one ceremony
    ///
    /// Failures are reported through [`LogReporter`] until another reporter
    /// is supplied with [`with_reporter`](Self::with_reporter).
    pub fn new(
        challenge: ChallengeData,
        flow_mode: FlowMode,
        credentials: Arc<dyn CredentialsContainer>,
        sink: Arc<dyn ResponseSink>,
        environment: Arc<dyn Environment>,
    ) -> Self {
        Self {
            credentials,
            sink,
            reporter: Arc::new(LogReporter),
            environment,
            challenge,
            flow_mode,
            state: CeremonyState::Pending,
            is_safari: false,
            fail_count: 0,
            silent_if_unsupported: false,
            support_email: None,
            timeout: None,
        }
    }

    /// Create a controller from host props
    pub fn from_props(
        props: CeremonyProps,
        credentials: Arc<dyn CredentialsContainer>,
        sink: Arc<dyn ResponseSink>,
        environment: Arc<dyn Environment>,
    ) -> Self {
        Self::new(
            props.challenge_data,
            props.flow_mode,
            credentials,
            sink,
            environment,
        )
        .with_silent_if_unsupported(props.silent_if_unsupported)
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn with_silent_if_unsupported(mut self, silent: bool) -> Self {
        self.silent_if_unsupported = silent;
        self
    }

    #[must_use]
    pub fn with_support_email(mut self, email: impl Into<String>) -> Self {
        self.support_email = Some(email.into());
        self
    }

    /// Give up on a platform call after `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Apply configured defaults
    ///
    /// The silent flag is only ever switched on here, so a host that asked
    /// for silence keeps it.
    #[must_use]
    pub fn with_settings(mut self, settings: &CeremonySettings) -> Self {
        self.silent_if_unsupported |= settings.ceremony.silent_if_unsupported;
        if let Some(timeout) = settings.platform_timeout() {
            self.timeout = Some(timeout);
        }
        if let Some(email) = &settings.support.email {
            self.support_email = Some(email.clone());
        }
        self
    }

    /// Probe the environment and, when allowed, run the first attempt
    ///
    /// Browsers needing a user gesture stop in
    /// [`CeremonyState::AwaitingInteraction`] until [`try_again`](Self::try_again).
    ///
    /// # Errors
    ///
    /// Returns `CeremonyError::InvalidTransition` if the controller was
    /// already mounted.
    pub async fn mount(&mut self) -> Result<(), CeremonyError> {
        let supported = self.environment.supports_public_key_credential();
        let requires_gesture = self.environment.requires_user_gesture();
        self.transition(CeremonyEvent::Probed {
            supported,
            requires_gesture,
        })?;
        self.is_safari = requires_gesture;

        match self.state {
            CeremonyState::Unsupported => {
                info!(
                    "🚫 Public-key credentials unavailable, {} ceremony not started",
                    self.flow_mode
                );
                Ok(())
            }
            CeremonyState::AwaitingInteraction => {
                info!(
                    "👆 Waiting for a user gesture before the {} ceremony",
                    self.flow_mode
                );
                Ok(())
            }
            _ => self.attempt().await,
        }
    }

    /// Start another attempt after a failure or the Safari gesture
    ///
    /// The attempt reuses the original challenge.
    ///
    /// # Errors
    ///
    /// Returns `CeremonyError::RetryNotAllowed` after `BAD_APPID` or when
    /// nothing failed.
    pub async fn try_again(&mut self) -> Result<(), CeremonyError> {
        self.transition(CeremonyEvent::Retry)?;
        self.attempt().await
    }

    /// One pass through decode, platform call and delivery
    async fn attempt(&mut self) -> Result<(), CeremonyError> {
        let attempt_id = Uuid::new_v4();
        info!("🔑 Starting {} ceremony attempt={attempt_id}", self.flow_mode);

        let options = match decode_challenge_options(&self.challenge, self.flow_mode) {
            Ok(options) => options,
            Err(e) => return self.fail(attempt_id, DeviceFailure::DeviceError, &e, Counted::No),
        };

        let credential = match self.invoke_platform(&options).await {
            Ok(credential) => credential,
            Err(e) => {
                let failure = DeviceFailure::classify(&e, self.flow_mode);
                return self.fail(attempt_id, failure, &e, Counted::Yes);
            }
        };
        self.transition(CeremonyEvent::Tapped)?;
        debug!("Credential {} obtained for attempt={attempt_id}", credential.id);

        let submission = match self.build_submission(&credential) {
            Ok(submission) => submission,
            Err(e) => return self.fail(attempt_id, DeviceFailure::DeviceError, &e, Counted::No),
        };
        self.transition(CeremonyEvent::Submitting)?;

        match self.sink.deliver(&submission).await {
            Ok(()) => {
                self.transition(CeremonyEvent::Delivered)?;
                info!("✅ {} ceremony completed attempt={attempt_id}", self.flow_mode);
                Ok(())
            }
            Err(e) => self.fail(attempt_id, DeviceFailure::UnknownError, &e, Counted::No),
        }
    }

    async fn invoke_platform(&self, options: &Value) -> Result<PublicKeyCredential, PlatformError> {
        let call = async {
            match self.flow_mode {
                FlowMode::Sign => self.credentials.get(options).await,
                FlowMode::Enroll => self.credentials.create(options).await,
            }
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(PlatformError::new(format!(
                    "No response from the authenticator within {}ms",
                    limit.as_millis()
                )))
            }),
            None => call.await,
        }
    }

    fn build_submission(
        &self,
        credential: &PublicKeyCredential,
    ) -> Result<TapSubmission, CeremonyError> {
        Ok(TapSubmission {
            response: encode_credential(credential, self.flow_mode)?,
            challenge: self.challenge.to_json()?,
        })
    }

    fn fail(
        &mut self,
        attempt_id: Uuid,
        failure: DeviceFailure,
        cause: &dyn std::fmt::Display,
        counted: Counted,
    ) -> Result<(), CeremonyError> {
        let user_agent = self.environment.user_agent();
        let report = FailureReport {
            attempt_id,
            flow_mode: self.flow_mode,
            failure,
            detail: cause.to_string(),
            platform: (!user_agent.is_empty())
                .then(|| derive_platform_from_user_agent(user_agent).to_string()),
            occurred_at: Utc::now(),
        };
        self.reporter.capture(&report);

        self.transition(CeremonyEvent::Failed(failure))?;
        if counted == Counted::Yes {
            self.fail_count += 1;
        }
        Ok(())
    }

    fn transition(&mut self, event: CeremonyEvent) -> Result<(), CeremonyError> {
        let next = self.state.on_event(event)?;
        debug!("Ceremony {} -> {next} on {event:?}", self.state);
        self.state = next;
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> CeremonyState {
        self.state
    }

    #[must_use]
    pub fn flow_mode(&self) -> FlowMode {
        self.flow_mode
    }

    #[must_use]
    pub fn challenge(&self) -> &ChallengeData {
        &self.challenge
    }

    /// Platform rejections so far; decode and delivery failures do not count
    #[must_use]
    pub fn fail_count(&self) -> u32 {
        self.fail_count
    }

    #[must_use]
    pub fn is_safari(&self) -> bool {
        self.is_safari
    }

    #[must_use]
    pub fn has_been_tapped(&self) -> bool {
        self.state.has_been_tapped()
    }

    #[must_use]
    pub fn device_failure(&self) -> Option<FailureMarker> {
        self.state.device_failure()
    }

    /// Whether the failure panel offers "Try Again"
    #[must_use]
    pub fn can_try_again(&self) -> bool {
        match self.state {
            CeremonyState::Failed(failure) => failure.is_retryable(),
            CeremonyState::AwaitingInteraction => true,
            _ => false,
        }
    }

    /// What the host should render right now
    #[must_use]
    pub fn view(&self) -> CeremonyView {
        render(
            self.state,
            &ViewContext {
                flow_mode: self.flow_mode,
                is_safari: self.is_safari,
                fail_count: self.fail_count,
                silent_if_unsupported: self.silent_if_unsupported,
                support_email: self.support_email.as_deref(),
            },
        )
    }
}
