//! Mock objects and fake implementations for testing
//!
//! Each fake records what the controller did with it so tests can assert on
//! call counts and payloads.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use ciborium::value::Value;

use crate::ceremony::{FailureReport, FailureReporter, ResponseSink};
use crate::webauthn::{
    CredentialsContainer, PlatformError, PublicKeyCredential, SinkError, TapSubmission,
};

type PlatformResult = Result<PublicKeyCredential, PlatformError>;

/// Platform double answering from a queue of results
///
/// Once the queue is empty every call is rejected with a plain
/// `PlatformError`.
#[derive(Debug, Default)]
pub struct MockCredentials {
    results: Mutex<VecDeque<PlatformResult>>,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    last_options: Mutex<Option<Value>>,
    delay: Option<Duration>,
}

impl MockCredentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next call
    #[must_use]
    pub fn with_result(self, result: PlatformResult) -> Self {
        self.push_result(result);
        self
    }

    /// Sleep before answering each call
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_result(&self, result: PlatformResult) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent call
    #[must_use]
    pub fn last_options(&self) -> Option<Value> {
        self.last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn answer(&self, options: &Value) -> PlatformResult {
        *self
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(options.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(PlatformError::new("No queued platform result")))
    }
}

#[async_trait]
impl CredentialsContainer for MockCredentials {
    async fn get(&self, options: &Value) -> PlatformResult {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(options).await
    }

    async fn create(&self, options: &Value) -> PlatformResult {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(options).await
    }
}

/// Sink remembering every submission it was handed
#[derive(Debug, Default)]
pub struct RecordingSink {
    submissions: Mutex<Vec<TapSubmission>>,
    rejection: Option<String>,
}

impl RecordingSink {
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Sink that records, then refuses, every submission
    #[must_use]
    pub fn rejecting(reason: &str) -> Self {
        Self {
            submissions: Mutex::default(),
            rejection: Some(reason.to_string()),
        }
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<TapSubmission> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ResponseSink for RecordingSink {
    async fn deliver(&self, submission: &TapSubmission) -> Result<(), SinkError> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(submission.clone());

        match &self.rejection {
            Some(reason) => Err(SinkError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Reporter keeping captured reports in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<FailureReport>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn reports(&self) -> Vec<FailureReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FailureReporter for RecordingReporter {
    fn capture(&self, report: &FailureReport) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
    }
}
