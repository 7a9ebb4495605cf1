//! Progress reporting sink for the provisioning dispatcher.
//!
//! Reporters receive short human-readable strings at each phase transition.
//! Implementations must return promptly; the dispatcher does not wait on
//! them and ignores a reporter that panics.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

/// Observer notified of provisioning progress.
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, message: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, message: &str) {
        self(message)
    }
}

/// Forward a progress line to `progress`, logging and swallowing a panic
/// raised by the reporter.
pub fn report(progress: &dyn ProgressReporter, message: &str) {
    tracing::info!(%message, "Progress");
    if catch_unwind(AssertUnwindSafe(|| progress.on_progress(message))).is_err() {
        tracing::warn!(%message, "Progress reporter panicked, message dropped");
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn on_progress(&self, _message: &str) {}
}

/// Buffers messages in order, for callers that return them all at once.
#[derive(Debug, Default)]
pub struct CollectedProgress {
    messages: Mutex<Vec<String>>,
}

impl CollectedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages received so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProgressReporter for CollectedProgress {
    fn on_progress(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
