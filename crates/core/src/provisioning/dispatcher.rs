//! Strategy selection, execution and outcome classification.
//!
//! [`ProvisioningDispatcher::dispatch`] never returns an error: every failure
//! (configuration, missing tool, non-zero exit, timeout) is folded into a
//! [`ProvisioningOutcome`] whose message is safe to show to an operator.

use std::time::Duration;

use serde::Serialize;

use super::executor::{
    error_text, CommandOutput, ProvisioningError, ProvisioningExecutor, ProvisioningParams,
};
use super::local::{detect_shell, LocalStrategy};
use super::progress::{report, ProgressReporter};
use super::remote::RemoteStrategy;
use super::settings::{ExecutionMode, ProvisioningSettings};

/// Fixed prefix of every success message.
pub const SUCCESS_MESSAGE: &str = "Client deployment created successfully";

/// Shell used for forced local mode when no candidate is found.
const FALLBACK_SHELL: &str = "bash";

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// The two ways of running the provisioning script, chosen once per dispatch.
#[derive(Debug, Clone)]
pub enum ExecutionStrategy {
    Local(LocalStrategy),
    Remote(RemoteStrategy),
}

impl ExecutionStrategy {
    pub fn launch_message(&self) -> String {
        match self {
            Self::Local(s) => s.launch_message(),
            Self::Remote(s) => s.launch_message(),
        }
    }

    pub async fn execute(
        &self,
        params: &ProvisioningParams,
        timeout: Duration,
    ) -> Result<CommandOutput, ProvisioningError> {
        match self {
            Self::Local(s) => s.execute(params, timeout).await,
            Self::Remote(s) => s.execute(params, timeout).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a provisioning run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    ToolMissing,
    NonZeroExit,
    Timeout,
    Io,
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    Succeeded { message: String },
    Failed { kind: FailureKind, message: String },
}

impl ProvisioningOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Succeeded { message } | Self::Failed { message, .. } => message,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }

    /// Map a command result to an outcome.
    pub fn classify(result: Result<CommandOutput, ProvisioningError>) -> Self {
        match result {
            Ok(output) if output.succeeded() => {
                let stdout = output.stdout.trim_end();
                let message = if stdout.trim().is_empty() {
                    SUCCESS_MESSAGE.to_string()
                } else {
                    format!("{SUCCESS_MESSAGE}\n{stdout}")
                };
                Self::Succeeded { message }
            }
            Ok(output) => Self::Failed {
                kind: FailureKind::NonZeroExit,
                message: format!(
                    "Provisioning script failed (exit code {}): {}",
                    output.exit_code,
                    output.error_text()
                ),
            },
            Err(ProvisioningError::Timeout {
                elapsed_ms,
                stdout,
                stderr,
            }) => Self::Failed {
                kind: FailureKind::Timeout,
                message: format!(
                    "Provisioning timed out after {}s: {}",
                    elapsed_ms / 1000,
                    error_text(&stdout, &stderr)
                ),
            },
            Err(e @ ProvisioningError::Configuration { .. }) => Self::Failed {
                kind: FailureKind::Configuration,
                message: e.to_string(),
            },
            Err(e @ ProvisioningError::ToolMissing { .. }) => Self::Failed {
                kind: FailureKind::ToolMissing,
                message: e.to_string(),
            },
            Err(e @ ProvisioningError::Io(_)) => Self::Failed {
                kind: FailureKind::Io,
                message: format!("Could not run the provisioning command: {e}"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Runs the provisioning script for one client and reports progress.
#[derive(Debug, Clone)]
pub struct ProvisioningDispatcher {
    settings: ProvisioningSettings,
}

impl ProvisioningDispatcher {
    pub fn new(settings: ProvisioningSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ProvisioningSettings {
        &self.settings
    }

    /// Pick the strategy for this host.
    ///
    /// Remote selection validates its settings here, so a placeholder host
    /// fails before any connection is attempted.
    pub fn select_strategy(&self) -> Result<ExecutionStrategy, ProvisioningError> {
        let detected = detect_shell(&self.settings.shell_candidates);
        match (self.settings.mode, detected) {
            (ExecutionMode::Auto, Some(shell)) => Ok(self.local(shell)),
            (ExecutionMode::Local, detected) => {
                let shell = detected
                    .or_else(|| self.settings.shell_candidates.first().cloned())
                    .unwrap_or_else(|| FALLBACK_SHELL.into());
                Ok(self.local(shell))
            }
            (ExecutionMode::Auto, None) | (ExecutionMode::Remote, _) => {
                RemoteStrategy::new(self.settings.remote.clone()).map(ExecutionStrategy::Remote)
            }
        }
    }

    fn local(&self, shell: std::path::PathBuf) -> ExecutionStrategy {
        ExecutionStrategy::Local(LocalStrategy::new(shell, self.settings.local_script.clone()))
    }

    /// Provision one client deployment, bounded by the configured timeout.
    pub async fn dispatch(
        &self,
        params: &ProvisioningParams,
        progress: &dyn ProgressReporter,
    ) -> ProvisioningOutcome {
        report(progress, "Detecting execution environment");

        let strategy = match self.select_strategy() {
            Ok(strategy) => strategy,
            Err(e) => {
                let outcome = ProvisioningOutcome::classify(Err(e));
                tracing::error!(client = %params.client_name, error = %outcome.message(), "Provisioning not started");
                report(progress, &format!("Provisioning failed: {}", outcome.message()));
                return outcome;
            }
        };

        report(progress, &strategy.launch_message());
        report(
            progress,
            &format!(
                "Provisioning in progress (up to {}s)",
                self.settings.timeout.as_secs()
            ),
        );

        let result = strategy.execute(params, self.settings.timeout).await;
        let outcome = ProvisioningOutcome::classify(result);

        match &outcome {
            ProvisioningOutcome::Succeeded { .. } => {
                tracing::info!(client = %params.client_name, "Provisioning succeeded");
                report(progress, "Provisioning completed");
            }
            ProvisioningOutcome::Failed { kind, message } => {
                tracing::error!(client = %params.client_name, ?kind, error = %message, "Provisioning failed");
                report(progress, &format!("Provisioning failed: {message}"));
            }
        }

        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
