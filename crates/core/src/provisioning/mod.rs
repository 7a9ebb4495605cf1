//! Per-client deployment provisioning.
//!
//! The dispatcher runs the external `create-client-stack` script either on
//! this host (when a POSIX shell is available) or on a remote server over
//! `ssh`. All subprocess management is pure (no DB access) and reports
//! progress through an injected [`progress::ProgressReporter`].

pub mod dispatcher;
pub mod executor;
pub mod local;
pub mod progress;
pub mod remote;
pub mod settings;
pub mod shell;
pub mod subprocess;

pub use dispatcher::{ExecutionStrategy, FailureKind, ProvisioningDispatcher, ProvisioningOutcome};
pub use executor::{CommandOutput, ProvisioningError, ProvisioningParams};
pub use progress::{report, CollectedProgress, NoopProgress, ProgressReporter};
pub use settings::{ExecutionMode, ProvisioningSettings};
