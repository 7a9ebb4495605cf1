//! Demo-signup workflow.

pub mod orchestrator;

pub use orchestrator::{SignupOrchestrator, SignupOutcome, SignupResult};
