//! Shared provisioning types and the strategy execution interface.
//!
//! Defines [`ProvisioningExecutor`], implemented by the local and remote
//! strategies, along with [`ProvisioningParams`], [`CommandOutput`] and
//! [`ProvisioningError`].

use std::fmt;
use std::time::Duration;

use crate::credentials::ProvisioningCredentials;

/// Fallback error text when a failed command printed nothing.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// The four values passed to the provisioning script.
#[derive(Clone)]
pub struct ProvisioningParams {
    pub client_name: String,
    pub postgres_password: String,
    pub secret_key: String,
    pub initial_password: String,
}

impl ProvisioningParams {
    pub fn new(client_name: impl Into<String>, credentials: &ProvisioningCredentials) -> Self {
        Self {
            client_name: client_name.into(),
            postgres_password: credentials.postgres_password.clone(),
            secret_key: credentials.secret_key.clone(),
            initial_password: credentials.initial_password.clone(),
        }
    }

    /// Flag/value pairs in script order:
    /// `-c <client> -p <postgres password> -s <secret key> -i <initial password>`.
    pub fn flag_pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("-c", self.client_name.as_str()),
            ("-p", self.postgres_password.as_str()),
            ("-s", self.secret_key.as_str()),
            ("-i", self.initial_password.as_str()),
        ]
    }

    /// The flag/value pairs flattened into an argument vector.
    pub fn to_args(&self) -> Vec<String> {
        self.flag_pairs()
            .iter()
            .flat_map(|(flag, value)| [flag.to_string(), value.to_string()])
            .collect()
    }
}

impl fmt::Debug for ProvisioningParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningParams")
            .field("client_name", &self.client_name)
            .field("postgres_password", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("initial_password", &"<redacted>")
            .finish()
    }
}

/// Captured output of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Best error description: stderr, else stdout, else [`UNKNOWN_ERROR`].
    pub fn error_text(&self) -> String {
        error_text(&self.stdout, &self.stderr)
    }
}

/// Pick stderr, then stdout, then [`UNKNOWN_ERROR`], ignoring whitespace-only
/// streams.
pub fn error_text(stdout: &str, stderr: &str) -> String {
    [stderr.trim(), stdout.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}

/// Reasons a provisioning command could not produce a [`CommandOutput`].
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// Remote dispatch was selected but its settings are unset.
    #[error("Remote provisioning is not configured (missing: {})", .missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    /// The shell interpreter or ssh client could not be launched.
    #[error("Required tool is not installed: {program}")]
    ToolMissing { program: String },

    /// The command exceeded its wall-clock limit and was killed.
    #[error("Provisioning timed out after {elapsed_ms}ms")]
    Timeout {
        elapsed_ms: u64,
        /// Output captured before the process was killed.
        stdout: String,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A way of running the provisioning script.
pub trait ProvisioningExecutor: Send + Sync {
    /// Progress line announcing the launch (no secrets).
    fn launch_message(&self) -> String;

    /// Run the script with `params`, giving up after `timeout`.
    fn execute(
        &self,
        params: &ProvisioningParams,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<CommandOutput, ProvisioningError>> + Send;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
