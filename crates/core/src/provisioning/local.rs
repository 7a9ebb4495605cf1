//! Local dispatch: run the provisioning script with a shell on this host.
//!
//! The four parameters are passed as separate argv entries, never through a
//! shell command string.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use super::executor::{CommandOutput, ProvisioningError, ProvisioningExecutor, ProvisioningParams};
use super::subprocess;

/// Interpreters probed, in order, when no shell is configured explicitly.
pub const DEFAULT_SHELL_CANDIDATES: [&str; 4] =
    ["/bin/bash", "/usr/bin/bash", "/usr/local/bin/bash", "/bin/sh"];

/// Return the first candidate that exists as a file.
pub fn detect_shell(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

/// Runs `<shell> <script> -c .. -p .. -s .. -i ..` as a direct subprocess.
#[derive(Debug, Clone)]
pub struct LocalStrategy {
    shell: PathBuf,
    script_path: PathBuf,
}

impl LocalStrategy {
    pub fn new(shell: impl Into<PathBuf>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            script_path: script_path.into(),
        }
    }

    pub fn shell(&self) -> &Path {
        &self.shell
    }

    /// The full argument vector after the shell program.
    pub fn args(&self, params: &ProvisioningParams) -> Vec<String> {
        let mut args = vec![self.script_path.to_string_lossy().into_owned()];
        args.extend(params.to_args());
        args
    }
}

impl ProvisioningExecutor for LocalStrategy {
    fn launch_message(&self) -> String {
        format!(
            "Launching {} with local shell {}",
            self.script_path.display(),
            self.shell.display()
        )
    }

    async fn execute(
        &self,
        params: &ProvisioningParams,
        timeout: Duration,
    ) -> Result<CommandOutput, ProvisioningError> {
        let mut cmd = Command::new(&self.shell);
        cmd.args(self.args(params));
        subprocess::run_command(&mut cmd, timeout).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
