//! Remote dispatch: run the provisioning script on a server over `ssh`.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;

use super::executor::{CommandOutput, ProvisioningError, ProvisioningExecutor, ProvisioningParams};
use super::{shell, subprocess};

/// Default remote host. Dispatch refuses to run while the host still has
/// this value.
pub const REMOTE_HOST_PLACEHOLDER: &str = "your-server.example";

pub const DEFAULT_REMOTE_USER: &str = "root";
pub const DEFAULT_REMOTE_SCRIPT: &str = "/opt/erpbtp/create-client-stack.sh";
pub const DEFAULT_SSH_PROGRAM: &str = "ssh";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for remote dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub host: String,
    pub user: String,
    pub script_path: String,
    /// Private key passed with `-i` when set.
    pub identity_file: Option<PathBuf>,
    /// Client binary; `ssh` unless overridden.
    pub ssh_program: String,
    pub connect_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: REMOTE_HOST_PLACEHOLDER.to_string(),
            user: DEFAULT_REMOTE_USER.to_string(),
            script_path: DEFAULT_REMOTE_SCRIPT.to_string(),
            identity_file: None,
            ssh_program: DEFAULT_SSH_PROGRAM.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl RemoteConfig {
    /// Environment variable names of settings that still need a value.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let host = self.host.trim();
        if host.is_empty() || host == REMOTE_HOST_PLACEHOLDER {
            missing.push("PROVISION_REMOTE_HOST");
        }
        if self.user.trim().is_empty() {
            missing.push("PROVISION_REMOTE_USER");
        }
        if self.script_path.trim().is_empty() {
            missing.push("PROVISION_REMOTE_SCRIPT");
        }
        missing
    }
}

/// Runs the script through `ssh user@host '<script> -c .. -p .. -s .. -i ..'`.
#[derive(Debug, Clone)]
pub struct RemoteStrategy {
    config: RemoteConfig,
}

impl RemoteStrategy {
    /// Fails with [`ProvisioningError::Configuration`] before any network I/O
    /// when required settings are missing.
    pub fn new(config: RemoteConfig) -> Result<Self, ProvisioningError> {
        let missing = config.missing_settings();
        if !missing.is_empty() {
            return Err(ProvisioningError::Configuration { missing });
        }
        Ok(Self { config })
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.config.user, self.config.host)
    }

    /// Arguments for the ssh client, ending with the destination and the
    /// quoted remote command.
    pub fn ssh_args(&self, params: &ProvisioningParams) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
        ];
        if let Some(key) = &self.config.identity_file {
            args.push("-i".to_string());
            args.push(key.to_string_lossy().into_owned());
        }
        args.push(self.destination());
        args.push(shell::remote_command(&self.config.script_path, params));
        args
    }
}

impl ProvisioningExecutor for RemoteStrategy {
    fn launch_message(&self) -> String {
        format!("Connecting to {} over ssh", self.destination())
    }

    async fn execute(
        &self,
        params: &ProvisioningParams,
        timeout: Duration,
    ) -> Result<CommandOutput, ProvisioningError> {
        let mut cmd = Command::new(&self.config.ssh_program);
        cmd.args(self.ssh_args(params));
        subprocess::run_command(&mut cmd, timeout).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
