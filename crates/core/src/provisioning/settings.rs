//! Provisioning configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CoreError;

use super::local::DEFAULT_SHELL_CANDIDATES;
use super::remote::RemoteConfig;

/// Overall wall-clock limit for one provisioning run.
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(300);

/// Script run by local dispatch when none is configured.
pub const DEFAULT_LOCAL_SCRIPT: &str = "./create-client-stack.sh";

/// How the dispatcher picks its strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Local when a shell is detected, remote otherwise.
    #[default]
    Auto,
    Local,
    Remote,
}

impl FromStr for ExecutionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(CoreError::Validation(format!(
                "Unknown provisioning mode '{other}' (expected auto, local or remote)"
            ))),
        }
    }
}

/// Everything the dispatcher needs to pick and run a strategy.
#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
    pub mode: ExecutionMode,
    /// Shell interpreters probed in order for local dispatch.
    pub shell_candidates: Vec<PathBuf>,
    pub local_script: PathBuf,
    pub remote: RemoteConfig,
    pub timeout: Duration,
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Auto,
            shell_candidates: DEFAULT_SHELL_CANDIDATES.iter().map(PathBuf::from).collect(),
            local_script: PathBuf::from(DEFAULT_LOCAL_SCRIPT),
            remote: RemoteConfig::default(),
            timeout: DEFAULT_PROVISION_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!("auto".parse::<ExecutionMode>().unwrap(), ExecutionMode::Auto);
        assert_eq!("".parse::<ExecutionMode>().unwrap(), ExecutionMode::Auto);
        assert_eq!("LOCAL".parse::<ExecutionMode>().unwrap(), ExecutionMode::Local);
        assert_eq!(" remote ".parse::<ExecutionMode>().unwrap(), ExecutionMode::Remote);
        assert_matches!("cloud".parse::<ExecutionMode>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn default_timeout_is_five_minutes() {
        assert_eq!(ProvisioningSettings::default().timeout, Duration::from_secs(300));
    }
}
