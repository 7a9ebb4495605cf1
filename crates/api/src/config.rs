use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use erpbtp_core::provisioning::local::DEFAULT_SHELL_CANDIDATES;
use erpbtp_core::provisioning::remote::{
    RemoteConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REMOTE_SCRIPT, DEFAULT_REMOTE_USER,
    DEFAULT_SSH_PROGRAM, REMOTE_HOST_PLACEHOLDER,
};
use erpbtp_core::provisioning::settings::{DEFAULT_LOCAL_SCRIPT, DEFAULT_PROVISION_TIMEOUT};
use erpbtp_core::provisioning::{ExecutionMode, ProvisioningSettings};
use erpbtp_db::DbConfig;

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables (or a `.env` file).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `330`). Must stay above the
    /// provisioning timeout or the signup request is cut short.
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Create unknown clients from the lookup endpoint when enough fields are
    /// supplied (default: `false`).
    pub client_id_auto_create: bool,
    /// Database connection settings.
    pub db: DbConfig,
    /// Provisioning dispatch settings.
    pub provisioning: ProvisioningSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                               |
    /// |----------------------------------|---------------------------------------|
    /// | `HOST`                           | `0.0.0.0`                             |
    /// | `PORT`                           | `8000`                                |
    /// | `CORS_ORIGINS`                   | `http://localhost:8080`               |
    /// | `REQUEST_TIMEOUT_SECS`           | `330`                                 |
    /// | `SHUTDOWN_TIMEOUT_SECS`          | `30`                                  |
    /// | `CLIENT_ID_AUTO_CREATE`          | `false`                               |
    /// | `DATABASE_URL`                   | unset (overrides `DB_*`)              |
    /// | `DB_HOST`                        | `localhost`                           |
    /// | `DB_PORT`                        | `5432`                                |
    /// | `DB_NAME`                        | `erpbtp_clients`                      |
    /// | `DB_USER`                        | `erp_user`                            |
    /// | `DB_PASSWORD`                    | empty                                 |
    /// | `DB_MAX_CONNECTIONS`             | `20`                                  |
    /// | `PROVISION_MODE`                 | `auto`                                |
    /// | `PROVISION_SHELL`                | probed                                |
    /// | `PROVISION_LOCAL_SCRIPT`         | `./create-client-stack.sh`            |
    /// | `PROVISION_REMOTE_HOST`          | `your-server.example` (placeholder)   |
    /// | `PROVISION_REMOTE_USER`          | `root`                                |
    /// | `PROVISION_REMOTE_SCRIPT`        | `/opt/erpbtp/create-client-stack.sh`  |
    /// | `PROVISION_SSH_KEY`              | unset                                 |
    /// | `PROVISION_SSH_PROGRAM`          | `ssh`                                 |
    /// | `PROVISION_CONNECT_TIMEOUT_SECS` | `10`                                  |
    /// | `PROVISION_TIMEOUT_SECS`         | `300`                                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let cors_origins: Vec<String> = env
            .string("CORS_ORIGINS", "http://localhost:8080")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let defaults = DbConfig::default();
        let db = DbConfig {
            host: env.string("DB_HOST", &defaults.host),
            port: env.parse("DB_PORT", defaults.port)?,
            name: env.string("DB_NAME", &defaults.name),
            user: env.string("DB_USER", &defaults.user),
            password: env.string("DB_PASSWORD", &defaults.password),
            max_connections: env.parse("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            url: env.optional("DATABASE_URL"),
        };

        Ok(Self {
            host: env.string("HOST", "0.0.0.0"),
            port: env.parse("PORT", 8000)?,
            cors_origins,
            request_timeout_secs: env.parse("REQUEST_TIMEOUT_SECS", 330)?,
            shutdown_timeout_secs: env.parse("SHUTDOWN_TIMEOUT_SECS", 30)?,
            client_id_auto_create: env.flag("CLIENT_ID_AUTO_CREATE")?,
            db,
            provisioning: provisioning_settings(&env)?,
        })
    }
}

fn provisioning_settings<F>(env: &Env<F>) -> Result<ProvisioningSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mode: ExecutionMode = env.parse("PROVISION_MODE", ExecutionMode::Auto)?;

    // An explicit shell replaces probing entirely.
    let shell_candidates = match env.optional("PROVISION_SHELL") {
        Some(shell) => vec![PathBuf::from(shell)],
        None => DEFAULT_SHELL_CANDIDATES.iter().map(PathBuf::from).collect(),
    };

    let remote = RemoteConfig {
        host: env.string("PROVISION_REMOTE_HOST", REMOTE_HOST_PLACEHOLDER),
        user: env.string("PROVISION_REMOTE_USER", DEFAULT_REMOTE_USER),
        script_path: env.string("PROVISION_REMOTE_SCRIPT", DEFAULT_REMOTE_SCRIPT),
        identity_file: env.optional("PROVISION_SSH_KEY").map(PathBuf::from),
        ssh_program: env.string("PROVISION_SSH_PROGRAM", DEFAULT_SSH_PROGRAM),
        connect_timeout_secs: env
            .parse("PROVISION_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
    };

    let timeout_secs = env.parse("PROVISION_TIMEOUT_SECS", DEFAULT_PROVISION_TIMEOUT.as_secs())?;

    Ok(ProvisioningSettings {
        mode,
        shell_candidates,
        local_script: PathBuf::from(env.string("PROVISION_LOCAL_SCRIPT", DEFAULT_LOCAL_SCRIPT)),
        remote,
        timeout: Duration::from_secs(timeout_secs),
    })
}

/// Typed accessors over a key lookup. Blank values count as unset.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                var: key,
                reason: e.to_string(),
                value,
            }),
        }
    }

    fn flag(&self, key: &'static str) -> Result<bool, ConfigError> {
        match self.optional(key).map(|v| v.to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
            Some(value) => Err(ConfigError::Invalid {
                var: key,
                value,
                reason: "expected true or false".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.request_timeout_secs, 330);
        assert!(!config.client_id_auto_create);
        assert_eq!(config.db, DbConfig::default());
        assert_eq!(config.provisioning.mode, ExecutionMode::Auto);
        assert_eq!(config.provisioning.timeout, Duration::from_secs(300));
        assert_eq!(config.provisioning.remote.host, REMOTE_HOST_PLACEHOLDER);
        assert_eq!(config.provisioning.shell_candidates.len(), 4);
    }

    #[test]
    fn request_timeout_exceeds_provisioning_timeout_by_default() {
        let config = config_from(&[]).unwrap();
        assert!(config.request_timeout_secs > config.provisioning.timeout.as_secs());
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("DB_HOST", "192.168.1.14"),
            ("DB_PASSWORD", "s3cret"),
            ("CLIENT_ID_AUTO_CREATE", "true"),
            ("PROVISION_MODE", "remote"),
            ("PROVISION_REMOTE_HOST", "10.0.0.5"),
            ("PROVISION_SSH_KEY", "/root/.ssh/id_ed25519"),
            ("PROVISION_SHELL", "/usr/bin/zsh"),
            ("CORS_ORIGINS", "https://erpbtp.fr, https://www.erpbtp.fr"),
        ])
        .unwrap();
        assert_eq!(config.db.host, "192.168.1.14");
        assert_eq!(config.db.password, "s3cret");
        assert!(config.client_id_auto_create);
        assert_eq!(config.provisioning.mode, ExecutionMode::Remote);
        assert_eq!(config.provisioning.remote.host, "10.0.0.5");
        assert_eq!(
            config.provisioning.remote.identity_file,
            Some(PathBuf::from("/root/.ssh/id_ed25519"))
        );
        assert_eq!(
            config.provisioning.shell_candidates,
            vec![PathBuf::from("/usr/bin/zsh")]
        );
        assert_eq!(
            config.cors_origins,
            vec!["https://erpbtp.fr", "https://www.erpbtp.fr"]
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "  "), ("DB_NAME", "")]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.db.name, "erpbtp_clients");
    }

    #[test]
    fn invalid_number_is_reported_with_its_variable() {
        assert_matches!(
            config_from(&[("DB_PORT", "postgres")]),
            Err(ConfigError::Invalid { var: "DB_PORT", .. })
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert_matches!(
            config_from(&[("PROVISION_MODE", "cloud")]),
            Err(ConfigError::Invalid { var: "PROVISION_MODE", .. })
        );
    }

    #[test]
    fn bad_flag_is_rejected() {
        assert_matches!(
            config_from(&[("CLIENT_ID_AUTO_CREATE", "maybe")]),
            Err(ConfigError::Invalid { var: "CLIENT_ID_AUTO_CREATE", .. })
        );
    }
}
