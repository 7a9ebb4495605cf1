//! PostgreSQL persistence for clients and subscriptions.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Connection settings, built once at startup and passed to [`create_pool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    /// Full connection URL; takes precedence over the individual fields.
    pub url: Option<String>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "erpbtp_clients".to_string(),
            user: "erp_user".to_string(),
            password: String::new(),
            max_connections: 20,
            url: None,
        }
    }
}

impl DbConfig {
    /// Connection options. Credentials are passed as structured options, so
    /// passwords containing `@` or `:` need no escaping.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url);
        }
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .username(&self.user)
            .password(&self.password))
    }
}

/// Create a connection pool from the given configuration.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(config.connect_options()?)
        .await
}

/// Round-trip a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_takes_precedence() {
        let config = DbConfig {
            url: Some("postgres://u:p@db.internal:6543/other".to_string()),
            ..DbConfig::default()
        };
        let options = config.connect_options().expect("options");
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("other"));
    }

    #[test]
    fn fields_build_options() {
        let config = DbConfig {
            host: "192.168.1.14".to_string(),
            port: 5433,
            password: "p@ss:word".to_string(),
            ..DbConfig::default()
        };
        let options = config.connect_options().expect("options");
        assert_eq!(options.get_host(), "192.168.1.14");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_username(), "erp_user");
        assert_eq!(options.get_database(), Some("erpbtp_clients"));
    }

    #[test]
    fn malformed_url_is_an_error() {
        let config = DbConfig {
            url: Some("not a url".to_string()),
            ..DbConfig::default()
        };
        assert!(config.connect_options().is_err());
    }
}
