use std::sync::Arc;

use crate::config::ServerConfig;
use crate::signup::SignupOrchestrator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and the rest sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: erpbtp_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Demo-signup workflow (records, provisions, notifies).
    pub orchestrator: Arc<SignupOrchestrator>,
}

impl AppState {
    /// Build state from a pool and configuration, wiring the orchestrator to
    /// the configured provisioning settings.
    pub fn new(pool: erpbtp_db::DbPool, config: ServerConfig) -> Self {
        let orchestrator = SignupOrchestrator::new(pool.clone(), config.provisioning.clone());
        Self {
            pool,
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
        }
    }
}
