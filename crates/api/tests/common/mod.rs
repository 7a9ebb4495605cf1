#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use erpbtp_api::config::ServerConfig;
use erpbtp_api::router::build_app_router;
use erpbtp_api::state::AppState;
use erpbtp_core::provisioning::{ExecutionMode, ProvisioningSettings};
use erpbtp_db::DbConfig;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Script body that prints its arguments and succeeds.
pub const SUCCEEDING_SCRIPT: &str = "echo \"stack created for $2\"\n";

/// Script body that fails with a message on stderr.
pub const FAILING_SCRIPT: &str = "echo 'docker: network unreachable' >&2\nexit 2\n";

/// A provisioning script written to a temporary file, removed on drop.
pub struct FakeScript {
    path: tempfile::TempPath,
}

impl FakeScript {
    pub fn new(body: &str) -> Self {
        let mut file = tempfile::Builder::new()
            .suffix(".sh")
            .tempfile()
            .expect("create temp script");
        write!(file, "#!/bin/sh\n{body}").expect("write temp script");
        Self {
            path: file.into_temp_path(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.path.to_path_buf()
    }

    /// Local-mode settings running this script with `/bin/sh`.
    pub fn settings(&self) -> ProvisioningSettings {
        ProvisioningSettings {
            mode: ExecutionMode::Local,
            shell_candidates: vec![PathBuf::from("/bin/sh")],
            local_script: self.path(),
            timeout: Duration::from_secs(10),
            ..ProvisioningSettings::default()
        }
    }
}

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:8080` as CORS origin and a 30-second request timeout.
pub fn test_config(provisioning: ProvisioningSettings) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8080".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        client_id_auto_create: false,
        db: DbConfig::default(),
        provisioning,
    }
}

/// Build the full application router with all middleware layers, provisioning
/// through `script`.
pub fn build_test_app(pool: PgPool, script: &FakeScript) -> Router {
    build_test_app_with(pool, test_config(script.settings()))
}

/// Build the full application router from an explicit configuration.
///
/// Uses the same `build_app_router` as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Database helpers
// ---------------------------------------------------------------------------

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

/// The signup form used across tests; `plan` varies per scenario.
pub fn signup_form(email: &str, plan: &str) -> serde_json::Value {
    serde_json::json!({
        "nom": "Dupont",
        "prenom": "Jean",
        "email": email,
        "entreprise": "Dupont SARL",
        "telephone": "0102030405",
        "effectif": "6-10",
        "plan": plan,
        "cgv": true,
    })
}
