pub mod client_id;
pub mod health;
pub mod signup;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /signup                 demo signup, JSON result (POST)
/// /signup/stream          demo signup, SSE progress stream (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/signup", signup::router())
}
