//! Route definitions for the demo-signup endpoints.

use axum::routing::post;
use axum::Router;

use crate::handlers::signup;
use crate::state::AppState;

/// Routes mounted at `/signup`.
///
/// ```text
/// POST   /                          -> submit_signup
/// POST   /stream                    -> stream_signup
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(signup::submit_signup))
        .route("/stream", post(signup::stream_signup))
}
