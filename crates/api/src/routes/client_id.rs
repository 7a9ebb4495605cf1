//! Route definition for the client-id lookup.

use axum::routing::post;
use axum::Router;

use crate::handlers::client_id;
use crate::state::AppState;

/// Mount the lookup at root level (NOT under `/api/v1`), trailing slash
/// included, as existing deployments call it.
pub fn router() -> Router<AppState> {
    Router::new().route("/client-id/", post(client_id::lookup_client_id))
}
