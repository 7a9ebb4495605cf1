//! Client-id lookup used by the per-client deployments to find their
//! billing record.

use axum::extract::State;
use axum::Json;
use erpbtp_core::types::DbId;
use erpbtp_db::models::client::CreateClient;
use erpbtp_db::repositories::ClientRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Lookup body. `entreprise` and `email` are only used for auto-creation.
#[derive(Debug, Deserialize)]
pub struct ClientIdRequest {
    pub nom: String,
    #[serde(default)]
    pub entreprise: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClientIdResponse {
    pub id: DbId,
    /// `true` when the client was created by this call.
    pub created: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /client-id/
///
/// Return the id of the most recent client with the given last name. When
/// auto-creation is enabled and both `entreprise` and `email` are supplied,
/// an unknown name is created instead of answering 404.
pub async fn lookup_client_id(
    State(state): State<AppState>,
    Json(input): Json<ClientIdRequest>,
) -> AppResult<Json<ClientIdResponse>> {
    let last_name = input.nom.trim();
    if last_name.is_empty() {
        return Err(AppError::BadRequest("nom is required".to_string()));
    }

    let mut conn = state.pool.acquire().await?;
    if let Some(client) = ClientRepo::find_latest_by_last_name(&mut conn, last_name).await? {
        return Ok(Json(ClientIdResponse {
            id: client.id,
            created: false,
        }));
    }

    if state.config.client_id_auto_create {
        if let (Some(company), Some(email)) = (non_blank(&input.entreprise), non_blank(&input.email))
        {
            let (client, created) = ClientRepo::upsert(
                &mut conn,
                &CreateClient {
                    last_name: last_name.to_string(),
                    first_name: None,
                    email: email.to_string(),
                    company: company.to_string(),
                    phone: None,
                },
            )
            .await?;
            tracing::info!(client_id = client.id, created, "Client resolved by auto-create lookup");
            return Ok(Json(ClientIdResponse {
                id: client.id,
                created,
            }));
        }
    }

    Err(AppError::NotFound(format!("Client not found: {last_name}")))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
