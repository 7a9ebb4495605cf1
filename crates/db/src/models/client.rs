//! Client entity model and DTOs.

use erpbtp_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Client {
    pub id: DbId,
    pub last_name: String,
    pub first_name: Option<String>,
    pub email: String,
    pub company: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a new client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClient {
    pub last_name: String,
    pub first_name: Option<String>,
    pub email: String,
    pub company: String,
    pub phone: Option<String>,
}
