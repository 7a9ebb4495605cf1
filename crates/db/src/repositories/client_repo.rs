//! Repository for the `clients` table.

use sqlx::PgConnection;

use crate::models::client::{Client, CreateClient};

/// Column list for clients queries.
const COLUMNS: &str = "id, last_name, first_name, email, company, phone, \
    address, city, postal_code, created_at";

/// Provides lookup and upsert operations for clients.
pub struct ClientRepo;

impl ClientRepo {
    /// Find a client by exact email match.
    pub async fn find_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE email = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Most recently created client with the given last name.
    pub async fn find_latest_by_last_name(
        conn: &mut PgConnection,
        last_name: &str,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM clients
             WHERE last_name = $1
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(last_name)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Return the client with `input.email`, creating it if absent.
    ///
    /// An existing client is returned unchanged. The second element is `true`
    /// when a row was inserted. Concurrent upserts of the same new email
    /// converge on one row through `uq_clients_email`.
    pub async fn upsert(
        conn: &mut PgConnection,
        input: &CreateClient,
    ) -> Result<(Client, bool), sqlx::Error> {
        if let Some(existing) = Self::find_by_email(conn, &input.email).await? {
            return Ok((existing, false));
        }

        let query = format!(
            "INSERT INTO clients (last_name, first_name, email, company, phone)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (email) DO NOTHING
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Client>(&query)
            .bind(&input.last_name)
            .bind(&input.first_name)
            .bind(&input.email)
            .bind(&input.company)
            .bind(&input.phone)
            .fetch_optional(&mut *conn)
            .await?;

        match inserted {
            Some(client) => Ok((client, true)),
            // Another transaction inserted the same email between our read
            // and our insert.
            None => {
                tracing::debug!(email = %input.email, "Client upsert lost insert race, re-reading");
                let client = Self::find_by_email(conn, &input.email)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Ok((client, false))
            }
        }
    }
}
