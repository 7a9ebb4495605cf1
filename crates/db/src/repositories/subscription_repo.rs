//! Repository for the `subscriptions` table.

use chrono::{Duration, Utc};
use erpbtp_core::plans::{Plan, Price, SubscriptionStatus};
use erpbtp_core::types::DbId;
use sqlx::PgConnection;

use crate::models::subscription::Subscription;

/// Column list for subscriptions queries.
const COLUMNS: &str = "id, client_id, plan, monthly_price_cents, started_at, ended_at, \
    status, is_trial, trial_ends_at, created_at, updated_at";

/// Provides CRUD operations for subscriptions.
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// The client's active subscription, if any.
    ///
    /// More than one active row breaks the one-active-per-client invariant;
    /// it is logged as an error and the oldest row is returned.
    pub async fn find_active(
        conn: &mut PgConnection,
        client_id: DbId,
    ) -> Result<Option<Subscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subscriptions
             WHERE client_id = $1 AND status = $2
             ORDER BY id
             LIMIT 2"
        );
        let mut rows = sqlx::query_as::<_, Subscription>(&query)
            .bind(client_id)
            .bind(SubscriptionStatus::Active.as_str())
            .fetch_all(&mut *conn)
            .await?;

        if rows.len() > 1 {
            tracing::error!(client_id, "Client has more than one active subscription");
        }
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Count active subscriptions for a client.
    pub async fn count_active(
        conn: &mut PgConnection,
        client_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscriptions WHERE client_id = $1 AND status = $2",
        )
        .bind(client_id)
        .bind(SubscriptionStatus::Active.as_str())
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.0)
    }

    /// Insert an active trial subscription starting now and ending its trial
    /// window after `trial_days`.
    pub async fn create(
        conn: &mut PgConnection,
        client_id: DbId,
        plan: Plan,
        price: Price,
        trial_days: i64,
    ) -> Result<Subscription, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO subscriptions
                (client_id, plan, monthly_price_cents, started_at, status,
                 is_trial, trial_ends_at)
             VALUES ($1, $2, $3, $4, $5, true, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(client_id)
            .bind(plan.as_str())
            .bind(price.cents())
            .bind(now)
            .bind(SubscriptionStatus::Active.as_str())
            .bind(now + Duration::days(trial_days))
            .fetch_one(&mut *conn)
            .await
    }

    /// Move an existing subscription to a new plan in place.
    ///
    /// Resets the start date to now and restarts the trial window.
    pub async fn upgrade(
        conn: &mut PgConnection,
        id: DbId,
        plan: Plan,
        price: Price,
        trial_days: i64,
    ) -> Result<Subscription, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "UPDATE subscriptions SET
                plan = $2,
                monthly_price_cents = $3,
                started_at = $4,
                is_trial = true,
                trial_ends_at = $5,
                updated_at = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(id)
            .bind(plan.as_str())
            .bind(price.cents())
            .bind(now)
            .bind(now + Duration::days(trial_days))
            .fetch_one(&mut *conn)
            .await
    }
}
