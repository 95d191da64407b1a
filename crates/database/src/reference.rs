//! Ownership checks for foreign keys.
//!
//! A row may only reference clients and opportunities of its own user.
//! Foreign keys alone would accept any existing id, and the cascade rules
//! would then let another user's delete reach the row.

use sqlx::SqliteExecutor;

use crate::error::{DatabaseError, Result};

/// Fails with `NotFound` unless `client_id` belongs to `user_id`.
pub(crate) async fn ensure_client<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: &str,
    client_id: &str,
) -> Result<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM clients WHERE id = ? AND user_id = ?")
        .bind(client_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    found
        .map(|_| ())
        .ok_or_else(|| DatabaseError::not_found("Client", client_id))
}

/// Fails with `NotFound` unless `opportunity_id` belongs to `user_id`.
pub(crate) async fn ensure_opportunity<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: &str,
    opportunity_id: &str,
) -> Result<()> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM opportunities WHERE id = ? AND user_id = ?")
            .bind(opportunity_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

    found
        .map(|_| ())
        .ok_or_else(|| DatabaseError::not_found("Opportunity", opportunity_id))
}
