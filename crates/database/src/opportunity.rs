//! Opportunity CRUD operations.
//!
//! Reads join the owning client. Writes return the joined row as stored.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::joined::{joined_client, CLIENT_JOIN_COLUMNS};
use crate::models::{NewOpportunity, Opportunity, OpportunityUpdate};
use crate::reference::ensure_client;

fn select_joined(filter: &str, order: &str) -> String {
    format!(
        r#"
        SELECT o.id, o.user_id, o.client_id, o.title, o.description, o.value, o.stage,
               o.probability, o.expected_close_date, o.created_at, o.updated_at,
               {CLIENT_JOIN_COLUMNS}
        FROM opportunities o
        LEFT JOIN clients c ON c.id = o.client_id AND c.user_id = o.user_id
        WHERE {filter}
        {order}
        "#
    )
}

fn from_joined_row(row: &SqliteRow) -> std::result::Result<Opportunity, sqlx::Error> {
    let mut opportunity = Opportunity::from_row(row)?;
    opportunity.client = joined_client(row)?;
    Ok(opportunity)
}

/// Create a new opportunity for one of the user's clients.
pub async fn create_opportunity(
    pool: &SqlitePool,
    user_id: &str,
    new: &NewOpportunity,
) -> Result<Opportunity> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    ensure_client(&mut *tx, user_id, &new.client_id).await?;

    sqlx::query(
        r#"
        INSERT INTO opportunities
            (id, user_id, client_id, title, description, value, stage, probability,
             expected_close_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&new.client_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.value)
    .bind(new.stage)
    .bind(new.probability)
    .bind(new.expected_close_date)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let opportunity = fetch_opportunity(&mut *tx, user_id, &id).await?;
    tx.commit().await?;

    tracing::debug!(opportunity_id = %id, client_id = %new.client_id, "Created opportunity");
    Ok(opportunity)
}

/// Get an opportunity by ID, joined with its client.
pub async fn get_opportunity(pool: &SqlitePool, user_id: &str, id: &str) -> Result<Opportunity> {
    fetch_opportunity(pool, user_id, id).await
}

async fn fetch_opportunity<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: &str,
    id: &str,
) -> Result<Opportunity> {
    let sql = select_joined("o.id = ? AND o.user_id = ?", "");
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Opportunity", id))?;

    Ok(from_joined_row(&row)?)
}

/// List a user's opportunities, newest first, joined with their clients.
pub async fn list_opportunities(pool: &SqlitePool, user_id: &str) -> Result<Vec<Opportunity>> {
    let sql = select_joined("o.user_id = ?", "ORDER BY o.created_at DESC, o.rowid DESC");
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;

    let opportunities = rows
        .iter()
        .map(from_joined_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(opportunities)
}

/// Apply a partial update and return the joined row.
pub async fn update_opportunity(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    update: OpportunityUpdate,
) -> Result<Opportunity> {
    let mut tx = pool.begin().await?;

    let mut opportunity = fetch_opportunity(&mut *tx, user_id, id).await?;
    update.apply(&mut opportunity);
    ensure_client(&mut *tx, user_id, &opportunity.client_id).await?;

    sqlx::query(
        r#"
        UPDATE opportunities
        SET client_id = ?, title = ?, description = ?, value = ?, stage = ?,
            probability = ?, expected_close_date = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&opportunity.client_id)
    .bind(&opportunity.title)
    .bind(&opportunity.description)
    .bind(opportunity.value)
    .bind(opportunity.stage)
    .bind(opportunity.probability)
    .bind(opportunity.expected_close_date)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    // Re-read so the joined client reflects a changed client_id.
    let opportunity = fetch_opportunity(&mut *tx, user_id, id).await?;
    tx.commit().await?;

    Ok(opportunity)
}

/// Delete an opportunity. Tasks linked to it keep existing, unlinked.
pub async fn delete_opportunity(pool: &SqlitePool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM opportunities
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Opportunity", id));
    }

    Ok(())
}
