//! Interaction CRUD operations.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::joined::{joined_client, CLIENT_JOIN_COLUMNS};
use crate::models::{Interaction, InteractionUpdate, NewInteraction};
use crate::reference::ensure_client;

fn select_joined(filter: &str, order: &str) -> String {
    format!(
        r#"
        SELECT i.id, i.user_id, i.client_id, i.type, i.subject, i.description, i.date,
               i.created_at, i.updated_at,
               {CLIENT_JOIN_COLUMNS}
        FROM interactions i
        LEFT JOIN clients c ON c.id = i.client_id AND c.user_id = i.user_id
        WHERE {filter}
        {order}
        "#
    )
}

fn from_joined_row(row: &SqliteRow) -> std::result::Result<Interaction, sqlx::Error> {
    let mut interaction = Interaction::from_row(row)?;
    interaction.client = joined_client(row)?;
    Ok(interaction)
}

/// Log a new interaction.
pub async fn create_interaction(
    pool: &SqlitePool,
    user_id: &str,
    new: &NewInteraction,
) -> Result<Interaction> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    ensure_client(&mut *tx, user_id, &new.client_id).await?;

    sqlx::query(
        r#"
        INSERT INTO interactions
            (id, user_id, client_id, type, subject, description, date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&new.client_id)
    .bind(new.kind)
    .bind(&new.subject)
    .bind(&new.description)
    .bind(new.date)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let interaction = fetch_interaction(&mut *tx, user_id, &id).await?;
    tx.commit().await?;

    tracing::debug!(interaction_id = %id, client_id = %new.client_id, "Logged interaction");
    Ok(interaction)
}

async fn fetch_interaction<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: &str,
    id: &str,
) -> Result<Interaction> {
    let sql = select_joined("i.id = ? AND i.user_id = ?", "");
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Interaction", id))?;

    Ok(from_joined_row(&row)?)
}

/// List a user's interactions, most recent first, optionally for one client.
pub async fn list_interactions(
    pool: &SqlitePool,
    user_id: &str,
    client_id: Option<&str>,
) -> Result<Vec<Interaction>> {
    let order = "ORDER BY i.date DESC, i.created_at DESC";
    let rows = match client_id {
        Some(client_id) => {
            let sql = select_joined("i.user_id = ? AND i.client_id = ?", order);
            sqlx::query(&sql)
                .bind(user_id)
                .bind(client_id)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = select_joined("i.user_id = ?", order);
            sqlx::query(&sql).bind(user_id).fetch_all(pool).await?
        }
    };

    let interactions = rows
        .iter()
        .map(from_joined_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(interactions)
}

/// Apply a partial update and return the joined row.
pub async fn update_interaction(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    update: InteractionUpdate,
) -> Result<Interaction> {
    let mut tx = pool.begin().await?;

    let mut interaction = fetch_interaction(&mut *tx, user_id, id).await?;
    update.apply(&mut interaction);
    interaction.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE interactions
        SET type = ?, subject = ?, description = ?, date = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(interaction.kind)
    .bind(&interaction.subject)
    .bind(&interaction.description)
    .bind(interaction.date)
    .bind(interaction.updated_at)
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(interaction)
}

/// Delete an interaction.
pub async fn delete_interaction(pool: &SqlitePool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM interactions
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Interaction", id));
    }

    Ok(())
}
