//! Client CRUD operations.
//!
//! Every function takes the owning user's id and filters on it.

use chrono::Utc;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};

use crate::error::{DatabaseError, Result};
use crate::models::{Client, ClientUpdate, NewClient};

/// Create a new client owned by `user_id`.
pub async fn create_client(pool: &SqlitePool, user_id: &str, new: &NewClient) -> Result<Client> {
    let now = Utc::now();
    let client = Client {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: new.name.clone(),
        email: new.email.clone(),
        phone: new.phone.clone(),
        company: new.company.clone(),
        position: new.position.clone(),
        notes: new.notes.clone(),
        status: new.status,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO clients
            (id, user_id, name, email, phone, company, position, notes, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&client.id)
    .bind(&client.user_id)
    .bind(&client.name)
    .bind(&client.email)
    .bind(&client.phone)
    .bind(&client.company)
    .bind(&client.position)
    .bind(&client.notes)
    .bind(client.status)
    .bind(client.created_at)
    .bind(client.updated_at)
    .execute(pool)
    .await?;

    tracing::debug!(client_id = %client.id, "Created client");
    Ok(client)
}

/// Get a client by ID.
pub async fn get_client(pool: &SqlitePool, user_id: &str, id: &str) -> Result<Client> {
    fetch_client(pool, user_id, id).await
}

async fn fetch_client<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: &str,
    id: &str,
) -> Result<Client> {
    sqlx::query_as::<_, Client>(
        r#"
        SELECT id, user_id, name, email, phone, company, position, notes, status,
               created_at, updated_at
        FROM clients
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Client", id))
}

/// List a user's clients, newest first.
pub async fn list_clients(pool: &SqlitePool, user_id: &str) -> Result<Vec<Client>> {
    let clients = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, user_id, name, email, phone, company, position, notes, status,
               created_at, updated_at
        FROM clients
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(clients)
}

/// Apply a partial update and return the stored client.
///
/// No version check: concurrent updates resolve as last write wins.
pub async fn update_client(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    update: ClientUpdate,
) -> Result<Client> {
    let mut tx: Transaction<'_, Sqlite> = pool.begin().await?;

    let mut client = fetch_client(&mut *tx, user_id, id).await?;
    update.apply(&mut client);
    client.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE clients
        SET name = ?, email = ?, phone = ?, company = ?, position = ?, notes = ?,
            status = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&client.name)
    .bind(&client.email)
    .bind(&client.phone)
    .bind(&client.company)
    .bind(&client.position)
    .bind(&client.notes)
    .bind(client.status)
    .bind(client.updated_at)
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(client)
}

/// Delete a client. Opportunities and interactions for it go with it;
/// tasks keep existing with the link cleared.
pub async fn delete_client(pool: &SqlitePool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM clients
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Client", id));
    }

    Ok(())
}

