//! Task CRUD operations.
//!
//! Reads join the linked client and opportunity, when present.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::joined::{joined_client, joined_opportunity, CLIENT_JOIN_COLUMNS, OPPORTUNITY_JOIN_COLUMNS};
use crate::models::{NewTask, Task, TaskUpdate};
use crate::reference::{ensure_client, ensure_opportunity};

/// Check that the task's links point at the user's own records.
async fn ensure_links(
    conn: &mut sqlx::SqliteConnection,
    user_id: &str,
    client_id: Option<&str>,
    opportunity_id: Option<&str>,
) -> Result<()> {
    if let Some(client_id) = client_id {
        ensure_client(&mut *conn, user_id, client_id).await?;
    }
    if let Some(opportunity_id) = opportunity_id {
        ensure_opportunity(&mut *conn, user_id, opportunity_id).await?;
    }
    Ok(())
}

fn select_joined(filter: &str, order: &str) -> String {
    format!(
        r#"
        SELECT t.id, t.user_id, t.client_id, t.opportunity_id, t.title, t.description,
               t.due_date, t.priority, t.status, t.created_at, t.updated_at,
               {CLIENT_JOIN_COLUMNS},
               {OPPORTUNITY_JOIN_COLUMNS}
        FROM tasks t
        LEFT JOIN clients c ON c.id = t.client_id AND c.user_id = t.user_id
        LEFT JOIN opportunities op ON op.id = t.opportunity_id AND op.user_id = t.user_id
        WHERE {filter}
        {order}
        "#
    )
}

fn from_joined_row(row: &SqliteRow) -> std::result::Result<Task, sqlx::Error> {
    let mut task = Task::from_row(row)?;
    task.client = joined_client(row)?;
    task.opportunity = joined_opportunity(row)?;
    Ok(task)
}

/// Create a new task.
pub async fn create_task(pool: &SqlitePool, user_id: &str, new: &NewTask) -> Result<Task> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    ensure_links(&mut tx, user_id, new.client_id.as_deref(), new.opportunity_id.as_deref()).await?;

    sqlx::query(
        r#"
        INSERT INTO tasks
            (id, user_id, client_id, opportunity_id, title, description, due_date,
             priority, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&new.client_id)
    .bind(&new.opportunity_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.due_date)
    .bind(new.priority)
    .bind(new.status)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let task = fetch_task(&mut *tx, user_id, &id).await?;
    tx.commit().await?;

    tracing::debug!(task_id = %id, "Created task");
    Ok(task)
}

/// Get a task by ID with its joined client and opportunity.
pub async fn get_task(pool: &SqlitePool, user_id: &str, id: &str) -> Result<Task> {
    fetch_task(pool, user_id, id).await
}

async fn fetch_task<'e>(executor: impl SqliteExecutor<'e>, user_id: &str, id: &str) -> Result<Task> {
    let sql = select_joined("t.id = ? AND t.user_id = ?", "");
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Task", id))?;

    Ok(from_joined_row(&row)?)
}

/// List a user's tasks by due date, earliest first; undated tasks last.
pub async fn list_tasks(pool: &SqlitePool, user_id: &str) -> Result<Vec<Task>> {
    let sql = select_joined(
        "t.user_id = ?",
        "ORDER BY t.due_date IS NULL, t.due_date ASC, t.created_at DESC",
    );
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;

    let tasks = rows
        .iter()
        .map(from_joined_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(tasks)
}

/// Apply a partial update and return the joined row.
pub async fn update_task(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    update: TaskUpdate,
) -> Result<Task> {
    let mut tx = pool.begin().await?;

    let mut task = fetch_task(&mut *tx, user_id, id).await?;
    update.apply(&mut task);
    ensure_links(&mut tx, user_id, task.client_id.as_deref(), task.opportunity_id.as_deref()).await?;

    sqlx::query(
        r#"
        UPDATE tasks
        SET client_id = ?, opportunity_id = ?, title = ?, description = ?, due_date = ?,
            priority = ?, status = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&task.client_id)
    .bind(&task.opportunity_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.due_date)
    .bind(task.priority)
    .bind(task.status)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let task = fetch_task(&mut *tx, user_id, id).await?;
    tx.commit().await?;

    Ok(task)
}

/// Delete a task.
pub async fn delete_task(pool: &SqlitePool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM tasks
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Task", id));
    }

    Ok(())
}
