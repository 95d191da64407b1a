//! Login sessions and password reset tokens.
//!
//! Tokens are generated by the caller; this module only stores and
//! resolves them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{PasswordReset, Session};
use crate::Result;

/// Store a new session.
pub async fn create_session(pool: &SqlitePool, session: &Session) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, created_at, expires_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&session.token)
    .bind(&session.user_id)
    .bind(session.created_at)
    .bind(session.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Resolve a token to a session that has not expired at `now`.
pub async fn get_active_session(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT token, user_id, created_at, expires_at
        FROM sessions
        WHERE token = ? AND expires_at > ?
        "#,
    )
    .bind(token)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Delete a session. Returns whether a session was removed.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE token = ?
        "#,
    )
    .bind(token)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every session of a user (e.g. after a password reset).
pub async fn delete_user_sessions(pool: &SqlitePool, user_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Remove sessions that expired before `now`.
pub async fn purge_expired_sessions(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE expires_at <= ?
        "#,
    )
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Store a new password reset token.
pub async fn create_password_reset(pool: &SqlitePool, reset: &PasswordReset) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO password_resets (token, user_id, created_at, expires_at, used_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&reset.token)
    .bind(&reset.user_id)
    .bind(reset.created_at)
    .bind(reset.expires_at)
    .bind(reset.used_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Consume a reset token: marks it used and returns it, if it is unused and
/// not expired at `now`.
pub async fn consume_password_reset(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<PasswordReset>> {
    let reset = sqlx::query_as::<_, PasswordReset>(
        r#"
        UPDATE password_resets
        SET used_at = ?
        WHERE token = ? AND used_at IS NULL AND expires_at > ?
        RETURNING token, user_id, created_at, expires_at, used_at
        "#,
    )
    .bind(now)
    .bind(token)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(reset)
}
