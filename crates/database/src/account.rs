//! Account (auth user + profile) operations.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Account, NewAccount, ProfileUpdate};

fn map_unique_violation(e: sqlx::Error, email: &str) -> DatabaseError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return DatabaseError::AlreadyExists {
                entity: "Account",
                id: email.to_string(),
            };
        }
    }
    DatabaseError::Sqlx(e)
}

/// Register a new account.
pub async fn create_account(pool: &SqlitePool, new: &NewAccount) -> Result<Account> {
    let now = Utc::now();
    let account = Account {
        id: uuid::Uuid::new_v4().to_string(),
        email: new.email.trim().to_string(),
        password_hash: new.password_hash.clone(),
        full_name: new.full_name.clone(),
        avatar_url: None,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash, full_name, avatar_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&account.id)
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(&account.full_name)
    .bind(&account.avatar_url)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, &account.email))?;

    Ok(account)
}

/// Get an account by ID.
pub async fn get_account(pool: &SqlitePool, id: &str) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, full_name, avatar_url, created_at, updated_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Account", id))
}

/// Get an account by email (case-insensitive).
pub async fn get_account_by_email(pool: &SqlitePool, email: &str) -> Result<Account> {
    let email = email.trim();
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, full_name, avatar_url, created_at, updated_at
        FROM accounts
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Account", email))
}

/// Update profile fields and return the stored account.
pub async fn update_profile(pool: &SqlitePool, id: &str, update: &ProfileUpdate) -> Result<Account> {
    let mut account = get_account(pool, id).await?;
    if let Some(full_name) = &update.full_name {
        account.full_name = Some(full_name.clone());
    }
    if let Some(email) = &update.email {
        account.email = email.trim().to_string();
    }
    if let Some(avatar_url) = &update.avatar_url {
        account.avatar_url = avatar_url.clone();
    }
    account.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE accounts
        SET email = ?, full_name = ?, avatar_url = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&account.email)
    .bind(&account.full_name)
    .bind(&account.avatar_url)
    .bind(account.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, &account.email))?;

    Ok(account)
}

/// Replace an account's password hash.
pub async fn update_password_hash(pool: &SqlitePool, id: &str, password_hash: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET password_hash = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(password_hash)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Account", id));
    }

    Ok(())
}
