//! SQLite persistence layer for CRM Pro.
//!
//! This crate provides async database operations for accounts, sessions,
//! clients, opportunities, tasks and interactions using SQLx with SQLite.
//! Every CRM table carries the owning user's id, and every query in this
//! crate filters on it.
//!
//! # Example
//!
//! ```no_run
//! use database::{client, models::NewClient, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:crm.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a client for an existing account
//!     let new = NewClient {
//!         name: "Acme".to_string(),
//!         ..NewClient::default()
//!     };
//!     client::create_client(db.pool(), "c27fb365-0c84-4cf2-8555-814bb065e448", &new).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod client;
pub mod error;
pub mod interaction;
mod joined;
pub mod models;
pub mod opportunity;
mod reference;
pub mod session;
pub mod task;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Account, Client, ClientStatus, ClientUpdate, Interaction, InteractionType, InteractionUpdate,
    NewAccount, NewClient, NewInteraction, NewOpportunity, NewTask, Opportunity,
    OpportunityUpdate, ParseEnumError, PasswordReset, Priority, ProfileUpdate, Session, Stage,
    Task, TaskStatus, TaskUpdate,
};
pub use validation::{ValidationError, ValidationErrors};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/crm.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// In-memory databases are per connection, so use a pool size of 1 for them.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check that the database answers a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn test_account(db: &Database, email: &str) -> Account {
        let new = NewAccount {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: Some("Test User".to_string()),
        };
        account::create_account(db.pool(), &new).await.unwrap()
    }

    fn new_client(name: &str) -> NewClient {
        NewClient {
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            company: Some("Acme".to_string()),
            ..NewClient::default()
        }
    }

    #[tokio::test]
    async fn test_client_crud() {
        let db = test_db().await;
        let owner = test_account(&db, "owner@example.com").await;
        let pool = db.pool();

        // Create
        let created = client::create_client(pool, &owner.id, &new_client("Alice"))
            .await
            .unwrap();
        assert_eq!(created.status, ClientStatus::Prospect);

        // Read
        let fetched = client::get_client(pool, &owner.id, &created.id).await.unwrap();
        assert_eq!(fetched.name, "Alice");
        assert_eq!(fetched.email.as_deref(), Some("alice@example.com"));
        assert_eq!(fetched.company.as_deref(), Some("Acme"));

        // Update
        let update = ClientUpdate {
            status: Some(ClientStatus::Active),
            company: Some(None),
            ..ClientUpdate::default()
        };
        let updated = client::update_client(pool, &owner.id, &created.id, update)
            .await
            .unwrap();
        assert_eq!(updated.status, ClientStatus::Active);
        assert_eq!(updated.company, None);
        assert_eq!(updated.name, "Alice");

        let fetched = client::get_client(pool, &owner.id, &created.id).await.unwrap();
        assert_eq!(fetched, updated);

        // List
        client::create_client(pool, &owner.id, &new_client("Bob"))
            .await
            .unwrap();
        let clients = client::list_clients(pool, &owner.id).await.unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].name, "Bob", "newest first");

        // Delete
        client::delete_client(pool, &owner.id, &created.id).await.unwrap();
        let result = client::get_client(pool, &owner.id, &created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_rows_are_isolated_per_user() {
        let db = test_db().await;
        let alice = test_account(&db, "alice@example.com").await;
        let mallory = test_account(&db, "mallory@example.com").await;
        let pool = db.pool();

        let created = client::create_client(pool, &alice.id, &new_client("Secret"))
            .await
            .unwrap();

        assert!(client::list_clients(pool, &mallory.id).await.unwrap().is_empty());
        assert!(client::get_client(pool, &mallory.id, &created.id)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(client::update_client(
            pool,
            &mallory.id,
            &created.id,
            ClientUpdate::status(ClientStatus::Inactive)
        )
        .await
        .unwrap_err()
        .is_not_found());
        assert!(client::delete_client(pool, &mallory.id, &created.id)
            .await
            .unwrap_err()
            .is_not_found());

        let still_there = client::get_client(pool, &alice.id, &created.id).await.unwrap();
        assert_eq!(still_there.status, ClientStatus::Prospect);
    }

    #[tokio::test]
    async fn test_opportunity_joined_read() {
        let db = test_db().await;
        let owner = test_account(&db, "owner@example.com").await;
        let pool = db.pool();
        let acme = client::create_client(pool, &owner.id, &new_client("Acme"))
            .await
            .unwrap();

        let new = NewOpportunity {
            client_id: acme.id.clone(),
            title: "Renewal".to_string(),
            value: Some(1000.0),
            probability: Some(60),
            expected_close_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            ..NewOpportunity::default()
        };
        let created = opportunity::create_opportunity(pool, &owner.id, &new)
            .await
            .unwrap();
        assert_eq!(created.stage, Stage::Prospect);
        assert_eq!(created.value, Some(1000.0));
        assert_eq!(created.client.as_ref().map(|c| c.name.as_str()), Some("Acme"));

        let updated = opportunity::update_opportunity(
            pool,
            &owner.id,
            &created.id,
            OpportunityUpdate {
                stage: Some(Stage::ClosedWon),
                value: Some(None),
                ..OpportunityUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.stage, Stage::ClosedWon);
        assert_eq!(updated.value, None);
        assert!(updated.client.is_some());

        let listed = opportunity::list_opportunities(pool, &owner.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].expected_close_date, new.expected_close_date);
    }

    #[tokio::test]
    async fn test_opportunity_requires_existing_client() {
        let db = test_db().await;
        let owner = test_account(&db, "owner@example.com").await;

        let new = NewOpportunity {
            client_id: "missing".to_string(),
            title: "Ghost".to_string(),
            ..NewOpportunity::default()
        };
        let result = opportunity::create_opportunity(db.pool(), &owner.id, &new).await;
        assert!(matches!(result, Err(DatabaseError::Sqlx(_))));
    }

    #[tokio::test]
    async fn test_task_ordering_and_joins() {
        let db = test_db().await;
        let owner = test_account(&db, "owner@example.com").await;
        let pool = db.pool();
        let acme = client::create_client(pool, &owner.id, &new_client("Acme"))
            .await
            .unwrap();
        let deal = opportunity::create_opportunity(
            pool,
            &owner.id,
            &NewOpportunity {
                client_id: acme.id.clone(),
                title: "Deal".to_string(),
                ..NewOpportunity::default()
            },
        )
        .await
        .unwrap();

        for (title, due) in [("undated", None), ("later", Some(20)), ("sooner", Some(10))] {
            let new = NewTask {
                client_id: Some(acme.id.clone()),
                opportunity_id: Some(deal.id.clone()),
                title: title.to_string(),
                due_date: due.and_then(|d| NaiveDate::from_ymd_opt(2024, 6, d)),
                ..NewTask::default()
            };
            task::create_task(pool, &owner.id, &new).await.unwrap();
        }

        let tasks = task::list_tasks(pool, &owner.id).await.unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["sooner", "later", "undated"]);
        assert_eq!(tasks[0].priority, Priority::Medium);
        assert_eq!(tasks[0].status, TaskStatus::Pending);
        assert_eq!(tasks[0].client.as_ref().unwrap().name, "Acme");
        assert_eq!(tasks[0].opportunity.as_ref().unwrap().title, "Deal");

        let done = task::update_task(
            pool,
            &owner.id,
            &tasks[0].id,
            TaskUpdate::status(TaskStatus::Completed),
        )
        .await
        .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.title, "sooner");
    }

    #[tokio::test]
    async fn test_deleting_client_is_not_blocked_by_references() {
        let db = test_db().await;
        let owner = test_account(&db, "owner@example.com").await;
        let pool = db.pool();
        let acme = client::create_client(pool, &owner.id, &new_client("Acme"))
            .await
            .unwrap();
        opportunity::create_opportunity(
            pool,
            &owner.id,
            &NewOpportunity {
                client_id: acme.id.clone(),
                title: "Deal".to_string(),
                ..NewOpportunity::default()
            },
        )
        .await
        .unwrap();
        let linked = task::create_task(
            pool,
            &owner.id,
            &NewTask {
                client_id: Some(acme.id.clone()),
                title: "Call back".to_string(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

        client::delete_client(pool, &owner.id, &acme.id).await.unwrap();

        assert!(opportunity::list_opportunities(pool, &owner.id)
            .await
            .unwrap()
            .is_empty());
        let orphan = task::get_task(pool, &owner.id, &linked.id).await.unwrap();
        assert_eq!(orphan.client_id, None);
        assert!(orphan.client.is_none());
    }

    #[tokio::test]
    async fn test_interactions_filtered_by_client() {
        let db = test_db().await;
        let owner = test_account(&db, "owner@example.com").await;
        let pool = db.pool();
        let acme = client::create_client(pool, &owner.id, &new_client("Acme"))
            .await
            .unwrap();
        let globex = client::create_client(pool, &owner.id, &new_client("Globex"))
            .await
            .unwrap();

        for (client_id, day) in [(&acme.id, 1), (&acme.id, 3), (&globex.id, 2)] {
            let new = NewInteraction {
                client_id: client_id.clone(),
                kind: InteractionType::Call,
                subject: format!("Call {}", day),
                description: None,
                date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            };
            interaction::create_interaction(pool, &owner.id, &new)
                .await
                .unwrap();
        }

        let all = interaction::list_interactions(pool, &owner.id, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].subject, "Call 3", "most recent first");

        let for_acme = interaction::list_interactions(pool, &owner.id, Some(&acme.id))
            .await
            .unwrap();
        assert_eq!(for_acme.len(), 2);
        assert!(for_acme
            .iter()
            .all(|i| i.client.as_ref().map(|c| c.id.as_str()) == Some(acme.id.as_str())));

        let edited = interaction::update_interaction(
            pool,
            &owner.id,
            &for_acme[0].id,
            InteractionUpdate {
                kind: Some(InteractionType::Meeting),
                ..InteractionUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(edited.kind, InteractionType::Meeting);

        interaction::delete_interaction(pool, &owner.id, &edited.id)
            .await
            .unwrap();
        assert_eq!(
            interaction::list_interactions(pool, &owner.id, Some(&acme.id))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_account_email_is_unique_case_insensitively() {
        let db = test_db().await;
        test_account(&db, "Owner@Example.com").await;

        let dup = NewAccount {
            email: "owner@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: None,
        };
        let result = account::create_account(db.pool(), &dup).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        let found = account::get_account_by_email(db.pool(), "OWNER@example.com")
            .await
            .unwrap();
        assert_eq!(found.email, "Owner@Example.com");
    }

    #[tokio::test]
    async fn test_session_expiry_and_reset_tokens() {
        let db = test_db().await;
        let owner = test_account(&db, "owner@example.com").await;
        let pool = db.pool();
        let now = chrono::Utc::now();

        let session = Session {
            token: "tok".to_string(),
            user_id: owner.id.clone(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
        };
        session::create_session(pool, &session).await.unwrap();

        assert!(session::get_active_session(pool, "tok", now).await.unwrap().is_some());
        let later = now + chrono::Duration::hours(2);
        assert!(session::get_active_session(pool, "tok", later).await.unwrap().is_none());
        assert_eq!(session::purge_expired_sessions(pool, later).await.unwrap(), 1);

        let reset = PasswordReset {
            token: "reset".to_string(),
            user_id: owner.id.clone(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
            used_at: None,
        };
        session::create_password_reset(pool, &reset).await.unwrap();
        let used = session::consume_password_reset(pool, "reset", now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(used.user_id, owner.id);
        assert!(session::consume_password_reset(pool, "reset", now)
            .await
            .unwrap()
            .is_none());
    }
}
