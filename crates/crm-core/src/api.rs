//! Tenant-scoped data access.
//!
//! [`ApiService`] is built per request from the caller's session token.
//! Every operation first resolves the session to a user id and then runs a
//! single query filtered on that id, so callers can never reach another
//! user's rows.

use chrono::Utc;
use database::{
    account, client, interaction, opportunity, session, task, Account, Client, ClientUpdate,
    Database, Interaction, InteractionUpdate, NewClient, NewInteraction, NewOpportunity, NewTask,
    Opportunity, OpportunityUpdate, ProfileUpdate, Task, TaskUpdate,
};
use tracing::debug;

use crate::dashboard::DashboardStats;
use crate::error::{ApiError, Result};

/// Data-access service bound to one caller.
#[derive(Debug, Clone)]
pub struct ApiService {
    db: Database,
    token: Option<String>,
}

impl ApiService {
    pub fn new(db: Database, token: Option<String>) -> Self {
        Self { db, token }
    }

    /// Resolve the session token to the caller's user id.
    pub async fn current_user_id(&self) -> Result<String> {
        let token = self.token.as_deref().ok_or(ApiError::NotAuthenticated)?;
        match session::get_active_session(self.db.pool(), token, Utc::now()).await? {
            Some(session) => Ok(session.user_id),
            None => {
                debug!("Session token not active");
                Err(ApiError::NotAuthenticated)
            }
        }
    }

    pub async fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        let user_id = self.current_user_id().await?;
        let pool = self.db.pool();

        let clients = client::list_clients(pool, &user_id).await?;
        let opportunities = opportunity::list_opportunities(pool, &user_id).await?;
        let tasks = task::list_tasks(pool, &user_id).await?;

        Ok(DashboardStats::compute(&clients, &opportunities, &tasks, Utc::now()))
    }

    // Clients

    /// All clients, newest first.
    pub async fn get_clients(&self) -> Result<Vec<Client>> {
        let user_id = self.current_user_id().await?;
        Ok(client::list_clients(self.db.pool(), &user_id).await?)
    }

    pub async fn get_client(&self, id: &str) -> Result<Client> {
        let user_id = self.current_user_id().await?;
        Ok(client::get_client(self.db.pool(), &user_id, id).await?)
    }

    pub async fn create_client(&self, new: NewClient) -> Result<Client> {
        let user_id = self.current_user_id().await?;
        Ok(client::create_client(self.db.pool(), &user_id, &new).await?)
    }

    pub async fn update_client(&self, id: &str, update: ClientUpdate) -> Result<Client> {
        let user_id = self.current_user_id().await?;
        Ok(client::update_client(self.db.pool(), &user_id, id, update).await?)
    }

    /// Delete a client with its opportunities and interactions. Linked tasks
    /// are kept and unlinked.
    pub async fn delete_client(&self, id: &str) -> Result<()> {
        let user_id = self.current_user_id().await?;
        Ok(client::delete_client(self.db.pool(), &user_id, id).await?)
    }

    // Opportunities

    /// All opportunities with their client, newest first.
    pub async fn get_opportunities(&self) -> Result<Vec<Opportunity>> {
        let user_id = self.current_user_id().await?;
        Ok(opportunity::list_opportunities(self.db.pool(), &user_id).await?)
    }

    pub async fn get_opportunity(&self, id: &str) -> Result<Opportunity> {
        let user_id = self.current_user_id().await?;
        Ok(opportunity::get_opportunity(self.db.pool(), &user_id, id).await?)
    }

    pub async fn create_opportunity(&self, new: NewOpportunity) -> Result<Opportunity> {
        let user_id = self.current_user_id().await?;
        Ok(opportunity::create_opportunity(self.db.pool(), &user_id, &new).await?)
    }

    pub async fn update_opportunity(
        &self,
        id: &str,
        update: OpportunityUpdate,
    ) -> Result<Opportunity> {
        let user_id = self.current_user_id().await?;
        Ok(opportunity::update_opportunity(self.db.pool(), &user_id, id, update).await?)
    }

    pub async fn delete_opportunity(&self, id: &str) -> Result<()> {
        let user_id = self.current_user_id().await?;
        Ok(opportunity::delete_opportunity(self.db.pool(), &user_id, id).await?)
    }

    // Tasks

    /// All tasks by due date (undated last), with client and opportunity.
    pub async fn get_tasks(&self) -> Result<Vec<Task>> {
        let user_id = self.current_user_id().await?;
        Ok(task::list_tasks(self.db.pool(), &user_id).await?)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let user_id = self.current_user_id().await?;
        Ok(task::get_task(self.db.pool(), &user_id, id).await?)
    }

    pub async fn create_task(&self, new: NewTask) -> Result<Task> {
        let user_id = self.current_user_id().await?;
        Ok(task::create_task(self.db.pool(), &user_id, &new).await?)
    }

    pub async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task> {
        let user_id = self.current_user_id().await?;
        Ok(task::update_task(self.db.pool(), &user_id, id, update).await?)
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let user_id = self.current_user_id().await?;
        Ok(task::delete_task(self.db.pool(), &user_id, id).await?)
    }

    // Interactions

    /// Interactions, most recent first, optionally for one client.
    pub async fn get_interactions(&self, client_id: Option<&str>) -> Result<Vec<Interaction>> {
        let user_id = self.current_user_id().await?;
        Ok(interaction::list_interactions(self.db.pool(), &user_id, client_id).await?)
    }

    pub async fn create_interaction(&self, new: NewInteraction) -> Result<Interaction> {
        let user_id = self.current_user_id().await?;
        Ok(interaction::create_interaction(self.db.pool(), &user_id, &new).await?)
    }

    pub async fn update_interaction(
        &self,
        id: &str,
        update: InteractionUpdate,
    ) -> Result<Interaction> {
        let user_id = self.current_user_id().await?;
        Ok(interaction::update_interaction(self.db.pool(), &user_id, id, update).await?)
    }

    pub async fn delete_interaction(&self, id: &str) -> Result<()> {
        let user_id = self.current_user_id().await?;
        Ok(interaction::delete_interaction(self.db.pool(), &user_id, id).await?)
    }

    // Profile

    pub async fn get_profile(&self) -> Result<Account> {
        let user_id = self.current_user_id().await?;
        Ok(account::get_account(self.db.pool(), &user_id).await?)
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Account> {
        let user_id = self.current_user_id().await?;
        Ok(account::update_profile(self.db.pool(), &user_id, &update).await?)
    }
}
