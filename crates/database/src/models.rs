//! Database models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// Error returned when a string does not name a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a text-backed enum stored as its snake_case name.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[serde(rename_all = "snake_case")]
        #[sqlx(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every value, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored (wire) name of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Relationship state of a client.
    ClientStatus ("client status") {
        Prospect => "prospect",
        Active => "active",
        Inactive => "inactive",
    }
}

impl Default for ClientStatus {
    fn default() -> Self {
        ClientStatus::Prospect
    }
}

text_enum! {
    /// Sales-pipeline position of an opportunity. Any stage may follow any other.
    Stage ("stage") {
        Prospect => "prospect",
        Qualified => "qualified",
        Proposal => "proposal",
        Negotiation => "negotiation",
        ClosedWon => "closed_won",
        ClosedLost => "closed_lost",
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Prospect
    }
}

text_enum! {
    /// Task priority.
    Priority ("priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

text_enum! {
    /// Completion state of a task.
    TaskStatus ("task status") {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

text_enum! {
    /// Kind of logged interaction with a client.
    InteractionType ("interaction type") {
        Call => "call",
        Email => "email",
        Meeting => "meeting",
        Note => "note",
    }
}

/// An authenticated user together with their profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Account UUID; every owned row carries it as `user_id`.
    pub id: String,
    /// Login email (unique, case-insensitive).
    pub email: String,
    /// Encoded password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name given at sign-up.
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to register an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
}

/// Profile fields a user may change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
}

/// A login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Opaque bearer token.
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A single-use password reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PasswordReset {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// A client (customer or prospect) owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: String,
    /// Owning user.
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    /// Job title at the company.
    pub position: Option<String>,
    pub notes: Option<String>,
    pub status: ClientStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
}

/// Partial client update. `None` keeps a field; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub company: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub position: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub status: Option<ClientStatus>,
}

impl ClientUpdate {
    /// Update that only changes the status.
    pub fn status(status: ClientStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, client: &mut Client) {
        if let Some(name) = self.name {
            client.name = name;
        }
        if let Some(email) = self.email {
            client.email = email;
        }
        if let Some(phone) = self.phone {
            client.phone = phone;
        }
        if let Some(company) = self.company {
            client.company = company;
        }
        if let Some(position) = self.position {
            client.position = position;
        }
        if let Some(notes) = self.notes {
            client.notes = notes;
        }
        if let Some(status) = self.status {
            client.status = status;
        }
    }
}

impl From<NewClient> for ClientUpdate {
    fn from(new: NewClient) -> Self {
        Self {
            name: Some(new.name),
            email: Some(new.email),
            phone: Some(new.phone),
            company: Some(new.company),
            position: Some(new.position),
            notes: Some(new.notes),
            status: Some(new.status),
        }
    }
}

/// A sales opportunity for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Opportunity {
    pub id: String,
    pub user_id: String,
    pub client_id: String,
    /// Joined client, present on reads that request it.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
    pub title: String,
    pub description: Option<String>,
    /// Monetary value; missing values count as zero in totals.
    pub value: Option<f64>,
    pub stage: Stage,
    /// Win probability in percent (0-100).
    pub probability: Option<i64>,
    pub expected_close_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an opportunity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewOpportunity {
    pub client_id: String,
    pub title: String,
    pub description: Option<String>,
    pub value: Option<f64>,
    #[serde(default)]
    pub stage: Stage,
    pub probability: Option<i64>,
    pub expected_close_date: Option<NaiveDate>,
}

/// Partial opportunity update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityUpdate {
    pub client_id: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub value: Option<Option<f64>>,
    pub stage: Option<Stage>,
    #[serde(deserialize_with = "double_option")]
    pub probability: Option<Option<i64>>,
    #[serde(deserialize_with = "double_option")]
    pub expected_close_date: Option<Option<NaiveDate>>,
}

impl OpportunityUpdate {
    pub(crate) fn apply(self, opportunity: &mut Opportunity) {
        if let Some(client_id) = self.client_id {
            opportunity.client_id = client_id;
        }
        if let Some(title) = self.title {
            opportunity.title = title;
        }
        if let Some(description) = self.description {
            opportunity.description = description;
        }
        if let Some(value) = self.value {
            opportunity.value = value;
        }
        if let Some(stage) = self.stage {
            opportunity.stage = stage;
        }
        if let Some(probability) = self.probability {
            opportunity.probability = probability;
        }
        if let Some(date) = self.expected_close_date {
            opportunity.expected_close_date = date;
        }
    }
}

impl From<NewOpportunity> for OpportunityUpdate {
    fn from(new: NewOpportunity) -> Self {
        Self {
            client_id: Some(new.client_id),
            title: Some(new.title),
            description: Some(new.description),
            value: Some(new.value),
            stage: Some(new.stage),
            probability: Some(new.probability),
            expected_close_date: Some(new.expected_close_date),
        }
    }
}

/// A to-do item, optionally linked to a client and/or opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub client_id: Option<String>,
    pub opportunity_id: Option<String>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunity: Option<Opportunity>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub client_id: Option<String>,
    pub opportunity_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
}

/// Partial task update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskUpdate {
    #[serde(deserialize_with = "double_option")]
    pub client_id: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub opportunity_id: Option<Option<String>>,
    pub title: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    /// Update that only changes the status.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, task: &mut Task) {
        if let Some(client_id) = self.client_id {
            task.client_id = client_id;
        }
        if let Some(opportunity_id) = self.opportunity_id {
            task.opportunity_id = opportunity_id;
        }
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

impl From<NewTask> for TaskUpdate {
    fn from(new: NewTask) -> Self {
        Self {
            client_id: Some(new.client_id),
            opportunity_id: Some(new.opportunity_id),
            title: Some(new.title),
            description: Some(new.description),
            due_date: Some(new.due_date),
            priority: Some(new.priority),
            status: Some(new.status),
        }
    }
}

/// A logged call, email, meeting or note for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Interaction {
    pub id: String,
    pub user_id: String,
    pub client_id: String,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub subject: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for logging an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInteraction {
    pub client_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub subject: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Partial interaction update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionUpdate {
    #[serde(rename = "type")]
    pub kind: Option<InteractionType>,
    pub subject: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
}

impl InteractionUpdate {
    pub(crate) fn apply(self, interaction: &mut Interaction) {
        if let Some(kind) = self.kind {
            interaction.kind = kind;
        }
        if let Some(subject) = self.subject {
            interaction.subject = subject;
        }
        if let Some(description) = self.description {
            interaction.description = description;
        }
        if let Some(date) = self.date {
            interaction.date = date;
        }
    }
}

/// Deserializes a present field (including `null`) as `Some(..)`, so that a
/// missing field stays `None` through `#[serde(default)]`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
