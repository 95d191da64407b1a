//! Display-ready rows and form state for the templates.
//!
//! Templates only print strings and test booleans; everything else is
//! computed here.

use chrono::{DateTime, Utc};
use crm_core::display::{self, Labeled, SelectOption};
use crm_core::{is_overdue, ValidationErrors};
use database::{Client, Interaction, Opportunity, Task, TaskStatus};

/// Field errors plus an optional form-level message.
#[derive(Debug, Clone, Default)]
pub struct FormErrors {
    fields: ValidationErrors,
    /// Message shown above the form (backend failures, bad credentials).
    pub general: String,
}

impl FormErrors {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            fields: ValidationErrors::new(),
            general: message.into(),
        }
    }

    /// Message for `name`, or an empty string.
    pub fn field(&self, name: &str) -> String {
        self.fields.message(name).unwrap_or_default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.get(name).is_some()
    }

    pub fn has_general(&self) -> bool {
        !self.general.is_empty()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(fields: ValidationErrors) -> Self {
        Self {
            fields,
            general: String::new(),
        }
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct ClientRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub position: String,
    pub notes: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub created: String,
}

impl From<&Client> for ClientRow {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id.clone(),
            name: client.name.clone(),
            email: text(&client.email),
            phone: text(&client.phone),
            company: text(&client.company),
            position: text(&client.position),
            notes: text(&client.notes),
            status_label: client.status.label(),
            status_class: client.status.badge_class(),
            created: display::format_date(client.created_at.date_naive()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpportunityRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub client_name: String,
    pub client_company: String,
    pub value: String,
    pub stage_label: &'static str,
    pub stage_class: &'static str,
    pub probability: String,
    pub expected_close_date: String,
}

impl From<&Opportunity> for OpportunityRow {
    fn from(opportunity: &Opportunity) -> Self {
        let client = opportunity.client.as_ref();
        Self {
            id: opportunity.id.clone(),
            title: opportunity.title.clone(),
            description: text(&opportunity.description),
            client_name: client.map(|c| c.name.clone()).unwrap_or_default(),
            client_company: client.and_then(|c| c.company.clone()).unwrap_or_default(),
            value: opportunity
                .value
                .map(display::format_currency)
                .unwrap_or_default(),
            stage_label: opportunity.stage.label(),
            stage_class: opportunity.stage.badge_class(),
            probability: opportunity
                .probability
                .map(|p| format!("{}%", p))
                .unwrap_or_default(),
            expected_close_date: display::format_optional_date(opportunity.expected_close_date),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub client_name: String,
    pub opportunity_title: String,
    pub due_date: String,
    pub priority_label: &'static str,
    pub priority_class: &'static str,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub overdue: bool,
    pub completed: bool,
}

impl TaskRow {
    pub fn new(task: &Task, now: DateTime<Utc>) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: text(&task.description),
            client_name: task
                .client
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            opportunity_title: task
                .opportunity
                .as_ref()
                .map(|o| o.title.clone())
                .unwrap_or_default(),
            due_date: display::format_optional_date(task.due_date),
            priority_label: task.priority.label(),
            priority_class: task.priority.badge_class(),
            status_label: task.status.label(),
            status_class: task.status.badge_class(),
            overdue: is_overdue(task, now),
            completed: task.status == TaskStatus::Completed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractionRow {
    pub id: String,
    pub kind_label: &'static str,
    pub kind_class: &'static str,
    pub subject: String,
    pub description: String,
    pub date: String,
}

impl From<&Interaction> for InteractionRow {
    fn from(interaction: &Interaction) -> Self {
        Self {
            id: interaction.id.clone(),
            kind_label: interaction.kind.label(),
            kind_class: interaction.kind.badge_class(),
            subject: interaction.subject.clone(),
            description: text(&interaction.description),
            date: display::format_date(interaction.date),
        }
    }
}

/// Select options naming each client, for opportunity and task forms.
pub fn client_options(clients: &[Client], selected: &str) -> Vec<SelectOption> {
    clients
        .iter()
        .map(|c| SelectOption {
            value: c.id.clone(),
            label: c.name.clone(),
            selected: c.id == selected,
        })
        .collect()
}

/// Select options naming each opportunity, for the task form.
pub fn opportunity_options(opportunities: &[Opportunity], selected: &str) -> Vec<SelectOption> {
    opportunities
        .iter()
        .map(|o| SelectOption {
            value: o.id.clone(),
            label: o.title.clone(),
            selected: o.id == selected,
        })
        .collect()
}

/// Options for a posted enum value; unknown values select nothing.
pub fn enum_options<T>(value: &str) -> Vec<SelectOption>
where
    T: Labeled + PartialEq + std::str::FromStr,
{
    display::options::<T>(value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{ClientStatus, Priority};

    #[test]
    fn test_form_errors_lookup() {
        let mut fields = ValidationErrors::new();
        fields.push(database::ValidationError::InvalidEmail { field: "email" });
        let errors = FormErrors::from(fields);

        assert!(errors.has("email"));
        assert_eq!(errors.field("email"), "Email inválido");
        assert_eq!(errors.field("name"), "");
        assert!(!errors.has_general());
        assert!(FormErrors::general("Invalid login credentials").has_general());
    }

    #[test]
    fn test_enum_options_from_posted_value() {
        let options = enum_options::<Priority>("high");
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
        assert!(enum_options::<ClientStatus>("bogus").iter().all(|o| !o.selected));
    }
}
