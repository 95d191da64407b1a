//! Form schemas.
//!
//! Forms arrive as plain strings. Each form validates into the typed input
//! of the matching service call, collecting every field error. Typed inputs
//! received as JSON are checked with [`Validate`].

use std::str::FromStr;

use database::validation::{
    parse_date, validate_email, validate_max_chars, validate_min_chars, validate_positive,
    validate_range, validate_required, MAX_LONG_TEXT_LENGTH, MAX_TEXT_LENGTH,
};
use database::{
    Client, ClientUpdate, InteractionType, InteractionUpdate, NewClient, NewInteraction,
    NewOpportunity, NewTask, Opportunity, OpportunityUpdate, Priority, ProfileUpdate, Task,
    TaskStatus, TaskUpdate, ValidationError, ValidationErrors,
};
use serde::{Deserialize, Serialize};

use crate::auth::{SignInData, SignUpData};

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MIN_NAME_CHARS: usize = 2;

const NAME: &str = "El nombre";
const TITLE: &str = "El título";
const SUBJECT: &str = "El asunto";
const PASSWORD: &str = "La contraseña";
const PASSWORD_REQUIRED: &str = "La contraseña es requerida";
const CLIENT_REQUIRED: &str = "El cliente es requerido";
const TYPE_REQUIRED: &str = "El tipo es requerido";
const DATE_REQUIRED: &str = "La fecha es requerida";

/// Check a typed input before it reaches the database.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Trimmed value, or `None` when blank.
fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse an enum field; blank yields the default.
fn choice<T: FromStr + Default>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> T {
    let value = value.trim();
    if value.is_empty() {
        return T::default();
    }
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            errors.push(ValidationError::InvalidChoice {
                field,
                value: value.to_string(),
            });
            T::default()
        }
    }
}

fn optional_date(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> Option<chrono::NaiveDate> {
    if value.trim().is_empty() {
        return None;
    }
    match parse_date(field, value) {
        Ok(date) => Some(date),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn optional_email(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>) {
    if let Some(email) = value.filter(|e| !e.trim().is_empty()) {
        errors.check(validate_email(field, email));
    }
}

fn optional_text(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        errors.check(validate_max_chars(field, value, max));
    }
}

fn title_like(errors: &mut ValidationErrors, field: &'static str, subject: &'static str, value: &str) {
    errors.check(validate_min_chars(field, subject, value, MIN_NAME_CHARS));
    errors.check(validate_max_chars(field, value.trim(), MAX_TEXT_LENGTH));
}

fn optional_value(errors: &mut ValidationErrors, value: Option<f64>) {
    if let Some(value) = value {
        errors.check(validate_positive("value", value));
    }
}

fn optional_probability(errors: &mut ValidationErrors, value: Option<i64>) {
    if let Some(probability) = value {
        errors.check(validate_range("probability", probability, 0, 100));
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<SignUpData, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_email("email", &self.email));
        errors.check(validate_min_chars(
            "password",
            PASSWORD,
            &self.password,
            MIN_PASSWORD_CHARS,
        ));
        errors.check(validate_min_chars(
            "full_name",
            NAME,
            &self.full_name,
            MIN_NAME_CHARS,
        ));
        if self.password != self.confirm_password {
            errors.push(ValidationError::Mismatch {
                field: "confirm_password",
            });
        }

        errors.into_result(SignUpData {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            full_name: self.full_name.trim().to_string(),
        })
    }
}

/// Sign-in form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<SignInData, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_email("email", &self.email));
        if self.password.is_empty() {
            errors.push(ValidationError::Required {
                field: "password",
                message: PASSWORD_REQUIRED,
            });
        }

        errors.into_result(SignInData {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// Password reset request form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetRequestForm {
    pub email: String,
}

impl ResetRequestForm {
    /// The normalized email.
    pub fn validate(&self) -> Result<String, ValidationErrors> {
        validate_email("email", &self.email)?;
        Ok(self.email.trim().to_string())
    }
}

/// New password chosen through a reset link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetConfirmForm {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

impl ResetConfirmForm {
    /// The new password.
    pub fn validate(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_min_chars(
            "password",
            PASSWORD,
            &self.password,
            MIN_PASSWORD_CHARS,
        ));
        if self.password != self.confirm_password {
            errors.push(ValidationError::Mismatch {
                field: "confirm_password",
            });
        }
        errors.into_result(self.password.clone())
    }
}

/// Profile form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileUpdate, ValidationErrors> {
        let update = ProfileUpdate {
            full_name: Some(self.full_name.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            avatar_url: Some(optional(&self.avatar_url)),
        };
        update.validate()?;
        Ok(update)
    }
}

impl Validate for ProfileUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(full_name) = &self.full_name {
            title_like(&mut errors, "full_name", NAME, full_name);
        }
        if let Some(email) = &self.email {
            errors.check(validate_email("email", email));
        }
        if let Some(Some(url)) = &self.avatar_url {
            errors.check(validate_max_chars("avatar_url", url, MAX_LONG_TEXT_LENGTH));
        }
        errors.into_result(())
    }
}

/// Client form, for both create and edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub position: String,
    pub notes: String,
    pub status: String,
}

impl ClientForm {
    /// Prefilled form for editing.
    pub fn from_client(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            email: client.email.clone().unwrap_or_default(),
            phone: client.phone.clone().unwrap_or_default(),
            company: client.company.clone().unwrap_or_default(),
            position: client.position.clone().unwrap_or_default(),
            notes: client.notes.clone().unwrap_or_default(),
            status: client.status.as_str().to_string(),
        }
    }

    pub fn validate(&self) -> Result<NewClient, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let new = NewClient {
            name: self.name.trim().to_string(),
            email: optional(&self.email),
            phone: optional(&self.phone),
            company: optional(&self.company),
            position: optional(&self.position),
            notes: optional(&self.notes),
            status: choice(&mut errors, "status", &self.status),
        };
        if let Err(more) = new.validate() {
            more.iter().cloned().for_each(|e| errors.push(e));
        }
        errors.into_result(new)
    }
}

fn check_client_fields(
    errors: &mut ValidationErrors,
    email: Option<&str>,
    phone: Option<&str>,
    company: Option<&str>,
    position: Option<&str>,
    notes: Option<&str>,
) {
    optional_email(errors, "email", email);
    optional_text(errors, "phone", phone, MAX_TEXT_LENGTH);
    optional_text(errors, "company", company, MAX_TEXT_LENGTH);
    optional_text(errors, "position", position, MAX_TEXT_LENGTH);
    optional_text(errors, "notes", notes, MAX_LONG_TEXT_LENGTH);
}

impl Validate for NewClient {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        title_like(&mut errors, "name", NAME, &self.name);
        check_client_fields(
            &mut errors,
            self.email.as_deref(),
            self.phone.as_deref(),
            self.company.as_deref(),
            self.position.as_deref(),
            self.notes.as_deref(),
        );
        errors.into_result(())
    }
}

impl Validate for ClientUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            title_like(&mut errors, "name", NAME, name);
        }
        check_client_fields(
            &mut errors,
            self.email.as_ref().and_then(Option::as_deref),
            self.phone.as_ref().and_then(Option::as_deref),
            self.company.as_ref().and_then(Option::as_deref),
            self.position.as_ref().and_then(Option::as_deref),
            self.notes.as_ref().and_then(Option::as_deref),
        );
        errors.into_result(())
    }
}

/// Opportunity form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityForm {
    pub client_id: String,
    pub title: String,
    pub description: String,
    pub value: String,
    pub stage: String,
    pub probability: String,
    pub expected_close_date: String,
}

impl OpportunityForm {
    pub fn from_opportunity(opportunity: &Opportunity) -> Self {
        Self {
            client_id: opportunity.client_id.clone(),
            title: opportunity.title.clone(),
            description: opportunity.description.clone().unwrap_or_default(),
            value: opportunity.value.map(|v| v.to_string()).unwrap_or_default(),
            stage: opportunity.stage.as_str().to_string(),
            probability: opportunity
                .probability
                .map(|p| p.to_string())
                .unwrap_or_default(),
            expected_close_date: opportunity
                .expected_close_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<NewOpportunity, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let value = match optional(&self.value) {
            Some(raw) => match raw.parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    errors.push(ValidationError::InvalidNumber { field: "value" });
                    None
                }
            },
            None => None,
        };
        let probability = match optional(&self.probability) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(probability) => Some(probability),
                Err(_) => {
                    errors.push(ValidationError::InvalidNumber {
                        field: "probability",
                    });
                    None
                }
            },
            None => None,
        };

        let new = NewOpportunity {
            client_id: self.client_id.trim().to_string(),
            title: self.title.trim().to_string(),
            description: optional(&self.description),
            value,
            stage: choice(&mut errors, "stage", &self.stage),
            probability,
            expected_close_date: optional_date(&mut errors, "expected_close_date", &self.expected_close_date),
        };
        if let Err(more) = new.validate() {
            more.iter().cloned().for_each(|e| errors.push(e));
        }
        errors.into_result(new)
    }
}

impl Validate for NewOpportunity {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_required("client_id", CLIENT_REQUIRED, &self.client_id));
        title_like(&mut errors, "title", TITLE, &self.title);
        optional_text(&mut errors, "description", self.description.as_deref(), MAX_LONG_TEXT_LENGTH);
        optional_value(&mut errors, self.value);
        optional_probability(&mut errors, self.probability);
        errors.into_result(())
    }
}

impl Validate for OpportunityUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(client_id) = &self.client_id {
            errors.check(validate_required("client_id", CLIENT_REQUIRED, client_id));
        }
        if let Some(title) = &self.title {
            title_like(&mut errors, "title", TITLE, title);
        }
        optional_text(
            &mut errors,
            "description",
            self.description.as_ref().and_then(Option::as_deref),
            MAX_LONG_TEXT_LENGTH,
        );
        optional_value(&mut errors, self.value.flatten());
        optional_probability(&mut errors, self.probability.flatten());
        errors.into_result(())
    }
}

/// Task form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskForm {
    pub client_id: String,
    pub opportunity_id: String,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: String,
    pub status: String,
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            client_id: task.client_id.clone().unwrap_or_default(),
            opportunity_id: task.opportunity_id.clone().unwrap_or_default(),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task.due_date.map(|d| d.to_string()).unwrap_or_default(),
            priority: task.priority.as_str().to_string(),
            status: task.status.as_str().to_string(),
        }
    }

    pub fn validate(&self) -> Result<NewTask, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let new = NewTask {
            client_id: optional(&self.client_id),
            opportunity_id: optional(&self.opportunity_id),
            title: self.title.trim().to_string(),
            description: optional(&self.description),
            due_date: optional_date(&mut errors, "due_date", &self.due_date),
            priority: choice::<Priority>(&mut errors, "priority", &self.priority),
            status: choice::<TaskStatus>(&mut errors, "status", &self.status),
        };
        if let Err(more) = new.validate() {
            more.iter().cloned().for_each(|e| errors.push(e));
        }
        errors.into_result(new)
    }
}

impl Validate for NewTask {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        title_like(&mut errors, "title", TITLE, &self.title);
        optional_text(&mut errors, "description", self.description.as_deref(), MAX_LONG_TEXT_LENGTH);
        errors.into_result(())
    }
}

impl Validate for TaskUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title {
            title_like(&mut errors, "title", TITLE, title);
        }
        optional_text(
            &mut errors,
            "description",
            self.description.as_ref().and_then(Option::as_deref),
            MAX_LONG_TEXT_LENGTH,
        );
        errors.into_result(())
    }
}

/// Interaction form, posted from the client detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionForm {
    pub client_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub subject: String,
    pub description: String,
    pub date: String,
}

impl InteractionForm {
    pub fn validate(&self) -> Result<NewInteraction, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let kind = match optional(&self.kind) {
            None => {
                errors.push(ValidationError::Required {
                    field: "type",
                    message: TYPE_REQUIRED,
                });
                None
            }
            Some(raw) => match raw.parse::<InteractionType>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    errors.push(ValidationError::InvalidChoice {
                        field: "type",
                        value: raw,
                    });
                    None
                }
            },
        };
        let date = if self.date.trim().is_empty() {
            errors.push(ValidationError::Required {
                field: "date",
                message: DATE_REQUIRED,
            });
            None
        } else {
            optional_date(&mut errors, "date", &self.date)
        };

        errors.check(validate_required("client_id", CLIENT_REQUIRED, &self.client_id));
        title_like(&mut errors, "subject", SUBJECT, &self.subject);
        optional_text(&mut errors, "description", Some(&self.description), MAX_LONG_TEXT_LENGTH);

        match (kind, date) {
            (Some(kind), Some(date)) if errors.is_empty() => Ok(NewInteraction {
                client_id: self.client_id.trim().to_string(),
                kind,
                subject: self.subject.trim().to_string(),
                description: optional(&self.description),
                date,
            }),
            _ => Err(errors),
        }
    }
}

impl Validate for NewInteraction {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_required("client_id", CLIENT_REQUIRED, &self.client_id));
        title_like(&mut errors, "subject", SUBJECT, &self.subject);
        optional_text(&mut errors, "description", self.description.as_deref(), MAX_LONG_TEXT_LENGTH);
        errors.into_result(())
    }
}

impl Validate for InteractionUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(subject) = &self.subject {
            title_like(&mut errors, "subject", SUBJECT, subject);
        }
        optional_text(
            &mut errors,
            "description",
            self.description.as_ref().and_then(Option::as_deref),
            MAX_LONG_TEXT_LENGTH,
        );
        errors.into_result(())
    }
}

/// Parse a status value posted by the quick status buttons.
pub fn parse_task_status(value: &str) -> Result<TaskStatus, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidChoice {
            field: "status",
            value: value.to_string(),
        })
}
