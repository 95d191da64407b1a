//! In-memory list filtering.
//!
//! Filters are built from query-string values. Search text is a
//! case-insensitive substring match; enum filters narrow the result
//! further. Unknown enum values are treated as "all".

use database::{Client, ClientStatus, Opportunity, Priority, Stage, Task, TaskStatus};
use serde::{Deserialize, Serialize};

/// A predicate over list items.
pub trait ListFilter<T> {
    fn matches(&self, item: &T) -> bool;

    /// Keep the matching items, preserving order.
    fn apply<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

/// Lowercased search needle; `None` matches everything. Whitespace is kept,
/// so `" acme"` only matches text with a space before "acme".
fn needle(search: &str) -> Option<String> {
    if search.is_empty() {
        None
    } else {
        Some(search.to_lowercase())
    }
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.map_or(false, |h| h.to_lowercase().contains(needle))
}

/// Parse an optional enum from a query value; empty or unknown means no filter.
fn parse_choice<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Raw query parameters shared by all list pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub stage: Option<String>,
    pub priority: Option<String>,
}

impl ListQuery {
    fn search_text(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }
}

/// Clients by name, email or company, and status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    pub search: String,
    pub status: Option<ClientStatus>,
}

impl From<&ListQuery> for ClientFilter {
    fn from(query: &ListQuery) -> Self {
        Self {
            search: query.search_text().to_string(),
            status: parse_choice(query.status.as_deref()),
        }
    }
}

impl ListFilter<Client> for ClientFilter {
    fn matches(&self, client: &Client) -> bool {
        if self.status.is_some_and(|s| s != client.status) {
            return false;
        }
        let Some(needle) = needle(&self.search) else {
            return true;
        };
        contains(Some(&client.name), &needle)
            || contains(client.email.as_deref(), &needle)
            || contains(client.company.as_deref(), &needle)
    }
}

/// Opportunities by title or client name/company, and stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpportunityFilter {
    pub search: String,
    pub stage: Option<Stage>,
}

impl From<&ListQuery> for OpportunityFilter {
    fn from(query: &ListQuery) -> Self {
        Self {
            search: query.search_text().to_string(),
            stage: parse_choice(query.stage.as_deref()),
        }
    }
}

impl ListFilter<Opportunity> for OpportunityFilter {
    fn matches(&self, opportunity: &Opportunity) -> bool {
        if self.stage.is_some_and(|s| s != opportunity.stage) {
            return false;
        }
        let Some(needle) = needle(&self.search) else {
            return true;
        };
        let client = opportunity.client.as_ref();
        contains(Some(&opportunity.title), &needle)
            || contains(client.map(|c| c.name.as_str()), &needle)
            || contains(client.and_then(|c| c.company.as_deref()), &needle)
    }
}

/// Tasks by title, description, client name or opportunity title, plus
/// status and priority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

impl From<&ListQuery> for TaskFilter {
    fn from(query: &ListQuery) -> Self {
        Self {
            search: query.search_text().to_string(),
            status: parse_choice(query.status.as_deref()),
            priority: parse_choice(query.priority.as_deref()),
        }
    }
}

impl ListFilter<Task> for TaskFilter {
    fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        let Some(needle) = needle(&self.search) else {
            return true;
        };
        contains(Some(&task.title), &needle)
            || contains(task.description.as_deref(), &needle)
            || contains(task.client.as_ref().map(|c| c.name.as_str()), &needle)
            || contains(task.opportunity.as_ref().map(|o| o.title.as_str()), &needle)
    }
}
