//! Dashboard and summary aggregation over fetched collections.
//!
//! Nothing here touches the database; callers pass the current time so the
//! overdue rule stays deterministic.

use chrono::{DateTime, Utc};
use database::{Client, ClientStatus, Opportunity, Priority, Stage, Task, TaskStatus};
use serde::Serialize;

/// Whether a task is past its due date and not completed.
///
/// The due date counts from midnight UTC, so a task due today is overdue as
/// soon as the day has started. Tasks without a due date are never overdue.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    if task.status == TaskStatus::Completed {
        return false;
    }
    match task.due_date {
        Some(due) => due.and_hms_opt(0, 0, 0).map_or(false, |due| due.and_utc() < now),
        None => false,
    }
}

/// `round(part / total * 100)`, or 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

fn value_of(opportunity: &Opportunity) -> f64 {
    opportunity.value.unwrap_or(0.0)
}

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_clients: usize,
    pub active_clients: usize,
    pub total_opportunities: usize,
    /// Sum of opportunity values; missing values count as zero.
    pub total_value: f64,
    pub won_opportunities: usize,
    pub pending_tasks: usize,
    pub overdue_tasks: usize,
}

impl DashboardStats {
    pub fn compute(
        clients: &[Client],
        opportunities: &[Opportunity],
        tasks: &[Task],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            total_clients: clients.len(),
            active_clients: clients
                .iter()
                .filter(|c| c.status == ClientStatus::Active)
                .count(),
            total_opportunities: opportunities.len(),
            total_value: opportunities.iter().map(value_of).sum(),
            won_opportunities: opportunities
                .iter()
                .filter(|o| o.stage == Stage::ClosedWon)
                .count(),
            pending_tasks: tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Pending)
                .count(),
            overdue_tasks: tasks.iter().filter(|t| is_overdue(t, now)).count(),
        }
    }

    /// Won opportunities as a rounded percentage of all opportunities.
    pub fn conversion_rate(&self) -> u32 {
        percentage(self.won_opportunities, self.total_opportunities)
    }
}

/// Count and value of the opportunities in one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub count: usize,
    pub value: f64,
}

/// Pipeline overview for the opportunities page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub total_value: f64,
    pub won_value: f64,
    pub total_count: usize,
    pub won_count: usize,
    /// One entry per stage, in pipeline order, including empty stages.
    pub stages: Vec<StageSummary>,
}

impl PipelineSummary {
    pub fn compute(opportunities: &[Opportunity]) -> Self {
        let stages = Stage::ALL
            .iter()
            .map(|&stage| {
                let in_stage = opportunities.iter().filter(|o| o.stage == stage);
                StageSummary {
                    stage,
                    count: in_stage.clone().count(),
                    value: in_stage.map(value_of).sum(),
                }
            })
            .collect::<Vec<_>>();

        let won = stages
            .iter()
            .find(|s| s.stage == Stage::ClosedWon)
            .map_or((0, 0.0), |s| (s.count, s.value));

        Self {
            total_value: opportunities.iter().map(value_of).sum(),
            won_value: won.1,
            total_count: opportunities.len(),
            won_count: won.0,
            stages,
        }
    }

    pub fn conversion_rate(&self) -> u32 {
        percentage(self.won_count, self.total_count)
    }
}

/// Client counts by status for the clients page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientSummary {
    pub total: usize,
    pub active: usize,
    pub prospect: usize,
    pub inactive: usize,
}

impl ClientSummary {
    pub fn compute(clients: &[Client]) -> Self {
        let with_status = |status| clients.iter().filter(|c| c.status == status).count();

        Self {
            total: clients.len(),
            active: with_status(ClientStatus::Active),
            prospect: with_status(ClientStatus::Prospect),
            inactive: with_status(ClientStatus::Inactive),
        }
    }
}

/// Open tasks of one priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: usize,
}

/// Task overview for the tasks page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
    /// Tasks not yet completed, per priority (high first).
    pub by_priority: Vec<PriorityCount>,
}

impl TaskSummary {
    pub fn compute(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let with_status = |status| tasks.iter().filter(|t| t.status == status).count();

        let by_priority = [Priority::High, Priority::Medium, Priority::Low]
            .into_iter()
            .map(|priority| PriorityCount {
                priority,
                count: tasks
                    .iter()
                    .filter(|t| t.priority == priority && t.status != TaskStatus::Completed)
                    .count(),
            })
            .collect();

        Self {
            pending: with_status(TaskStatus::Pending),
            in_progress: with_status(TaskStatus::InProgress),
            completed: with_status(TaskStatus::Completed),
            overdue: tasks.iter().filter(|t| is_overdue(t, now)).count(),
            by_priority,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, TimeZone, Utc};
    use database::{Client, ClientStatus, Opportunity, Priority, Stage, Task, TaskStatus};

    pub fn client(name: &str, status: ClientStatus) -> Client {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Client {
            id: format!("client-{name}"),
            user_id: "u1".to_string(),
            name: name.to_string(),
            email: None,
            phone: None,
            company: None,
            position: None,
            notes: None,
            status,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn opportunity(title: &str, stage: Stage, value: Option<f64>) -> Opportunity {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Opportunity {
            id: format!("opp-{title}"),
            user_id: "u1".to_string(),
            client_id: "client-1".to_string(),
            client: None,
            title: title.to_string(),
            description: None,
            value,
            stage,
            probability: None,
            expected_close_date: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn task(title: &str, status: TaskStatus, due: Option<NaiveDate>) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Task {
            id: format!("task-{title}"),
            user_id: "u1".to_string(),
            client_id: None,
            opportunity_id: None,
            client: None,
            opportunity: None,
            title: title.to_string(),
            description: None,
            due_date: due,
            priority: Priority::Medium,
            status,
            created_at: at,
            updated_at: at,
        }
    }
}
