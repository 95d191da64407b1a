//! Dashboard page.

use askama::Template;
use axum::extract::State;
use crm_core::display::format_currency_whole;
use crm_core::DashboardStats;

use crate::error::PageResult;
use crate::session::CurrentUser;
use crate::state::AppState;

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user_name: String,
    pub stats: DashboardStats,
    pub total_value: String,
    pub conversion_rate: u32,
    pub has_overdue: bool,
}

/// Render the dashboard page.
pub async fn dashboard_page(
    State(state): State<AppState>,
    current: CurrentUser,
) -> PageResult<DashboardTemplate> {
    let stats = state
        .api(Some(current.token.clone()))
        .get_dashboard_stats()
        .await?;

    Ok(DashboardTemplate {
        user_name: current.display_name(),
        total_value: format_currency_whole(stats.total_value),
        conversion_rate: stats.conversion_rate(),
        has_overdue: stats.overdue_tasks > 0,
        stats,
    })
}
