use chrono::NaiveDate;
use serde::Serialize;

use crate::role::{Role, ScopeKind};

/// One bar/slice of a status distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBucket {
    /// Display label, e.g. `In Progress`.
    pub name: String,
    /// Normalized status key, e.g. `IN_PROGRESS`.
    pub key: String,
    pub value: u64,
    pub color: String,
}

/// Activity for one calendar day of the rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub label: String,
    pub created: u64,
    pub completed: u64,
    /// Distinct assignees of tasks created or updated that day.
    pub active_users: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectProgress {
    pub project_id: String,
    pub name: String,
    pub completed: u64,
    pub total: u64,
    /// Rounded percentage; 0 when the project has no tasks.
    pub percentage: u32,
}

/// Headline task numbers plus status and priority distributions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub overdue: u64,
    pub completion_rate: u32,
    pub status_histogram: Vec<HistogramBucket>,
    pub priority_histogram: Vec<HistogramBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPerformance {
    pub user_id: String,
    pub name: String,
    pub assigned: u64,
    pub completed: u64,
    pub overdue: u64,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamPerformance {
    pub team_id: String,
    pub name: String,
    pub member_count: u64,
    pub total_tasks: u64,
    pub completed: u64,
    pub overdue: u64,
    pub completion_rate: u32,
}

/// Metrics computed over the slice of data a role is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSet {
    pub role: Role,
    pub scope: ScopeKind,
    pub user_id: String,
    /// Number of users in scope; `None` when the scope is everyone.
    pub users_in_scope: Option<u64>,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub completion_rate: u32,
    pub overdue_count: u64,
    pub escalation_count: u64,
    pub project_count: u64,
    pub team_count: u64,
    /// Dashboard labels for this role.
    pub labels: Vec<String>,
}
