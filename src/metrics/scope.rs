use std::collections::HashSet;

use chrono::NaiveDate;

use super::types::MetricSet;
use super::{completion_percentage, is_escalated, is_finished, is_overdue};
use crate::api::{Project, Task, Team, User};
use crate::error::Result;
use crate::hierarchy::Forest;
use crate::role::{Role, ScopeKind};

/// Borrowed view of the raw collections a metric set is computed from.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataSnapshot<'a> {
    pub users: &'a [User],
    pub tasks: &'a [Task],
    pub projects: &'a [Project],
    pub teams: &'a [Team],
}

/// The set of users whose data a viewer may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Everyone,
    Users(HashSet<String>),
}

impl Scope {
    /// Resolve the scope for `role` as seen by `user_id`.
    pub fn for_role(role: Role, forest: &Forest, user_id: &str) -> Self {
        match role.scope_kind() {
            ScopeKind::Everyone => Scope::Everyone,
            ScopeKind::SelfAndSubordinates => {
                let mut ids = forest.subordinate_ids(user_id);
                ids.insert(user_id.to_string());
                Scope::Users(ids)
            }
            ScopeKind::SelfOnly => Scope::Users(HashSet::from([user_id.to_string()])),
        }
    }

    /// Unowned entities are only visible to an everyone scope.
    pub fn contains(&self, user_id: Option<&str>) -> bool {
        match self {
            Scope::Everyone => true,
            Scope::Users(ids) => user_id.is_some_and(|id| ids.contains(id)),
        }
    }

    pub fn user_count(&self) -> Option<u64> {
        match self {
            Scope::Everyone => None,
            Scope::Users(ids) => Some(ids.len() as u64),
        }
    }

    pub fn tasks<'a>(&'a self, tasks: &'a [Task]) -> impl Iterator<Item = &'a Task> + 'a {
        tasks
            .iter()
            .filter(move |t| self.contains(t.assignee_id.as_deref()))
    }

    pub fn projects<'a>(&'a self, projects: &'a [Project]) -> impl Iterator<Item = &'a Project> + 'a {
        projects
            .iter()
            .filter(move |p| self.contains(p.owner_id.as_deref()))
    }

    /// A team is in scope when its lead or any member is.
    pub fn teams<'a>(&'a self, teams: &'a [Team]) -> impl Iterator<Item = &'a Team> + 'a {
        teams.iter().filter(move |t| match self {
            Scope::Everyone => true,
            Scope::Users(ids) => ids.iter().any(|id| t.includes(id)),
        })
    }
}

/// Completion, overdue and escalation numbers restricted to what `role`
/// may see from `current_user_id`'s position in the hierarchy.
pub fn compute_role_scoped_metrics(
    role: Role,
    data: &DataSnapshot<'_>,
    forest: &Forest,
    current_user_id: &str,
    today: NaiveDate,
) -> Result<MetricSet> {
    let scope = Scope::for_role(role, forest, current_user_id);

    let tasks: Vec<&Task> = scope.tasks(data.tasks).collect();
    let total_tasks = tasks.len() as u64;
    let completed_tasks = tasks.iter().filter(|t| is_finished(t)).count() as u64;
    let overdue_count = tasks.iter().filter(|t| is_overdue(t, today)).count() as u64;
    let escalation_count = tasks.iter().filter(|t| is_escalated(t, today)).count() as u64;

    Ok(MetricSet {
        role,
        scope: role.scope_kind(),
        user_id: current_user_id.to_string(),
        users_in_scope: scope.user_count(),
        total_tasks,
        completed_tasks,
        completion_rate: completion_percentage(completed_tasks, total_tasks)?,
        overdue_count,
        escalation_count,
        project_count: scope.projects(data.projects).count() as u64,
        team_count: scope.teams(data.teams).count() as u64,
        labels: role
            .specific_metrics()
            .iter()
            .map(|s| s.to_string())
            .collect(),
    })
}
