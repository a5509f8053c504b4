use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::date_util::deserialize_optional_date;
use crate::role::Role;

/// Ids arrive as strings from some endpoints and integers from others.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawId> = Option::deserialize(deserializer)?;
    Ok(raw.map(String::from).filter(|s| !s.trim().is_empty()))
}

fn deserialize_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<RawId>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(String::from)
        .collect())
}

fn default_role() -> Role {
    Role::Unknown
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(
        default,
        alias = "supervisorId",
        deserialize_with = "deserialize_optional_id"
    )]
    pub supervisor_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(
        default,
        alias = "assigneeId",
        alias = "assigned_to",
        deserialize_with = "deserialize_optional_id"
    )]
    pub assignee_id: Option<String>,
    #[serde(
        default,
        alias = "projectId",
        deserialize_with = "deserialize_optional_id"
    )]
    pub project_id: Option<String>,
    #[serde(default, alias = "teamId", deserialize_with = "deserialize_optional_id")]
    pub team_id: Option<String>,
    #[serde(
        default,
        alias = "dueDate",
        deserialize_with = "deserialize_optional_date"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(
        default,
        alias = "ownerId",
        alias = "manager_id",
        deserialize_with = "deserialize_optional_id"
    )]
    pub owner_id: Option<String>,
    #[serde(default, alias = "teamId", deserialize_with = "deserialize_optional_id")]
    pub team_id: Option<String>,
    #[serde(
        default,
        alias = "dueDate",
        alias = "end_date",
        deserialize_with = "deserialize_optional_date"
    )]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "leadId", deserialize_with = "deserialize_optional_id")]
    pub lead_id: Option<String>,
    #[serde(default, alias = "memberIds", deserialize_with = "deserialize_id_list")]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl Team {
    /// Whether `user_id` leads or belongs to this team.
    pub fn includes(&self, user_id: &str) -> bool {
        self.lead_id.as_deref() == Some(user_id) || self.member_ids.iter().any(|m| m == user_id)
    }
}

/// Server-side headline counts from `/dashboard/overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewData {
    #[serde(alias = "totalUsers")]
    pub total_users: u64,
    #[serde(alias = "totalTeams")]
    pub total_teams: u64,
    #[serde(alias = "totalProjects")]
    pub total_projects: u64,
    #[serde(alias = "totalTasks")]
    pub total_tasks: u64,
    #[serde(alias = "completedTasks")]
    pub completed_tasks: u64,
    #[serde(alias = "pendingTasks")]
    pub pending_tasks: u64,
    #[serde(alias = "overdueTasks")]
    pub overdue_tasks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "type")]
    pub action: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "userId", deserialize_with = "deserialize_optional_id")]
    pub user_id: Option<String>,
    #[serde(default, alias = "userName")]
    pub user_name: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub timestamp: Option<DateTime<Utc>>,
}
