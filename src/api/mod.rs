pub mod client;
pub mod rate_limit;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::HttpApiClient;
pub use types::{OverviewData, Project, RecentActivity, Task, Team, User};

/// The REST boundary the aggregator reads from. One method per endpoint;
/// each call fails independently.
#[async_trait]
pub trait ApiSource: Send + Sync {
    /// `GET /users`
    async fn users(&self) -> Result<Vec<User>>;

    /// `GET /tasks`
    async fn tasks(&self) -> Result<Vec<Task>>;

    /// `GET /projects`
    async fn projects(&self) -> Result<Vec<Project>>;

    /// `GET /teams`
    async fn teams(&self) -> Result<Vec<Team>>;

    /// `GET /dashboard/overview`
    async fn overview(&self) -> Result<OverviewData>;

    /// `GET /dashboard/activities?limit=N`
    async fn recent_activities(&self, limit: u32) -> Result<Vec<RecentActivity>>;
}
