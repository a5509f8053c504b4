use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::api::{ApiSource, HttpApiClient, OverviewData, Project, RecentActivity, Task, Team, User};
use crate::cache::{Clock, ResultCache, SystemClock};
use crate::config::{Config, MAX_WINDOW_DAYS};
use crate::date_util::day_of;
use crate::error::Result;
use crate::hierarchy::Forest;
use crate::metrics::{
    compute_project_progress, compute_project_status_histogram, compute_role_scoped_metrics,
    compute_rolling_activity, compute_task_stats, compute_team_performance,
    compute_user_performance, DataSnapshot, HistogramBucket, MetricSet, ProjectProgress,
    TaskStats, TeamPerformance, TimeSeriesPoint, UserPerformance,
};
use crate::role::{Role, ScopeKind};

/// Cache key for the full dashboard snapshot.
pub const ALL_QUERY_KEY: &str = "analytics:all";

const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Tunables for the aggregator, normally taken from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorOptions {
    pub cache_ttl: Duration,
    pub activity_limit: u32,
    pub window_days: u32,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::minutes(5),
            activity_limit: 10,
            window_days: 7,
        }
    }
}

impl From<&Config> for AggregatorOptions {
    fn from(config: &Config) -> Self {
        Self {
            cache_ttl: Duration::seconds(config.cache_ttl_secs.min(MAX_TTL_SECS) as i64),
            activity_limit: config.activity_limit,
            window_days: config.window_days.min(MAX_WINDOW_DAYS),
        }
    }
}

/// Outcome of one source fetch: the data, or the reason it is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Slice<T> {
    fn settle(source: &str, result: Result<T>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(e) => {
                log::warn!("Failed to fetch {source}: {e}");
                Self {
                    data: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Scope and dashboard labels for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub role: Role,
    pub scope: &'static str,
    pub metrics: &'static [&'static str],
}

/// Everything the dashboard shows, computed from one round of fetches.
///
/// Derived blocks are `None` when a source they depend on failed.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsResult {
    pub cache_key: String,
    pub created_at: DateTime<Utc>,

    pub users: Slice<Vec<User>>,
    pub tasks: Slice<Vec<Task>>,
    pub projects: Slice<Vec<Project>>,
    pub teams: Slice<Vec<Team>>,
    pub overview: Slice<OverviewData>,
    pub activities: Slice<Vec<RecentActivity>>,

    pub task_stats: Option<TaskStats>,
    pub activity: Option<Vec<TimeSeriesPoint>>,
    pub project_status: Option<Vec<HistogramBucket>>,
    pub project_progress: Option<Vec<ProjectProgress>>,
    pub user_performance: Option<Vec<UserPerformance>>,
    pub team_performance: Option<Vec<TeamPerformance>>,
    pub role_metrics: Vec<RoleSummary>,
}

impl AnalyticsResult {
    /// Derive every block from the settled slices.
    #[allow(clippy::too_many_arguments)]
    fn build(
        created_at: DateTime<Utc>,
        window_days: u32,
        users: Slice<Vec<User>>,
        tasks: Slice<Vec<Task>>,
        projects: Slice<Vec<Project>>,
        teams: Slice<Vec<Team>>,
        overview: Slice<OverviewData>,
        activities: Slice<Vec<RecentActivity>>,
    ) -> Result<Self> {
        let today = day_of(&created_at);

        let task_data = tasks.data.as_deref();
        let task_stats = task_data.map(|t| compute_task_stats(t, today)).transpose()?;
        let activity = task_data.map(|t| compute_rolling_activity(t, today, window_days));

        let project_status = projects.data.as_deref().map(compute_project_status_histogram);
        let project_progress = match (projects.data.as_deref(), task_data) {
            (Some(p), Some(t)) => Some(compute_project_progress(p, t)?),
            _ => None,
        };
        let user_performance = match (users.data.as_deref(), task_data) {
            (Some(u), Some(t)) => Some(compute_user_performance(u, t, today)?),
            _ => None,
        };
        let team_performance = match (teams.data.as_deref(), task_data) {
            (Some(tm), Some(t)) => Some(compute_team_performance(tm, t, today)?),
            _ => None,
        };

        let role_metrics = Role::ALL
            .iter()
            .map(|role| RoleSummary {
                role: *role,
                scope: role.scope_description(),
                metrics: role.specific_metrics(),
            })
            .collect();

        Ok(Self {
            cache_key: ALL_QUERY_KEY.to_string(),
            created_at,
            users,
            tasks,
            projects,
            teams,
            overview,
            activities,
            task_stats,
            activity,
            project_status,
            project_progress,
            user_performance,
            team_performance,
            role_metrics,
        })
    }

    /// Names of the sources whose fetch failed.
    pub fn failed_sources(&self) -> Vec<&'static str> {
        [
            ("users", self.users.is_ok()),
            ("tasks", self.tasks.is_ok()),
            ("projects", self.projects.is_ok()),
            ("teams", self.teams.is_ok()),
            ("overview", self.overview.is_ok()),
            ("activities", self.activities.is_ok()),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.failed_sources().is_empty()
    }

    /// Borrowed view of the raw collections; failed sources read as empty.
    pub fn snapshot(&self) -> DataSnapshot<'_> {
        DataSnapshot {
            users: self.users.data.as_deref().unwrap_or_default(),
            tasks: self.tasks.data.as_deref().unwrap_or_default(),
            projects: self.projects.data.as_deref().unwrap_or_default(),
            teams: self.teams.data.as_deref().unwrap_or_default(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        day_of(&self.created_at)
    }
}

/// Fetches every source concurrently, derives the dashboard blocks and keeps
/// the result for the cache TTL.
pub struct AnalyticsAggregator<S: ApiSource, C: Clock = SystemClock> {
    source: S,
    cache: ResultCache<Arc<AnalyticsResult>, C>,
    options: AggregatorOptions,
}

impl AnalyticsAggregator<HttpApiClient> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpApiClient::from_config(config)?;
        Ok(Self::new(client, AggregatorOptions::from(config)))
    }
}

impl<S: ApiSource> AnalyticsAggregator<S> {
    pub fn new(source: S, options: AggregatorOptions) -> Self {
        Self::with_clock(source, options, SystemClock)
    }
}

impl<S: ApiSource, C: Clock> AnalyticsAggregator<S, C> {
    pub fn with_clock(source: S, options: AggregatorOptions, clock: C) -> Self {
        Self {
            source,
            cache: ResultCache::new(options.cache_ttl, clock),
            options,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &AggregatorOptions {
        &self.options
    }

    /// The full dashboard snapshot, served from cache while it is fresh.
    ///
    /// Source failures are recorded in their slice and never returned as
    /// `Err`; only inconsistent derived numbers are.
    pub async fn fetch_all(&self) -> Result<Arc<AnalyticsResult>> {
        if let Some(hit) = self.cache.get(ALL_QUERY_KEY) {
            log::debug!("Serving {ALL_QUERY_KEY} from cache");
            return Ok(hit);
        }

        log::info!("Fetching users, tasks, projects, teams, overview and activities");
        let (users, tasks, projects, teams, overview, activities) = futures::join!(
            self.source.users(),
            self.source.tasks(),
            self.source.projects(),
            self.source.teams(),
            self.source.overview(),
            self.source.recent_activities(self.options.activity_limit),
        );

        let result = AnalyticsResult::build(
            self.cache.clock().now(),
            self.options.window_days,
            Slice::settle("users", users),
            Slice::settle("tasks", tasks),
            Slice::settle("projects", projects),
            Slice::settle("teams", teams),
            Slice::settle("overview", overview),
            Slice::settle("activities", activities),
        )?;
        if result.has_errors() {
            log::warn!("Partial snapshot, failed sources: {}", result.failed_sources().join(", "));
        }

        let result = Arc::new(result);
        self.cache
            .set_at(ALL_QUERY_KEY, Arc::clone(&result), result.created_at);
        Ok(result)
    }

    /// Metrics restricted to what `role` may see from `user_id`'s position.
    pub async fn scoped_metrics(&self, role: Role, user_id: &str) -> Result<MetricSet> {
        let result = self.fetch_all().await?;
        if !result.users.is_ok() && role.scope_kind() != ScopeKind::Everyone {
            log::warn!("User list unavailable; scoping {role} to {user_id} alone");
        }
        let data = result.snapshot();
        let forest = Forest::build(data.users);
        compute_role_scoped_metrics(role, &data, &forest, user_id, result.today())
    }

    /// Drop the cached snapshot so the next call fetches again.
    pub fn clear_cache(&self) {
        log::debug!("Clearing analytics cache");
        self.cache.clear();
    }
}
