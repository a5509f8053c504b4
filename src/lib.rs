pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod date_util;
pub mod error;
pub mod hierarchy;
pub mod metrics;
pub mod role;

pub use aggregator::{AggregatorOptions, AnalyticsAggregator, AnalyticsResult, RoleSummary, Slice};
pub use api::{ApiSource, HttpApiClient, OverviewData, Project, RecentActivity, Task, Team, User};
pub use cache::{Clock, ManualClock, ResultCache, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use hierarchy::{Forest, HierarchyNode};
pub use metrics::{compute_role_scoped_metrics, DataSnapshot, MetricSet, Scope};
pub use role::{role_scope_description, role_specific_metrics, Role, ScopeKind};
