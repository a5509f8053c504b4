pub mod activity;
pub mod scope;
pub mod types;

pub use activity::compute_rolling_activity;
pub use scope::{compute_role_scoped_metrics, DataSnapshot, Scope};
pub use types::*;

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::api::{Project, Task, Team, User};
use crate::error::{Error, Result};

static RE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\-]+").unwrap());

/// Chart colors, assigned to buckets in first-seen order.
pub const PALETTE: [&str; 8] = [
    "#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884D8", "#82CA9D", "#FF6B6B", "#A28CF0",
];

const UNSPECIFIED: &str = "UNSPECIFIED";
const FINISHED_STATUSES: &[&str] = &["FINISHED", "COMPLETED", "DONE"];
const IN_PROGRESS_STATUSES: &[&str] = &["IN_PROGRESS", "IN_REVIEW"];
const ESCALATED_STATUSES: &[&str] = &["BLOCKED", "ESCALATED"];
const URGENT_PRIORITIES: &[&str] = &["HIGH", "URGENT", "CRITICAL"];

/// Uppercase, with whitespace and hyphen runs collapsed to `_`.
/// `in progress`, `In-Progress` and `IN_PROGRESS` all normalize alike.
pub fn normalize_status(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return UNSPECIFIED.to_string();
    }
    RE_SEPARATORS
        .replace_all(trimmed, "_")
        .to_ascii_uppercase()
}

/// `IN_PROGRESS` -> `In Progress`.
pub fn status_label(normalized: &str) -> String {
    normalized
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_finished(task: &Task) -> bool {
    FINISHED_STATUSES.contains(&normalize_status(&task.status).as_str())
}

pub fn is_in_progress(task: &Task) -> bool {
    IN_PROGRESS_STATUSES.contains(&normalize_status(&task.status).as_str())
}

/// Due strictly before `today` and not finished.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !is_finished(task) && task.due_date.is_some_and(|due| due < today)
}

/// An unfinished task is escalated when it is explicitly blocked/escalated,
/// or overdue with a high-urgency priority.
pub fn is_escalated(task: &Task, today: NaiveDate) -> bool {
    if is_finished(task) {
        return false;
    }
    if ESCALATED_STATUSES.contains(&normalize_status(&task.status).as_str()) {
        return true;
    }
    let urgent = task
        .priority
        .as_deref()
        .map(normalize_status)
        .is_some_and(|p| URGENT_PRIORITIES.contains(&p.as_str()));
    urgent && is_overdue(task, today)
}

/// `round(completed / total * 100)`, half rounding up, 0 when `total == 0`.
/// `completed > total` means the caller counted wrong and is an error.
pub fn completion_percentage(completed: u64, total: u64) -> Result<u32> {
    if completed > total {
        return Err(Error::Aggregation(format!(
            "completed count {completed} exceeds total {total}"
        )));
    }
    if total == 0 {
        return Ok(0);
    }
    let pct = (completed * 200 + total) / (total * 2);
    u32::try_from(pct).map_err(|_| Error::Aggregation(format!("percentage overflow: {pct}")))
}

/// Count normalized keys in first-seen order and color them from the palette.
fn histogram<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<HistogramBucket> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<HistogramBucket> = Vec::new();

    for raw in keys {
        let key = normalize_status(raw);
        match index.get(&key) {
            Some(&i) => {
                if let Some(bucket) = buckets.get_mut(i) {
                    bucket.value += 1;
                }
            }
            None => {
                let i = buckets.len();
                index.insert(key.clone(), i);
                buckets.push(HistogramBucket {
                    name: status_label(&key),
                    key,
                    value: 1,
                    color: PALETTE[i % PALETTE.len()].to_string(),
                });
            }
        }
    }
    buckets
}

pub fn compute_task_status_histogram(tasks: &[Task]) -> Vec<HistogramBucket> {
    histogram(tasks.iter().map(|t| t.status.as_str()))
}

pub fn compute_task_priority_histogram(tasks: &[Task]) -> Vec<HistogramBucket> {
    histogram(tasks.iter().map(|t| t.priority.as_deref().unwrap_or("")))
}

pub fn compute_project_status_histogram(projects: &[Project]) -> Vec<HistogramBucket> {
    histogram(projects.iter().map(|p| p.status.as_deref().unwrap_or("")))
}

/// Per-project completion derived from the tasks that reference each project.
pub fn compute_project_progress(projects: &[Project], tasks: &[Task]) -> Result<Vec<ProjectProgress>> {
    let mut counts: HashMap<&str, (u64, u64)> = HashMap::new();
    for task in tasks {
        if let Some(pid) = task.project_id.as_deref() {
            let entry = counts.entry(pid).or_insert((0, 0));
            entry.1 += 1;
            if is_finished(task) {
                entry.0 += 1;
            }
        }
    }

    projects
        .iter()
        .map(|p| {
            let (completed, total) = counts.get(p.id.as_str()).copied().unwrap_or((0, 0));
            Ok(ProjectProgress {
                project_id: p.id.clone(),
                name: p.name.clone(),
                completed,
                total,
                percentage: completion_percentage(completed, total)?,
            })
        })
        .collect()
}

pub fn compute_task_stats(tasks: &[Task], today: NaiveDate) -> Result<TaskStats> {
    let total = tasks.len() as u64;
    let completed = tasks.iter().filter(|t| is_finished(t)).count() as u64;
    let in_progress = tasks.iter().filter(|t| is_in_progress(t)).count() as u64;
    let overdue = tasks.iter().filter(|t| is_overdue(t, today)).count() as u64;

    Ok(TaskStats {
        total,
        completed,
        in_progress,
        overdue,
        completion_rate: completion_percentage(completed, total)?,
        status_histogram: compute_task_status_histogram(tasks),
        priority_histogram: compute_task_priority_histogram(tasks),
    })
}

/// Per-assignee rollup, best completion rate first. Users with no tasks
/// are included with zero counts; tasks assigned to unknown ids are skipped.
pub fn compute_user_performance(
    users: &[User],
    tasks: &[Task],
    today: NaiveDate,
) -> Result<Vec<UserPerformance>> {
    let mut by_assignee: HashMap<&str, (u64, u64, u64)> = HashMap::new();
    for task in tasks {
        if let Some(assignee) = task.assignee_id.as_deref() {
            let entry = by_assignee.entry(assignee).or_insert((0, 0, 0));
            entry.0 += 1;
            if is_finished(task) {
                entry.1 += 1;
            }
            if is_overdue(task, today) {
                entry.2 += 1;
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    let mut rows = Vec::with_capacity(users.len());
    for user in users {
        if !seen.insert(user.id.as_str()) {
            continue;
        }
        let (assigned, completed, overdue) =
            by_assignee.get(user.id.as_str()).copied().unwrap_or((0, 0, 0));
        rows.push(UserPerformance {
            user_id: user.id.clone(),
            name: user.name.clone(),
            assigned,
            completed,
            overdue,
            completion_rate: completion_percentage(completed, assigned)?,
        });
    }

    rows.sort_by(|a, b| {
        b.completion_rate
            .cmp(&a.completion_rate)
            .then(b.completed.cmp(&a.completed))
            .then(a.name.cmp(&b.name))
    });
    Ok(rows)
}

/// Per-team rollup. A task counts toward a team when it is filed under the
/// team or assigned to its lead or one of its members; it counts once.
pub fn compute_team_performance(
    teams: &[Team],
    tasks: &[Task],
    today: NaiveDate,
) -> Result<Vec<TeamPerformance>> {
    teams
        .iter()
        .map(|team| {
            let team_tasks: Vec<&Task> = tasks
                .iter()
                .filter(|t| {
                    t.team_id.as_deref() == Some(team.id.as_str())
                        || t.assignee_id.as_deref().is_some_and(|a| team.includes(a))
                })
                .collect();
            let total_tasks = team_tasks.len() as u64;
            let completed = team_tasks.iter().filter(|t| is_finished(t)).count() as u64;
            let overdue = team_tasks.iter().filter(|t| is_overdue(t, today)).count() as u64;

            let mut members: std::collections::HashSet<&str> =
                team.member_ids.iter().map(String::as_str).collect();
            if let Some(lead) = team.lead_id.as_deref() {
                members.insert(lead);
            }

            Ok(TeamPerformance {
                team_id: team.id.clone(),
                name: team.name.clone(),
                member_count: members.len() as u64,
                total_tasks,
                completed,
                overdue,
                completion_rate: completion_percentage(completed, total_tasks)?,
            })
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::role::Role;

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status("finished"), "FINISHED");
        assert_eq!(normalize_status(" In progress "), "IN_PROGRESS");
        assert_eq!(normalize_status("in-progress"), "IN_PROGRESS");
        assert_eq!(normalize_status("IN_PROGRESS"), "IN_PROGRESS");
        assert_eq!(normalize_status(""), "UNSPECIFIED");
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label("IN_PROGRESS"), "In Progress");
        assert_eq!(status_label("FINISHED"), "Finished");
    }

    #[test]
    fn test_histogram_normalizes_case() {
        let tasks = vec![
            task("1", "FINISHED", None),
            task("2", "finished", None),
            task("3", "IN_PROGRESS", None),
        ];
        let hist = compute_task_status_histogram(&tasks);
        assert_eq!(hist.len(), 2);
        assert_eq!(hist[0].key, "FINISHED");
        assert_eq!(hist[0].value, 2);
        assert_eq!(hist[0].color, PALETTE[0]);
        assert_eq!(hist[1].name, "In Progress");
        assert_eq!(hist[1].value, 1);
        assert_eq!(hist[1].color, PALETTE[1]);
    }

    #[test]
    fn test_histogram_identical_statuses_single_bucket() {
        let tasks: Vec<Task> = (0..17).map(|i| task(&i.to_string(), "todo", None)).collect();
        let hist = compute_task_status_histogram(&tasks);
        assert_eq!(hist.len(), 1);
        assert_eq!(hist[0].value, tasks.len() as u64);
    }

    #[test]
    fn test_histogram_palette_cycles() {
        let tasks: Vec<Task> = (0..10).map(|i| task(&i.to_string(), &format!("S{i}"), None)).collect();
        let hist = compute_task_status_histogram(&tasks);
        assert_eq!(hist.len(), 10);
        assert_eq!(hist[8].color, PALETTE[0]);
        assert_eq!(hist[9].color, PALETTE[1]);
    }

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(0, 0).unwrap(), 0);
        assert_eq!(completion_percentage(1, 3).unwrap(), 33);
        assert_eq!(completion_percentage(2, 3).unwrap(), 67);
        assert_eq!(completion_percentage(1, 8).unwrap(), 13); // 12.5 rounds up
        assert_eq!(completion_percentage(5, 5).unwrap(), 100);
        assert!(matches!(
            completion_percentage(4, 3),
            Err(Error::Aggregation(_))
        ));
    }

    #[test]
    fn test_project_progress_zero_tasks() {
        let projects = vec![project("p1", Some("active"), None)];
        let progress = compute_project_progress(&projects, &[]).unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].completed, 0);
        assert_eq!(progress[0].total, 0);
        assert_eq!(progress[0].percentage, 0);
    }

    #[test]
    fn test_project_progress_from_tasks() {
        let projects = vec![project("p1", None, None), project("p2", None, None)];
        let mut tasks = vec![
            task("1", "FINISHED", None),
            task("2", "IN_PROGRESS", None),
            task("3", "done", None),
            task("4", "todo", None),
        ];
        tasks[0].project_id = Some("p1".into());
        tasks[1].project_id = Some("p1".into());
        tasks[2].project_id = Some("p1".into());
        tasks[3].project_id = Some("p2".into());

        let progress = compute_project_progress(&projects, &tasks).unwrap();
        assert_eq!((progress[0].completed, progress[0].total), (2, 3));
        assert_eq!(progress[0].percentage, 67);
        assert_eq!((progress[1].completed, progress[1].total), (0, 1));
        assert_eq!(progress[1].percentage, 0);
    }

    #[test]
    fn test_overdue_and_escalated() {
        let today = d(2025, 3, 10);

        let mut late = task("1", "IN_PROGRESS", Some("u1"));
        late.due_date = Some(d(2025, 3, 9));
        assert!(is_overdue(&late, today));
        assert!(!is_escalated(&late, today));

        late.priority = Some("urgent".into());
        assert!(is_escalated(&late, today));

        let mut due_today = task("2", "todo", None);
        due_today.due_date = Some(today);
        due_today.priority = Some("HIGH".into());
        assert!(!is_overdue(&due_today, today));
        assert!(!is_escalated(&due_today, today));

        let blocked = task("3", "Blocked", None);
        assert!(is_escalated(&blocked, today));

        let mut finished_late = task("4", "FINISHED", None);
        finished_late.due_date = Some(d(2025, 1, 1));
        finished_late.priority = Some("critical".into());
        assert!(!is_overdue(&finished_late, today));
        assert!(!is_escalated(&finished_late, today));
    }

    #[test]
    fn test_task_stats() {
        let today = d(2025, 3, 10);
        let mut tasks = vec![
            task("1", "FINISHED", None),
            task("2", "in progress", None),
            task("3", "todo", None),
        ];
        tasks[2].due_date = Some(d(2025, 3, 1));
        tasks[2].priority = Some("high".into());

        let stats = compute_task_stats(&tasks, today).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 33);
        assert_eq!(stats.status_histogram.len(), 3);
        // Two tasks without priority share the UNSPECIFIED bucket
        assert_eq!(stats.priority_histogram[0].key, "UNSPECIFIED");
        assert_eq!(stats.priority_histogram[0].value, 2);
    }

    #[test]
    fn test_task_stats_empty() {
        let stats = compute_task_stats(&[], d(2025, 1, 1)).unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0);
        assert!(stats.status_histogram.is_empty());
    }

    #[test]
    fn test_user_performance() {
        let today = d(2025, 3, 10);
        let users = vec![
            user("u1", Role::Member, None),
            user("u2", Role::Member, None),
            user("u3", Role::Member, None),
        ];
        let mut tasks = vec![
            task("1", "FINISHED", Some("u1")),
            task("2", "todo", Some("u1")),
            task("3", "FINISHED", Some("u2")),
            task("4", "todo", Some("ghost")),
        ];
        tasks[1].due_date = Some(d(2025, 3, 1));

        let rows = compute_user_performance(&users, &tasks, today).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].user_id, "u2");
        assert_eq!(rows[0].completion_rate, 100);
        assert_eq!(rows[1].user_id, "u1");
        assert_eq!(rows[1].assigned, 2);
        assert_eq!(rows[1].overdue, 1);
        assert_eq!(rows[1].completion_rate, 50);
        assert_eq!(rows[2].user_id, "u3");
        assert_eq!(rows[2].assigned, 0);
    }

    #[test]
    fn test_team_performance_counts_each_task_once() {
        let today = d(2025, 3, 10);
        let teams = vec![team("t1", Some("lead"), &["m1", "m2"]), team("t2", None, &[])];
        let mut tasks = vec![
            task("1", "FINISHED", Some("m1")),
            task("2", "todo", Some("lead")),
            task("3", "todo", Some("outsider")),
            task("4", "todo", Some("m2")),
        ];
        tasks[2].team_id = Some("t1".into());
        // Filed under the team and assigned to a member
        tasks[3].team_id = Some("t1".into());

        let rows = compute_team_performance(&teams, &tasks, today).unwrap();
        assert_eq!(rows[0].total_tasks, 4);
        assert_eq!(rows[0].completed, 1);
        assert_eq!(rows[0].completion_rate, 25);
        assert_eq!(rows[0].member_count, 3);
        assert_eq!(rows[1].total_tasks, 0);
        assert_eq!(rows[1].completion_rate, 0);
    }

    #[test]
    fn test_project_status_histogram() {
        let projects = vec![
            project("p1", Some("active"), None),
            project("p2", Some("ACTIVE"), None),
            project("p3", None, None),
        ];
        let hist = compute_project_status_histogram(&projects);
        assert_eq!(hist.len(), 2);
        assert_eq!(hist[0].value, 2);
        assert_eq!(hist[1].key, "UNSPECIFIED");
    }
}
