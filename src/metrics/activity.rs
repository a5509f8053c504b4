use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use super::is_finished;
use super::types::TimeSeriesPoint;
use crate::api::Task;
use crate::date_util::{day_label, day_of, last_n_days};

#[derive(Default)]
struct DayCounts<'a> {
    created: u64,
    completed: u64,
    active: HashSet<&'a str>,
}

/// Daily created/completed/active-user counts for the `window_days` calendar
/// days ending at `today` (inclusive), oldest first.
///
/// A task counts as completed on the day of its `updated_at` when its status
/// is finished. Days are compared as UTC calendar dates.
pub fn compute_rolling_activity(
    tasks: &[Task],
    today: NaiveDate,
    window_days: u32,
) -> Vec<TimeSeriesPoint> {
    let days = last_n_days(today, window_days);
    let Some(first) = days.first().copied() else {
        return Vec::new();
    };

    let mut by_day: BTreeMap<NaiveDate, DayCounts> = days
        .iter()
        .map(|d| (*d, DayCounts::default()))
        .collect();
    let in_window = |d: NaiveDate| d >= first && d <= today;

    for task in tasks {
        let created_day = task.created_at.as_ref().map(day_of).filter(|d| in_window(*d));
        let updated_day = task.updated_at.as_ref().map(day_of).filter(|d| in_window(*d));

        if let Some(day) = created_day {
            if let Some(counts) = by_day.get_mut(&day) {
                counts.created += 1;
                if let Some(a) = task.assignee_id.as_deref() {
                    counts.active.insert(a);
                }
            }
        }
        if let Some(day) = updated_day {
            if let Some(counts) = by_day.get_mut(&day) {
                if is_finished(task) {
                    counts.completed += 1;
                }
                if let Some(a) = task.assignee_id.as_deref() {
                    counts.active.insert(a);
                }
            }
        }
    }

    by_day
        .into_iter()
        .map(|(date, counts)| TimeSeriesPoint {
            date,
            label: day_label(date),
            created: counts.created,
            completed: counts.completed,
            active_users: counts.active.len() as u64,
        })
        .collect()
}
