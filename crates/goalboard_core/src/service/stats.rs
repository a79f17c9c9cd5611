//! Dashboard counters derived from an owner's goals.
//!
//! Nothing here is stored; every value is recomputed from goal state.

use crate::model::goal::{Goal, GoalStatus};
use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Days ahead of `today` (inclusive) counted as "this week".
const WEEK_WINDOW_DAYS: u64 = 6;

/// Aggregate counts shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_goals: usize,
    pub active_goals: usize,
    pub completed_goals: usize,
    pub paused_goals: usize,
    pub cancelled_goals: usize,
    pub total_subtasks: usize,
    pub completed_subtasks: usize,
    /// Whole percent of goals in `COMPLETED`.
    pub goal_completion_rate: u8,
    /// Whole percent of subtasks marked complete.
    pub subtask_completion_rate: u8,
    /// Active goals whose due date is before today.
    pub overdue_goals: usize,
    /// Active goals due within the next seven days, today included.
    pub due_this_week: usize,
}

/// Computes dashboard counters for `goals` as of `today`.
pub fn compute_stats(goals: &[Goal], today: NaiveDate) -> DashboardStats {
    let week_end = today
        .checked_add_days(Days::new(WEEK_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX);

    let mut stats = DashboardStats {
        total_goals: goals.len(),
        ..DashboardStats::default()
    };

    for goal in goals {
        match goal.status {
            GoalStatus::Active => stats.active_goals += 1,
            GoalStatus::Completed => stats.completed_goals += 1,
            GoalStatus::Paused => stats.paused_goals += 1,
            GoalStatus::Cancelled => stats.cancelled_goals += 1,
        }
        stats.total_subtasks += goal.subtasks.len();
        stats.completed_subtasks += goal.completed_subtask_count();

        if goal.status != GoalStatus::Active {
            continue;
        }
        if let Some(due) = goal.due_date {
            if due < today {
                stats.overdue_goals += 1;
            } else if due <= week_end {
                stats.due_this_week += 1;
            }
        }
    }

    stats.goal_completion_rate = percent(stats.completed_goals, stats.total_goals);
    stats.subtask_completion_rate = percent(stats.completed_subtasks, stats.total_subtasks);
    stats
}

fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let rounded = (part as f64 * 100.0 / whole as f64).round();
    rounded.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::{compute_stats, percent};
    use crate::model::goal::{Goal, GoalStatus, Subtask};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn goal(status: GoalStatus, due: Option<&str>, done: &[bool]) -> Goal {
        let mut goal = Goal::new(Uuid::new_v4(), "goal");
        goal.status = status;
        goal.due_date = due.map(date);
        for completed in done {
            let mut subtask = Subtask::new(goal.id, "step");
            subtask.completed = *completed;
            goal.subtasks.push(subtask);
        }
        goal
    }

    #[test]
    fn empty_input_yields_zero_rates() {
        let stats = compute_stats(&[], date("2025-03-10"));
        assert_eq!(stats.total_goals, 0);
        assert_eq!(stats.goal_completion_rate, 0);
        assert_eq!(stats.subtask_completion_rate, 0);
    }

    #[test]
    fn counts_statuses_rates_and_due_windows() {
        let today = date("2025-03-10");
        let goals = vec![
            goal(GoalStatus::Active, Some("2025-03-09"), &[true, false]),
            goal(GoalStatus::Active, Some("2025-03-10"), &[false]),
            goal(GoalStatus::Active, Some("2025-03-16"), &[]),
            goal(GoalStatus::Active, Some("2025-03-17"), &[]),
            goal(GoalStatus::Completed, Some("2025-03-01"), &[true, true]),
            goal(GoalStatus::Paused, Some("2025-03-01"), &[]),
        ];

        let stats = compute_stats(&goals, today);

        assert_eq!(stats.total_goals, 6);
        assert_eq!(stats.active_goals, 4);
        assert_eq!(stats.completed_goals, 1);
        assert_eq!(stats.paused_goals, 1);
        assert_eq!(stats.total_subtasks, 5);
        assert_eq!(stats.completed_subtasks, 3);
        assert_eq!(stats.goal_completion_rate, 17);
        assert_eq!(stats.subtask_completion_rate, 60);
        assert_eq!(stats.overdue_goals, 1);
        assert_eq!(stats.due_this_week, 2);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(0, 0), 0);
    }
}
