//! Progress towards saving goals, relative to a given day.

use serde::Serialize;
use time::Date;

use crate::goal::SavingGoal;

/// A saving goal with how far along it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalWithProgress {
    /// The goal as stored.
    #[serde(flatten)]
    pub goal: SavingGoal,
    /// Percentage of the target saved, capped at 100.
    pub progress: f64,
    /// How much is left to save, never negative.
    pub remaining_amount: f64,
    /// Whole days from today until the deadline, negative once the deadline has passed.
    pub days_remaining: Option<i64>,
}

/// All saving goals of a user with their totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalOverview {
    /// Every goal, in the order given.
    pub goals: Vec<GoalWithProgress>,
    /// The sum of all targets.
    pub total_target: f64,
    /// The sum of all saved amounts.
    pub total_saved: f64,
    /// The number of goals that have not reached their target.
    pub active_count: usize,
    /// The number of goals that have reached their target.
    pub completed_count: usize,
}

/// Work out the progress of a single goal as of `today`.
pub fn goal_progress(goal: SavingGoal, today: Date) -> GoalWithProgress {
    let progress = if goal.target_amount > 0.0 {
        (goal.current_amount * 100.0 / goal.target_amount).min(100.0)
    } else {
        0.0
    };
    let remaining_amount = (goal.target_amount - goal.current_amount).max(0.0);
    let days_remaining = goal
        .deadline
        .map(|deadline| (deadline - today).whole_days());

    GoalWithProgress {
        goal,
        progress,
        remaining_amount,
        days_remaining,
    }
}

/// Summarise `goals` as of `today`.
pub fn build_goal_overview(goals: Vec<SavingGoal>, today: Date) -> GoalOverview {
    let total_target: f64 = goals.iter().map(|goal| goal.target_amount).sum();
    let total_saved: f64 = goals.iter().map(|goal| goal.current_amount).sum();
    let completed_count = goals.iter().filter(|goal| goal.is_completed).count();
    let active_count = goals.len() - completed_count;

    GoalOverview {
        goals: goals
            .into_iter()
            .map(|goal| goal_progress(goal, today))
            .collect(),
        total_target,
        total_saved,
        active_count,
        completed_count,
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, OffsetDateTime, macros::date};

    use crate::{auth::UserID, goal::SavingGoal};

    use super::{build_goal_overview, goal_progress};

    fn goal(id: i64, target_amount: f64, current_amount: f64, deadline: Option<Date>) -> SavingGoal {
        SavingGoal {
            id,
            user_id: UserID::new(1),
            title: format!("Goal {id}"),
            target_amount,
            current_amount,
            deadline,
            icon: "🎯".to_owned(),
            color: "#3b82f6".to_owned(),
            is_completed: current_amount >= target_amount,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn progress_is_percentage_of_target() {
        let progress = goal_progress(goal(1, 1_000.0, 250.0, None), date!(2025 - 01 - 01));

        assert_eq!(progress.progress, 25.0);
        assert_eq!(progress.remaining_amount, 750.0);
        assert_eq!(progress.days_remaining, None);
    }

    #[test]
    fn progress_is_capped_at_100() {
        let progress = goal_progress(goal(1, 1_000.0, 1_500.0, None), date!(2025 - 01 - 01));

        assert_eq!(progress.progress, 100.0);
        assert_eq!(progress.remaining_amount, 0.0);
    }

    #[test]
    fn days_remaining_counts_to_deadline() {
        let today = date!(2025 - 01 - 01);

        let upcoming = goal_progress(goal(1, 10.0, 0.0, Some(date!(2025 - 01 - 31))), today);
        let due_today = goal_progress(goal(2, 10.0, 0.0, Some(today)), today);
        let overdue = goal_progress(goal(3, 10.0, 0.0, Some(date!(2024 - 12 - 29))), today);

        assert_eq!(upcoming.days_remaining, Some(30));
        assert_eq!(due_today.days_remaining, Some(0));
        assert_eq!(overdue.days_remaining, Some(-3));
    }

    #[test]
    fn overview_totals_and_counts() {
        let overview = build_goal_overview(
            vec![
                goal(1, 1_000.0, 1_000.0, None),
                goal(2, 500.0, 100.0, None),
                goal(3, 300.0, 0.0, None),
            ],
            date!(2025 - 01 - 01),
        );

        assert_eq!(overview.total_target, 1_800.0);
        assert_eq!(overview.total_saved, 1_100.0);
        assert_eq!(overview.completed_count, 1);
        assert_eq!(overview.active_count, 2);
        assert_eq!(overview.goals.len(), 3);
    }

    #[test]
    fn overview_of_no_goals_is_empty() {
        let overview = build_goal_overview(Vec::new(), date!(2025 - 01 - 01));

        assert_eq!(overview.total_target, 0.0);
        assert_eq!(overview.active_count, 0);
        assert!(overview.goals.is_empty());
    }
}
