//! Classifies how much of each budget has been spent.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    budget::{Budget, BudgetId},
    category::CategoryId,
};

/// Spending at or above this share of the budget is close to the limit.
pub const NEAR_LIMIT_PERCENTAGE: f64 = 80.0;
/// Spending at or above this share of the budget is over the limit.
pub const OVER_BUDGET_PERCENTAGE: f64 = 100.0;

/// How close spending is to the budget amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Less than 80% of the budget has been spent.
    Normal,
    /// At least 80% but less than 100% of the budget has been spent.
    NearLimit,
    /// The whole budget has been spent.
    OverBudget,
}

/// The spending against a single budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetEvaluation {
    /// Total expenses in the budget's category and month.
    pub spent: f64,
    /// The budget amount minus what was spent, negative when over budget.
    pub remaining: f64,
    /// What was spent as a percentage of the budget amount.
    pub percentage: f64,
    /// [BudgetEvaluation::percentage] capped at 100, for progress bars.
    pub display_percentage: f64,
    /// The classification of `percentage`.
    pub status: BudgetStatus,
}

/// Compare `spent` with the budget `amount`.
///
/// A zero budget is reported as 0% when nothing was spent and as 100% (over budget)
/// as soon as anything is spent.
pub fn evaluate_budget(amount: f64, spent: f64) -> BudgetEvaluation {
    let percentage = if amount > 0.0 {
        spent * 100.0 / amount
    } else if spent > 0.0 {
        OVER_BUDGET_PERCENTAGE
    } else {
        0.0
    };

    let status = if percentage >= OVER_BUDGET_PERCENTAGE {
        BudgetStatus::OverBudget
    } else if percentage >= NEAR_LIMIT_PERCENTAGE {
        BudgetStatus::NearLimit
    } else {
        BudgetStatus::Normal
    };

    BudgetEvaluation {
        spent,
        remaining: amount - spent,
        percentage,
        display_percentage: percentage.min(100.0),
        status,
    }
}

/// A budget together with its spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetWithStatus {
    /// The budget.
    #[serde(flatten)]
    pub budget: Budget,
    /// The spending against the budget.
    #[serde(flatten)]
    pub evaluation: BudgetEvaluation,
}

/// A warning about a budget that is near or over its limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAlert {
    /// The budget the alert is about.
    pub budget_id: BudgetId,
    /// Either [BudgetStatus::NearLimit] or [BudgetStatus::OverBudget].
    pub status: BudgetStatus,
    /// A message for the user, e.g. "Budget 🍜 Makan & Minum is almost used up (85% used)".
    pub message: String,
}

/// Every budget of a month with its spending, totals and alerts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetOverview {
    /// The budgets with their spending.
    pub budgets: Vec<BudgetWithStatus>,
    /// The sum of the budget amounts.
    pub total_budget: f64,
    /// The sum of what was spent in the budgeted categories.
    pub total_spent: f64,
    /// `total_budget - total_spent`.
    pub total_remaining: f64,
    /// One alert per budget that is near or over its limit.
    pub alerts: Vec<BudgetAlert>,
}

/// Evaluate `budgets` against the expense totals in `spent_by_category`.
pub fn build_budget_overview(
    budgets: Vec<Budget>,
    spent_by_category: &HashMap<CategoryId, f64>,
) -> BudgetOverview {
    let mut total_budget = 0.0;
    let mut total_spent = 0.0;
    let mut alerts = Vec::new();

    let budgets: Vec<BudgetWithStatus> = budgets
        .into_iter()
        .map(|budget| {
            let spent = spent_by_category
                .get(&budget.category_id)
                .copied()
                .unwrap_or(0.0);
            let evaluation = evaluate_budget(budget.amount, spent);

            total_budget += budget.amount;
            total_spent += spent;

            if let Some(message) = alert_message(&budget, &evaluation) {
                alerts.push(BudgetAlert {
                    budget_id: budget.id,
                    status: evaluation.status,
                    message,
                });
            }

            BudgetWithStatus { budget, evaluation }
        })
        .collect();

    BudgetOverview {
        budgets,
        total_budget,
        total_spent,
        total_remaining: total_budget - total_spent,
        alerts,
    }
}

fn alert_message(budget: &Budget, evaluation: &BudgetEvaluation) -> Option<String> {
    let rounded = evaluation.percentage.round();

    match evaluation.status {
        BudgetStatus::Normal => None,
        BudgetStatus::NearLimit => Some(format!(
            "Budget {} {} is almost used up ({rounded}% used)",
            budget.category_icon, budget.category_name
        )),
        BudgetStatus::OverBudget => Some(format!(
            "Budget {} {} is over the limit ({rounded}% used)",
            budget.category_icon, budget.category_name
        )),
    }
}

#[cfg(test)]
mod evaluate_budget_tests {
    use super::{BudgetStatus, evaluate_budget};

    #[test]
    fn eighty_percent_is_near_limit() {
        let evaluation = evaluate_budget(1_000.0, 800.0);

        assert_eq!(evaluation.percentage, 80.0);
        assert_eq!(evaluation.status, BudgetStatus::NearLimit);
        assert_eq!(evaluation.remaining, 200.0);
    }

    #[test]
    fn just_below_eighty_percent_is_normal() {
        assert_eq!(evaluate_budget(1_000.0, 799.0).status, BudgetStatus::Normal);
    }

    #[test]
    fn hundred_percent_is_over_budget() {
        let evaluation = evaluate_budget(1_000.0, 1_000.0);

        assert_eq!(evaluation.percentage, 100.0);
        assert_eq!(evaluation.status, BudgetStatus::OverBudget);
        assert_eq!(evaluation.remaining, 0.0);
    }

    #[test]
    fn overspending_caps_display_percentage() {
        let evaluation = evaluate_budget(1_000.0, 1_200.0);

        assert_eq!(evaluation.percentage, 120.0);
        assert_eq!(evaluation.display_percentage, 100.0);
        assert_eq!(evaluation.remaining, -200.0);
        assert_eq!(evaluation.status, BudgetStatus::OverBudget);
    }

    #[test]
    fn zero_budget_without_spending_is_normal() {
        let evaluation = evaluate_budget(0.0, 0.0);

        assert_eq!(evaluation.percentage, 0.0);
        assert_eq!(evaluation.status, BudgetStatus::Normal);
    }

    #[test]
    fn zero_budget_with_spending_is_over_budget() {
        let evaluation = evaluate_budget(0.0, 50.0);

        assert_eq!(evaluation.percentage, 100.0);
        assert_eq!(evaluation.status, BudgetStatus::OverBudget);
        assert_eq!(evaluation.remaining, -50.0);
    }
}
