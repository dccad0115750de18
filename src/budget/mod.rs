//! Monthly budgets per category and how much of them has been spent.

mod core;
mod endpoints;
mod status;

pub use core::{
    Budget, BudgetId, create_budget_table, delete_budget, get_budgets,
    get_expense_totals_by_category, upsert_budget,
};
pub use endpoints::{delete_budget_endpoint, get_budgets_endpoint, upsert_budget_endpoint};
pub use status::build_budget_overview;
