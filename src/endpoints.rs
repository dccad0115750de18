//! The API endpoints URIs.

/// The route for registering a new user.
pub const REGISTER: &str = "/api/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to view and edit the current user's profile.
pub const PROFILE: &str = "/api/profile";
/// The route to change the current user's password.
pub const PROFILE_PASSWORD: &str = "/api/profile/password";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to edit and delete a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to edit and delete a transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to list and set budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to delete a budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to list and create saving goals.
pub const GOALS: &str = "/api/goals";
/// The route to edit and delete a saving goal.
pub const GOAL: &str = "/api/goals/{goal_id}";
/// The route to add savings to a goal.
pub const GOAL_TOP_UP: &str = "/api/goals/{goal_id}/top_up";
/// The route to list and create recurring transactions.
pub const RECURRING: &str = "/api/recurring";
/// The route to toggle and delete a recurring transaction.
pub const RECURRING_ITEM: &str = "/api/recurring/{recurring_id}";
/// The route to apply the recurring transactions that are due today.
pub const RECURRING_APPLY: &str = "/api/recurring/apply";
/// The route to list and create notes.
pub const NOTES: &str = "/api/notes";
/// The route to edit and delete a note.
pub const NOTE: &str = "/api/notes/{note_id}";
/// The route for the dashboard summary of a month.
pub const MONTHLY_REPORT: &str = "/api/reports/monthly";
/// The route for the report of a year.
pub const YEARLY_REPORT: &str = "/api/reports/yearly";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/notes/{note_id}', '{note_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
