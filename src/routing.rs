//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};

use crate::{
    AppState, Error,
    auth::{
        auth_guard, change_password, get_log_out, get_profile, post_log_in, register_user,
        update_profile,
    },
    budget::{delete_budget_endpoint, get_budgets_endpoint, upsert_budget_endpoint},
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_endpoint,
        update_category_endpoint,
    },
    endpoints,
    goal::{
        create_goal_endpoint, delete_goal_endpoint, get_goals_endpoint, top_up_goal_endpoint,
        update_goal_endpoint,
    },
    note::{create_note_endpoint, delete_note_endpoint, get_notes_endpoint, update_note_endpoint},
    recurring::{
        apply_recurring_endpoint, create_recurring_endpoint, delete_recurring_endpoint,
        get_recurring_endpoint, toggle_recurring_endpoint,
    },
    report::{get_monthly_summary_endpoint, get_yearly_report_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transactions_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::PROFILE, get(get_profile).put(update_profile))
        .route(endpoints::PROFILE_PASSWORD, put(change_password))
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(upsert_budget_endpoint),
        )
        .route(endpoints::BUDGET, delete(delete_budget_endpoint))
        .route(
            endpoints::GOALS,
            get(get_goals_endpoint).post(create_goal_endpoint),
        )
        .route(
            endpoints::GOAL,
            put(update_goal_endpoint).delete(delete_goal_endpoint),
        )
        .route(endpoints::GOAL_TOP_UP, post(top_up_goal_endpoint))
        .route(
            endpoints::RECURRING,
            get(get_recurring_endpoint).post(create_recurring_endpoint),
        )
        .route(endpoints::RECURRING_APPLY, post(apply_recurring_endpoint))
        .route(
            endpoints::RECURRING_ITEM,
            patch(toggle_recurring_endpoint).delete(delete_recurring_endpoint),
        )
        .route(
            endpoints::NOTES,
            get(get_notes_endpoint).post(create_note_endpoint),
        )
        .route(
            endpoints::NOTE,
            put(update_note_endpoint).delete(delete_note_endpoint),
        )
        .route(endpoints::MONTHLY_REPORT, get(get_monthly_summary_endpoint))
        .route(endpoints::YEARLY_REPORT, get(get_yearly_report_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
