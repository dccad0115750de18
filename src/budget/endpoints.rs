//! Route handlers for budgets.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{
        BudgetId, build_budget_overview, delete_budget, get_budgets,
        get_expense_totals_by_category, upsert_budget,
    },
    category::CategoryId,
    extract::ApiJson,
    month::{MonthQuery, MonthWindow},
};

/// The state needed for the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for setting a budget.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetData {
    /// The category whose expenses count towards the budget.
    pub category_id: CategoryId,
    /// The most that should be spent in the month.
    pub amount: f64,
    /// The month number, 1 is January.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
}

/// Handler for listing the budgets of a month with their spending and alerts.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Response {
    let window = match query.window() {
        Ok(window) => window,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let overview = get_budgets(user_id, window, &connection).and_then(|budgets| {
        let spent_by_category = get_expense_totals_by_category(user_id, window, &connection)?;
        Ok(build_budget_overview(budgets, &spent_by_category))
    });

    match overview {
        Ok(overview) => Json(overview).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for creating a budget, or replacing the amount of the existing budget for the same
/// category and month.
pub async fn upsert_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<BudgetData>,
) -> Response {
    let window = match MonthWindow::new(data.month, data.year) {
        Ok(window) => window,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match upsert_budget(user_id, data.category_id, data.amount, window, &connection) {
        Ok(budget) => Json(budget).into_response(),
        Err(error) => {
            tracing::debug!("Could not set budget with {data:?}: {error}");
            error.into_response()
        }
    }
}

/// Handler for deleting a budget.
pub async fn delete_budget_endpoint(
    Path(budget_id): Path<BudgetId>,
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_budget(user_id, budget_id, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(error) => error.into_response(),
    }
}
