//! Route handlers for managing and applying recurring transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryId,
    extract::ApiJson,
    recurring::{
        DayOfMonth, NewRecurringTransaction, RecurringId, SQLiteRecurringLedger,
        apply_due_recurring, create_recurring_transaction, delete_recurring_transaction,
        get_recurring_transactions, set_recurring_active,
    },
    timezone::local_today,
    transaction::TransactionType,
};

/// The state needed for the recurring transaction endpoints.
#[derive(Debug, Clone)]
pub struct RecurringState {
    /// The local timezone as a canonical timezone name, decides which day is "today".
    pub local_timezone: String,
    /// The database connection for managing recurring transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a recurring transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct RecurringData {
    /// The amount of the generated transactions, must be positive.
    pub amount: f64,
    /// Whether the generated transactions are income or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The category of the generated transactions.
    pub category_id: CategoryId,
    /// The description, the category name is used when empty.
    #[serde(default)]
    pub description: String,
    /// The day of the month, between 1 and 28.
    pub day_of_month: i64,
}

/// The request body for turning a recurring transaction on or off.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleData {
    /// Whether the recurring transaction should be applied.
    pub is_active: bool,
}

/// Handler for listing the user's recurring transactions, newest first.
pub async fn get_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_recurring_transactions(user_id, &connection) {
        Ok(recurring) => Json(recurring).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for creating a recurring transaction.
pub async fn create_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<RecurringData>,
) -> Response {
    let day_of_month = match DayOfMonth::new(data.day_of_month) {
        Ok(day_of_month) => day_of_month,
        Err(error) => return error.into_response(),
    };

    let new_recurring = NewRecurringTransaction {
        category_id: data.category_id,
        amount: data.amount,
        kind: data.kind,
        description: data.description.trim().to_owned(),
        day_of_month,
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_recurring_transaction(user_id, new_recurring, &connection) {
        Ok(recurring) => (StatusCode::CREATED, Json(recurring)).into_response(),
        Err(error) => {
            tracing::debug!("Could not create recurring transaction with {data:?}: {error}");
            error.into_response()
        }
    }
}

/// Handler for turning a recurring transaction on or off.
pub async fn toggle_recurring_endpoint(
    Path(recurring_id): Path<RecurringId>,
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<ToggleData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match set_recurring_active(user_id, recurring_id, data.is_active, &connection) {
        Ok(recurring) => Json(recurring).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for deleting a recurring transaction, keeping the transactions it generated.
pub async fn delete_recurring_endpoint(
    Path(recurring_id): Path<RecurringId>,
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_recurring_transaction(user_id, recurring_id, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for applying the user's recurring transactions that are due today.
///
/// "Today" is the current date in the server's configured timezone.
pub async fn apply_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let start_time = std::time::Instant::now();

    let Some(today) = local_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match apply_due_recurring(&SQLiteRecurringLedger::new(&connection), user_id, today) {
        Ok(result) => {
            tracing::info!(
                "Applied recurring transactions for user {user_id} on {today} in {}ms: {} created, {} skipped, {} failed",
                start_time.elapsed().as_millis(),
                result.created_count,
                result.skipped_count,
                result.failed_count
            );

            Json(result).into_response()
        }
        Err(error) => {
            tracing::error!(
                "Failed to apply recurring transactions for user {user_id} after {}ms: {error}",
                start_time.elapsed().as_millis()
            );
            error.into_response()
        }
    }
}
