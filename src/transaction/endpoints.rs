//! Route handlers for listing and managing transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryId,
    extract::ApiJson,
    month::MonthWindow,
    transaction::{
        NewTransaction, TransactionId, TransactionType, create_transaction, delete_transaction,
        get_transactions, update_transaction,
    },
};

/// The state needed for the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Optional month filter for listing transactions.
///
/// The filter only applies when both the month and the year are given.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    /// The month number, 1 is January.
    pub month: Option<u8>,
    /// The calendar year.
    pub year: Option<i32>,
}

/// The request body for creating or updating a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionData {
    /// The amount of money, must be positive.
    pub amount: f64,
    /// Whether the amount was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// A text description.
    #[serde(default)]
    pub description: String,
    /// When the transaction happened, e.g. "2025-01-15".
    pub date: Date,
}

impl From<&TransactionData> for NewTransaction {
    fn from(data: &TransactionData) -> Self {
        NewTransaction::new(data.category_id, data.amount, data.kind, data.date)
            .description(data.description.trim())
    }
}

/// Handler for listing the user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionQuery>,
) -> Response {
    let window = match (query.month, query.year) {
        (Some(month), Some(year)) => match MonthWindow::new(month, year) {
            Ok(window) => Some(window),
            Err(error) => return error.into_response(),
        },
        _ => None,
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_transactions(user_id, window, &connection) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for creating a transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<TransactionData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_transaction(user_id, NewTransaction::from(&data), &connection) {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(error) => {
            tracing::debug!("Could not create transaction with {data:?}: {error}");
            error.into_response()
        }
    }
}

/// Handler for replacing a transaction's fields.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<TransactionData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_transaction(
        user_id,
        transaction_id,
        &NewTransaction::from(&data),
        &connection,
    ) {
        Ok(transaction) => Json(transaction).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for deleting a transaction.
///
/// Deleting a transaction generated by a recurring transaction allows it to be generated again
/// the next time recurring transactions are applied in the same month.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_transaction(user_id, transaction_id, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(error) => {
            tracing::debug!("Could not delete transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}
