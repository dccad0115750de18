//! Route handlers for the monthly summary and the yearly report.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    month::{MonthQuery, MonthWindow},
    report::{build_monthly_summary, build_yearly_report, get_report_transactions},
    transaction::get_transactions,
};

/// The state needed for the report endpoints.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the yearly report.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct YearQuery {
    /// The calendar year.
    pub year: i32,
}

/// Handler for the dashboard summary of a month.
pub async fn get_monthly_summary_endpoint(
    State(state): State<ReportState>,
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

    let summary = get_report_transactions(user_id, window.start, window.end, &connection)
        .and_then(|transactions| {
            let recent = get_transactions(user_id, Some(window), &connection)?;
            Ok(build_monthly_summary(window, &transactions, recent))
        });

    match summary {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for the report of a calendar year.
pub async fn get_yearly_report_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<YearQuery>,
) -> Response {
    let (start, end) = match (MonthWindow::new(1, query.year), MonthWindow::new(12, query.year)) {
        (Ok(january), Ok(december)) => (january.start, december.end),
        (Err(error), _) | (_, Err(error)) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_report_transactions(user_id, start, end, &connection) {
        Ok(transactions) => Json(build_yearly_report(query.year, &transactions)).into_response(),
        Err(error) => error.into_response(),
    }
}
