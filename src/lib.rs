//! Kantong is a personal finance tracker.
//!
//! Users record income and expense transactions, sort them into categories,
//! set monthly budgets, track savings goals, keep notes and configure
//! recurring transactions that are applied once per calendar month.
//!
//! This library provides a JSON REST API backed by a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod budget;
mod category;
mod database_id;
mod db;
mod endpoints;
mod extract;
mod goal;
mod logging;
mod month;
mod note;
mod recurring;
mod report;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    PasswordHash, User, UserID, ValidatedPassword, create_user, get_all_user_ids,
    get_user_by_email, update_password,
};
pub use category::{count_categories, seed_default_categories};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use recurring::{ApplyResult, SQLiteRecurringLedger, apply_due_recurring};
pub use routing::build_router;
pub use timezone::{get_local_offset, local_today};

use crate::{budget::BudgetId, category::CategoryId};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a valid auth cookie.
    #[error("unauthorized")]
    Unauthorized,

    /// The email and password combination did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is not a plausible email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email address is already used by another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// A name (user, category) was empty or only whitespace.
    #[error("name cannot be empty")]
    EmptyName,

    /// A title (saving goal, note) was empty or only whitespace.
    #[error("title cannot be empty")]
    EmptyTitle,

    /// A money amount was negative, zero where a positive amount is required,
    /// or not a finite number.
    #[error("{0} is not a valid amount")]
    InvalidAmount(f64),

    /// A recurring transaction day of month outside of 1 to 28.
    #[error("{0} is not a valid day of the month, choose a day between 1 and 28")]
    InvalidDayOfMonth(i64),

    /// The request body was missing, was not valid JSON or did not have the expected fields.
    #[error("invalid request body: {0}")]
    InvalidJson(String),

    /// A month number outside of 1 to 12, or a year that cannot be represented.
    #[error("{month}/{year} is not a valid month")]
    InvalidMonth {
        /// The month number, 1 is January.
        month: u8,
        /// The calendar year.
        year: i32,
    },

    /// The category ID did not refer to a valid category.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The category still has transactions and cannot be deleted.
    #[error("the category is still used by transactions and cannot be deleted")]
    CategoryInUse,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete budget {0} which is not in the database")]
    DeleteMissingBudget(BudgetId),

    /// Tried to update a saving goal that does not exist
    #[error("tried to update a saving goal that is not in the database")]
    UpdateMissingGoal,

    /// Tried to delete a saving goal that does not exist
    #[error("tried to delete a saving goal that is not in the database")]
    DeleteMissingGoal,

    /// Tried to update a recurring transaction that does not exist
    #[error("tried to update a recurring transaction that is not in the database")]
    UpdateMissingRecurring,

    /// Tried to delete a recurring transaction that does not exist
    #[error("tried to delete a recurring transaction that is not in the database")]
    DeleteMissingRecurring,

    /// Tried to update a note that does not exist
    #[error("tried to update a note that is not in the database")]
    UpdateMissingNote,

    /// Tried to delete a note that does not exist
    #[error("tried to delete a note that is not in the database")]
    DeleteMissingNote,

    /// A recurring transaction was already applied for the month.
    ///
    /// Raised when the unique (recurring transaction, month) index rejects an
    /// insert, which happens when two applies race each other.
    #[error("the recurring transaction was already applied this month")]
    AlreadyApplied,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory
            | Error::DeleteMissingBudget(_)
            | Error::UpdateMissingGoal
            | Error::DeleteMissingGoal
            | Error::UpdateMissingRecurring
            | Error::DeleteMissingRecurring
            | Error::UpdateMissingNote
            | Error::DeleteMissingNote => StatusCode::NOT_FOUND,
            Error::InvalidCredentials
            | Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::DuplicateEmail
            | Error::EmptyName
            | Error::EmptyTitle
            | Error::InvalidAmount(_)
            | Error::InvalidDayOfMonth(_)
            | Error::InvalidJson(_)
            | Error::InvalidMonth { .. }
            | Error::InvalidCategory(_)
            | Error::CategoryInUse => StatusCode::BAD_REQUEST,
            Error::AlreadyApplied => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Any errors that are not client errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
