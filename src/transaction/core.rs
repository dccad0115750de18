//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    category::CategoryId,
    database_id::DatabaseId,
    month::MonthWindow,
    recurring::RecurringId,
};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a transaction.
pub type TransactionId = DatabaseId;

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The lowercase name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// Whether the amount was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// The recurring transaction that generated this transaction, if any.
    pub recurring_id: Option<RecurringId>,
    /// The month, e.g. "2025-01", that the recurring transaction was applied for.
    pub recurring_period: Option<String>,
}

/// The fields needed to create a transaction.
///
/// Use [NewTransaction::new] and the setter methods to build one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// The amount of money, must be positive.
    pub amount: f64,
    /// Whether the amount was earned or spent.
    pub kind: TransactionType,
    /// A text description, may be empty.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// The recurring transaction and month this transaction was generated for.
    pub recurring: Option<(RecurringId, String)>,
}

impl NewTransaction {
    /// Create the fields for a transaction with an empty description.
    pub fn new(category_id: CategoryId, amount: f64, kind: TransactionType, date: Date) -> Self {
        Self {
            category_id,
            amount,
            kind,
            description: String::new(),
            date,
            recurring: None,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }

    /// Mark the transaction as generated by `recurring_id` for `period`, e.g. "2025-01".
    pub fn recurring(mut self, recurring_id: RecurringId, period: String) -> Self {
        self.recurring = Some((recurring_id, period));
        self
    }
}

/// Check that `amount` is a finite number greater than zero.
///
/// # Errors
/// Returns [Error::InvalidAmount] otherwise.
pub fn validate_positive_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, category_id, amount, type, description, date, \
                                   recurring_id, recurring_period";

/// Create the transaction table in the database.
///
/// The unique index on (recurring_id, recurring_period) guarantees that a recurring transaction
/// generates at most one transaction per month. Rows with a NULL recurring ID never conflict.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            description TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL,
            recurring_id INTEGER,
            recurring_period TEXT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE,
            FOREIGN KEY(recurring_id) REFERENCES recurring_transaction(id) ON DELETE SET NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_transaction_recurring_period
            ON \"transaction\"(recurring_id, recurring_period);

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    Ok(())
}

/// Create a new transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - [Error::AlreadyApplied] if the recurring transaction already has a transaction for the month,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_positive_amount(new_transaction.amount)?;

    let (recurring_id, recurring_period) = new_transaction.recurring.unzip();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, category_id, amount, type, description, date, recurring_id, recurring_period)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                user_id.as_i64(),
                new_transaction.category_id,
                new_transaction.amount,
                new_transaction.kind,
                new_transaction.description,
                new_transaction.date,
                recurring_id,
                recurring_period,
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(new_transaction.category_id),
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::AlreadyApplied,
            error => error.into(),
        })
}

/// Retrieve a transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve the user's transactions, newest first.
///
/// Only transactions dated inside `window` are returned when it is given.
pub fn get_transactions(
    user_id: UserID,
    window: Option<MonthWindow>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    match window {
        Some(window) => connection
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
                 WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
                 ORDER BY date DESC, id DESC"
            ))?
            .query_map(
                params![user_id.as_i64(), window.start, window.end],
                map_transaction_row,
            )?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect(),
        None => connection
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
                 WHERE user_id = ?1
                 ORDER BY date DESC, id DESC"
            ))?
            .query_map([user_id.as_i64()], map_transaction_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect(),
    }
}

/// Find the transaction that `recurring_id` generated for the month of `window`.
pub fn find_generated_transaction(
    user_id: UserID,
    recurring_id: RecurringId,
    window: MonthWindow,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    let result = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND recurring_id = ?2 AND recurring_period = ?3"
        ))?
        .query_row(
            params![user_id.as_i64(), recurring_id, window.period_key()],
            map_transaction_row,
        );

    match result {
        Ok(transaction) => Ok(Some(transaction)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Replace the user editable fields of a transaction.
///
/// The link to a recurring transaction is kept.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - [Error::UpdateMissingTransaction] if the user has no transaction with `id`.
pub fn update_transaction(
    user_id: UserID,
    id: TransactionId,
    update: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_positive_amount(update.amount)?;

    let rows_affected = connection
        .execute(
            "UPDATE \"transaction\"
             SET category_id = ?1, amount = ?2, type = ?3, description = ?4, date = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![
                update.category_id,
                update.amount,
                update.kind,
                update.description,
                update.date,
                id,
                user_id.as_i64(),
            ],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::InvalidCategory(update.category_id)
            }
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    get_transaction(user_id, id, connection)
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if the user has no transaction with `id`.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the total number of transactions the user has.
#[cfg(test)]
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        amount: row.get(3)?,
        kind: row.get(4)?,
        description: row.get(5)?,
        date: row.get(6)?,
        recurring_id: row.get(7)?,
        recurring_period: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
