//! Defines the budget model and its database queries.

use std::collections::HashMap;

use rusqlite::{Connection, Row, params};
use serde::Serialize;

use crate::{
    Error, auth::UserID, category::CategoryId, database_id::DatabaseId, month::MonthWindow,
};

/// Database identifier for a budget.
pub type BudgetId = DatabaseId;

/// A spending limit for one category in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserID,
    /// The category whose expenses count towards the budget.
    pub category_id: CategoryId,
    /// The name of the category.
    pub category_name: String,
    /// The icon of the category.
    pub category_icon: String,
    /// The most that should be spent in the month, zero or more.
    pub amount: f64,
    /// The month number, 1 is January.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
}

/// Check that `amount` is a finite number that is zero or more.
///
/// # Errors
/// Returns [Error::InvalidAmount] otherwise.
pub fn validate_budget_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

const BUDGET_COLUMNS: &str =
    "b.id, b.user_id, b.category_id, c.name, c.icon, b.amount, b.month, b.year";

/// Create the budget table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount REAL NOT NULL CHECK (amount >= 0),
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL,
            UNIQUE(user_id, category_id, month, year),
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Set the user's budget for a category in the month of `window`.
///
/// The amount of an existing budget for the same category and month is replaced.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is negative,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn upsert_budget(
    user_id: UserID,
    category_id: CategoryId,
    amount: f64,
    window: MonthWindow,
    connection: &Connection,
) -> Result<Budget, Error> {
    validate_budget_amount(amount)?;

    let id: BudgetId = connection
        .query_row(
            "INSERT INTO budget (user_id, category_id, amount, month, year)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, category_id, month, year) DO UPDATE SET amount = excluded.amount
             RETURNING id",
            params![
                user_id.as_i64(),
                category_id,
                amount,
                window.month_number(),
                window.year()
            ],
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::InvalidCategory(category_id)
            }
            error => error.into(),
        })?;

    get_budget(user_id, id, connection)
}

/// Retrieve a budget owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the user has no budget with `id`.
pub fn get_budget(user_id: UserID, id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget b
             INNER JOIN category c ON c.id = b.category_id
             WHERE b.id = ?1 AND b.user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_budget_row)
        .map_err(|error| error.into())
}

/// Retrieve the user's budgets for the month of `window`, ordered by category name.
pub fn get_budgets(
    user_id: UserID,
    window: MonthWindow,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget b
             INNER JOIN category c ON c.id = b.category_id
             WHERE b.user_id = ?1 AND b.month = ?2 AND b.year = ?3
             ORDER BY c.name ASC, b.id ASC"
        ))?
        .query_map(
            params![user_id.as_i64(), window.month_number(), window.year()],
            map_budget_row,
        )?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Delete a budget owned by `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingBudget] if the user has no budget with `id`.
pub fn delete_budget(user_id: UserID, id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget(id));
    }

    Ok(())
}

/// The user's total expenses per category for transactions dated inside `window`.
pub fn get_expense_totals_by_category(
    user_id: UserID,
    window: MonthWindow,
    connection: &Connection,
) -> Result<HashMap<CategoryId, f64>, Error> {
    connection
        .prepare(
            "SELECT category_id, SUM(amount) FROM \"transaction\"
             WHERE user_id = ?1 AND type = 'expense' AND date BETWEEN ?2 AND ?3
             GROUP BY category_id",
        )?
        .query_map(
            params![user_id.as_i64(), window.start, window.end],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        category_icon: row.get(4)?,
        amount: row.get(5)?,
        month: row.get(6)?,
        year: row.get(7)?,
    })
}
