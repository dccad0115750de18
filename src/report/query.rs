//! Fetches the transactions that reports are built from.

use rusqlite::{Connection, Row, params};
use time::Date;

use crate::{Error, auth::UserID, category::CategoryId, transaction::TransactionType};

/// A transaction joined with the category fields that reports display.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTransaction {
    /// The transaction amount, always positive.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
    /// When the transaction happened.
    pub date: Date,
    /// The category of the transaction.
    pub category_id: CategoryId,
    /// The category name.
    pub category_name: String,
    /// The category icon.
    pub category_icon: String,
    /// The category color.
    pub category_color: String,
}

/// Retrieve the user's transactions dated between `start` and `end` inclusive, oldest first.
pub fn get_report_transactions(
    user_id: UserID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<ReportTransaction>, Error> {
    connection
        .prepare(
            "SELECT t.amount, t.type, t.date, t.category_id, c.name, c.icon, c.color
             FROM \"transaction\" t
             INNER JOIN category c ON c.id = t.category_id
             WHERE t.user_id = ?1 AND t.date BETWEEN ?2 AND ?3
             ORDER BY t.date ASC, t.id ASC",
        )?
        .query_map(params![user_id.as_i64(), start, end], map_report_row)?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

fn map_report_row(row: &Row) -> Result<ReportTransaction, rusqlite::Error> {
    Ok(ReportTransaction {
        amount: row.get(0)?,
        kind: row.get(1)?,
        date: row.get(2)?,
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        category_icon: row.get(5)?,
        category_color: row.get(6)?,
    })
}
