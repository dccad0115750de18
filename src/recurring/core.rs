//! Defines the recurring transaction model and its database queries.

use std::fmt::Display;

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    category::CategoryId,
    database_id::DatabaseId,
    transaction::{TransactionType, validate_positive_amount},
};

/// Database identifier for a recurring transaction.
pub type RecurringId = DatabaseId;

/// The day of the month a recurring transaction is applied on.
///
/// Restricted to 1 to 28 so that every month has the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DayOfMonth(u8);

impl DayOfMonth {
    /// The last day that exists in every month.
    pub const MAX: u8 = 28;

    /// Create a day of the month.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDayOfMonth] if `day` is not between 1 and 28.
    pub fn new(day: i64) -> Result<Self, Error> {
        match u8::try_from(day) {
            Ok(day) if (1..=Self::MAX).contains(&day) => Ok(Self(day)),
            _ => Err(Error::InvalidDayOfMonth(day)),
        }
    }

    /// The day as a number.
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Display for DayOfMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A template for a transaction that is created once per month on a fixed day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringTransaction {
    /// The ID of the recurring transaction.
    pub id: RecurringId,
    /// The user that owns the recurring transaction.
    pub user_id: UserID,
    /// The category of the generated transactions.
    pub category_id: CategoryId,
    /// The name of the category, used when the description is empty.
    pub category_name: String,
    /// The amount of the generated transactions, always positive.
    pub amount: f64,
    /// Whether the generated transactions are income or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The description, may be empty.
    pub description: String,
    /// The day of the month the transaction is due.
    pub day_of_month: DayOfMonth,
    /// Inactive recurring transactions are never applied.
    pub is_active: bool,
    /// When the recurring transaction was created.
    pub created_at: OffsetDateTime,
}

/// The fields needed to create a recurring transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringTransaction {
    /// The category of the generated transactions.
    pub category_id: CategoryId,
    /// The amount, must be positive.
    pub amount: f64,
    /// Whether the generated transactions are income or expenses.
    pub kind: TransactionType,
    /// The description, may be empty.
    pub description: String,
    /// The day of the month the transaction is due.
    pub day_of_month: DayOfMonth,
}

const RECURRING_COLUMNS: &str = "r.id, r.user_id, r.category_id, c.name, r.amount, r.type, \
                                 r.description, r.day_of_month, r.is_active, r.created_at";

/// Create the recurring transaction table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_recurring_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            description TEXT NOT NULL DEFAULT '',
            day_of_month INTEGER NOT NULL CHECK (day_of_month BETWEEN 1 AND 28),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_recurring_due
            ON recurring_transaction(user_id, is_active, day_of_month);",
    )?;

    Ok(())
}

/// Create an active recurring transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_recurring_transaction(
    user_id: UserID,
    new_recurring: NewRecurringTransaction,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    validate_positive_amount(new_recurring.amount)?;

    connection
        .execute(
            "INSERT INTO recurring_transaction
                (user_id, category_id, amount, type, description, day_of_month, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
            params![
                user_id.as_i64(),
                new_recurring.category_id,
                new_recurring.amount,
                new_recurring.kind,
                new_recurring.description,
                new_recurring.day_of_month.get(),
                OffsetDateTime::now_utc(),
            ],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::InvalidCategory(new_recurring.category_id)
            }
            error => error.into(),
        })?;

    get_recurring_transaction(user_id, connection.last_insert_rowid(), connection)
}

/// Retrieve a recurring transaction owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the user has no recurring transaction with `id`.
pub fn get_recurring_transaction(
    user_id: UserID,
    id: RecurringId,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction r
             INNER JOIN category c ON c.id = r.category_id
             WHERE r.id = ?1 AND r.user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_recurring_row)
        .map_err(|error| error.into())
}

/// Retrieve the user's recurring transactions, newest first.
pub fn get_recurring_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction r
             INNER JOIN category c ON c.id = r.category_id
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC, r.id DESC"
        ))?
        .query_map([user_id.as_i64()], map_recurring_row)?
        .map(|maybe_recurring| maybe_recurring.map_err(Error::from))
        .collect()
}

/// Retrieve the user's active recurring transactions that are due on `day` of the month.
pub fn get_due_recurring_transactions(
    user_id: UserID,
    day: u8,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction r
             INNER JOIN category c ON c.id = r.category_id
             WHERE r.user_id = ?1 AND r.is_active = 1 AND r.day_of_month = ?2
             ORDER BY r.id ASC"
        ))?
        .query_map(params![user_id.as_i64(), day], map_recurring_row)?
        .map(|maybe_recurring| maybe_recurring.map_err(Error::from))
        .collect()
}

/// Turn a recurring transaction on or off.
///
/// # Errors
/// Returns [Error::UpdateMissingRecurring] if the user has no recurring transaction with `id`.
pub fn set_recurring_active(
    user_id: UserID,
    id: RecurringId,
    is_active: bool,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let rows_affected = connection.execute(
        "UPDATE recurring_transaction SET is_active = ?1 WHERE id = ?2 AND user_id = ?3",
        params![is_active, id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRecurring);
    }

    get_recurring_transaction(user_id, id, connection)
}

/// Delete a recurring transaction owned by `user_id`.
///
/// Transactions it generated are kept and lose their link to it.
///
/// # Errors
/// Returns [Error::DeleteMissingRecurring] if the user has no recurring transaction with `id`.
pub fn delete_recurring_transaction(
    user_id: UserID,
    id: RecurringId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM recurring_transaction WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecurring);
    }

    Ok(())
}

fn map_recurring_row(row: &Row) -> Result<RecurringTransaction, rusqlite::Error> {
    let raw_day: i64 = row.get(7)?;
    let day_of_month = DayOfMonth::new(raw_day).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Integer,
            error.to_string().into(),
        )
    })?;

    Ok(RecurringTransaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        amount: row.get(4)?,
        kind: row.get(5)?,
        description: row.get(6)?,
        day_of_month,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
    })
}


#[cfg(test)]
mod recurring_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::User,
        category::{Category, CategoryName, NewCategory, create_category},
        test_utils::{create_test_user, get_test_connection},
        transaction::{NewTransaction, TransactionType, create_transaction, get_transaction},
    };

    use super::{
        DayOfMonth, NewRecurringTransaction, create_recurring_transaction,
        delete_recurring_transaction, get_due_recurring_transactions, get_recurring_transaction,
        get_recurring_transactions, set_recurring_active,
    };

    fn setup() -> (Connection, User, Category) {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);
        let category = create_category(
            NewCategory::new(CategoryName::new_unchecked("Tagihan"), TransactionType::Expense),
            &connection,
        )
        .unwrap();

        (connection, user, category)
    }

    fn new_recurring(category: &Category, day: i64) -> NewRecurringTransaction {
        NewRecurringTransaction {
            category_id: category.id,
            amount: 350_000.0,
            kind: TransactionType::Expense,
            description: "Internet".to_owned(),
            day_of_month: DayOfMonth::new(day).unwrap(),
        }
    }

    #[test]
    fn create_is_active_and_includes_category_name() {
        let (connection, user, category) = setup();

        let recurring =
            create_recurring_transaction(user.id, new_recurring(&category, 5), &connection)
                .unwrap();

        assert!(recurring.is_active);
        assert_eq!(recurring.category_name, "Tagihan");
        assert_eq!(recurring.day_of_month.get(), 5);
    }

    #[test]
    fn create_fails_on_invalid_category() {
        let (connection, user, category) = setup();
        let mut new = new_recurring(&category, 5);
        new.category_id = 999;

        let result = create_recurring_transaction(user.id, new, &connection);

        assert_eq!(result, Err(Error::InvalidCategory(999)));
    }

    #[test]
    fn list_is_newest_first() {
        let (connection, user, category) = setup();
        let first =
            create_recurring_transaction(user.id, new_recurring(&category, 5), &connection)
                .unwrap();
        let second =
            create_recurring_transaction(user.id, new_recurring(&category, 6), &connection)
                .unwrap();

        let ids: Vec<_> = get_recurring_transactions(user.id, &connection)
            .unwrap()
            .into_iter()
            .map(|recurring| recurring.id)
            .collect();

        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn due_only_returns_active_on_matching_day() {
        let (connection, user, category) = setup();
        let due = create_recurring_transaction(user.id, new_recurring(&category, 15), &connection)
            .unwrap();
        let inactive =
            create_recurring_transaction(user.id, new_recurring(&category, 15), &connection)
                .unwrap();
        set_recurring_active(user.id, inactive.id, false, &connection).unwrap();
        create_recurring_transaction(user.id, new_recurring(&category, 16), &connection).unwrap();

        let got = get_due_recurring_transactions(user.id, 15, &connection).unwrap();

        assert_eq!(got, vec![due]);
    }

    #[test]
    fn toggle_missing_recurring_fails() {
        let (connection, user, _) = setup();

        assert_eq!(
            set_recurring_active(user.id, 42, false, &connection),
            Err(Error::UpdateMissingRecurring)
        );
    }

    #[test]
    fn other_users_cannot_see_or_delete() {
        let (connection, user, category) = setup();
        let other = create_test_user("budi@example.com", &connection);
        let recurring =
            create_recurring_transaction(user.id, new_recurring(&category, 5), &connection)
                .unwrap();

        assert_eq!(
            get_recurring_transaction(other.id, recurring.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_recurring_transaction(other.id, recurring.id, &connection),
            Err(Error::DeleteMissingRecurring)
        );
    }

    #[test]
    fn delete_keeps_generated_transactions() {
        let (connection, user, category) = setup();
        let recurring =
            create_recurring_transaction(user.id, new_recurring(&category, 5), &connection)
                .unwrap();
        let generated = create_transaction(
            user.id,
            NewTransaction::new(
                category.id,
                350_000.0,
                TransactionType::Expense,
                date!(2025 - 01 - 05),
            )
            .recurring(recurring.id, "2025-01".to_owned()),
            &connection,
        )
        .unwrap();

        delete_recurring_transaction(user.id, recurring.id, &connection).unwrap();

        let kept = get_transaction(user.id, generated.id, &connection).unwrap();
        assert_eq!(kept.recurring_id, None);
        assert_eq!(kept.recurring_period.as_deref(), Some("2025-01"));
    }
}
