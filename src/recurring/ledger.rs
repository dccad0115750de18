//! The storage operations the recurring transaction engine depends on.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    month::MonthWindow,
    recurring::{RecurringId, RecurringTransaction, get_due_recurring_transactions},
    transaction::{NewTransaction, Transaction, create_transaction, find_generated_transaction},
};

/// Where recurring transactions are read from and generated transactions are written to.
pub trait RecurringLedger {
    /// The user's active recurring transactions that are due on `day` of the month.
    fn list_due_definitions(
        &self,
        user_id: UserID,
        day: u8,
    ) -> Result<Vec<RecurringTransaction>, Error>;

    /// The transaction `recurring_id` generated in the month of `window`, if any.
    fn find_generated(
        &self,
        user_id: UserID,
        recurring_id: RecurringId,
        window: MonthWindow,
    ) -> Result<Option<Transaction>, Error>;

    /// Store a transaction generated from `definition`.
    ///
    /// # Errors
    /// Returns [Error::AlreadyApplied] if a transaction was already generated for `period`.
    fn create_generated(
        &self,
        user_id: UserID,
        definition: &RecurringTransaction,
        description: &str,
        date: Date,
        period: &str,
    ) -> Result<Transaction, Error>;
}

/// A [RecurringLedger] backed by the application's SQLite database.
///
/// Callers hold the database lock for as long as the ledger lives, so an apply runs without
/// other requests interleaving.
#[derive(Debug, Clone, Copy)]
pub struct SQLiteRecurringLedger<'a> {
    connection: &'a Connection,
}

impl<'a> SQLiteRecurringLedger<'a> {
    /// Create a ledger that uses `connection`.
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }
}

impl RecurringLedger for SQLiteRecurringLedger<'_> {
    fn list_due_definitions(
        &self,
        user_id: UserID,
        day: u8,
    ) -> Result<Vec<RecurringTransaction>, Error> {
        get_due_recurring_transactions(user_id, day, self.connection)
    }

    fn find_generated(
        &self,
        user_id: UserID,
        recurring_id: RecurringId,
        window: MonthWindow,
    ) -> Result<Option<Transaction>, Error> {
        find_generated_transaction(user_id, recurring_id, window, self.connection)
    }

    fn create_generated(
        &self,
        user_id: UserID,
        definition: &RecurringTransaction,
        description: &str,
        date: Date,
        period: &str,
    ) -> Result<Transaction, Error> {
        let new_transaction =
            NewTransaction::new(definition.category_id, definition.amount, definition.kind, date)
                .description(description)
                .recurring(definition.id, period.to_owned());

        create_transaction(user_id, new_transaction, self.connection)
    }
}
