//! Applies due recurring transactions, creating at most one transaction per recurring
//! transaction per calendar month.

use serde::Serialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    month::MonthWindow,
    recurring::{RecurringLedger, RecurringTransaction},
};

/// Prefix of the description of generated transactions.
pub const AUTOMATIC_PREFIX: &str = "[Automatic]";

/// The outcome of applying a user's due recurring transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyResult {
    /// Number of transactions created.
    pub created_count: usize,
    /// Number of due recurring transactions that were already applied this month.
    pub skipped_count: usize,
    /// Number of due recurring transactions that could not be applied due to an error.
    pub failed_count: usize,
    /// A summary for the user.
    pub message: String,
}

impl ApplyResult {
    fn nothing_due() -> Self {
        Self {
            created_count: 0,
            skipped_count: 0,
            failed_count: 0,
            message: "No recurring transactions are due today".to_owned(),
        }
    }

    fn from_counts(created_count: usize, skipped_count: usize, failed_count: usize) -> Self {
        let mut message = format!("{created_count} recurring transaction(s) created");

        if skipped_count > 0 {
            message.push_str(&format!(", {skipped_count} already applied this month"));
        }

        if failed_count > 0 {
            message.push_str(&format!(", {failed_count} failed"));
        }

        Self {
            created_count,
            skipped_count,
            failed_count,
            message,
        }
    }
}

enum ApplyOutcome {
    Created,
    Skipped,
}

/// The description given to transactions generated from `definition`.
///
/// The category name stands in for an empty description.
pub fn automatic_description(definition: &RecurringTransaction) -> String {
    let description = definition.description.trim();
    let label = if description.is_empty() {
        definition.category_name.as_str()
    } else {
        description
    };

    format!("{AUTOMATIC_PREFIX} {label}")
}

/// Create a transaction dated `today` for each of the user's active recurring transactions that
/// are due on today's day of the month, unless one was already created this month.
///
/// Each recurring transaction is handled on its own: an error for one is logged and counted in
/// [ApplyResult::failed_count] and the rest are still applied.
///
/// # Errors
/// Returns an error only if the due recurring transactions could not be fetched.
pub fn apply_due_recurring(
    ledger: &impl RecurringLedger,
    user_id: UserID,
    today: Date,
) -> Result<ApplyResult, Error> {
    let due = ledger.list_due_definitions(user_id, today.day())?;

    if due.is_empty() {
        return Ok(ApplyResult::nothing_due());
    }

    let window = MonthWindow::containing(today);
    let period = window.period_key();

    let mut created_count = 0;
    let mut skipped_count = 0;
    let mut failed_count = 0;

    for definition in &due {
        match apply_one(ledger, user_id, definition, today, window, &period) {
            Ok(ApplyOutcome::Created) => created_count += 1,
            Ok(ApplyOutcome::Skipped) => skipped_count += 1,
            Err(error) => {
                tracing::error!(
                    "Could not apply recurring transaction {} for user {user_id} in {period}: {error}",
                    definition.id
                );
                failed_count += 1;
            }
        }
    }

    Ok(ApplyResult::from_counts(
        created_count,
        skipped_count,
        failed_count,
    ))
}

fn apply_one(
    ledger: &impl RecurringLedger,
    user_id: UserID,
    definition: &RecurringTransaction,
    today: Date,
    window: MonthWindow,
    period: &str,
) -> Result<ApplyOutcome, Error> {
    if ledger
        .find_generated(user_id, definition.id, window)?
        .is_some()
    {
        return Ok(ApplyOutcome::Skipped);
    }

    let description = automatic_description(definition);

    match ledger.create_generated(user_id, definition, &description, today, period) {
        Ok(_) => Ok(ApplyOutcome::Created),
        // Another apply created the transaction after the check above.
        Err(Error::AlreadyApplied) => Ok(ApplyOutcome::Skipped),
        Err(error) => Err(error),
    }
}


#[cfg(test)]
mod sqlite_apply_tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        auth::User,
        category::{Category, CategoryName, NewCategory, create_category},
        recurring::{
            DayOfMonth, NewRecurringTransaction, RecurringTransaction, SQLiteRecurringLedger,
            create_recurring_transaction, set_recurring_active,
        },
        test_utils::{create_test_user, get_test_connection},
        transaction::{TransactionType, delete_transaction, get_transactions},
    };

    use super::{ApplyResult, apply_due_recurring};

    fn setup() -> (Connection, User, Category) {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);
        let category = create_category(
            NewCategory::new(CategoryName::new_unchecked("Gaji"), TransactionType::Income),
            &connection,
        )
        .unwrap();

        (connection, user, category)
    }

    fn create_definition(
        connection: &Connection,
        user: &User,
        category: &Category,
        day: i64,
        description: &str,
    ) -> RecurringTransaction {
        create_recurring_transaction(
            user.id,
            NewRecurringTransaction {
                category_id: category.id,
                amount: 5_000_000.0,
                kind: TransactionType::Income,
                description: description.to_owned(),
                day_of_month: DayOfMonth::new(day).unwrap(),
            },
            connection,
        )
        .unwrap()
    }

    fn apply(connection: &Connection, user: &User, today: Date) -> ApplyResult {
        apply_due_recurring(&SQLiteRecurringLedger::new(connection), user.id, today).unwrap()
    }

    #[test]
    fn salary_is_created_once_per_month() {
        let (connection, user, category) = setup();
        let definition = create_definition(&connection, &user, &category, 15, "");

        let first = apply(&connection, &user, date!(2025 - 01 - 15));
        let second = apply(&connection, &user, date!(2025 - 01 - 15));

        assert_eq!(first.created_count, 1);
        assert!(first.message.contains('1'), "got {}", first.message);
        assert_eq!(second.created_count, 0);
        assert_eq!(second.skipped_count, 1);

        let transactions = get_transactions(user.id, None, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        let generated = &transactions[0];
        assert_eq!(generated.description, "[Automatic] Gaji");
        assert_eq!(generated.amount, 5_000_000.0);
        assert_eq!(generated.kind, TransactionType::Income);
        assert_eq!(generated.date, date!(2025 - 01 - 15));
        assert_eq!(generated.recurring_id, Some(definition.id));
        assert_eq!(generated.recurring_period.as_deref(), Some("2025-01"));
    }

    #[test]
    fn only_matching_day_is_applied() {
        let (connection, user, category) = setup();
        create_definition(&connection, &user, &category, 15, "Gaji");

        let day_14 = apply(&connection, &user, date!(2025 - 01 - 14));
        let day_16 = apply(&connection, &user, date!(2025 - 01 - 16));
        let day_15 = apply(&connection, &user, date!(2025 - 01 - 15));

        assert_eq!(day_14, ApplyResult::nothing_due());
        assert_eq!(day_14.message, "No recurring transactions are due today");
        assert_eq!(day_16.created_count, 0);
        assert_eq!(day_15.created_count, 1);
    }

    #[test]
    fn inactive_definitions_are_not_applied() {
        let (connection, user, category) = setup();
        let definition = create_definition(&connection, &user, &category, 15, "Gaji");
        set_recurring_active(user.id, definition.id, false, &connection).unwrap();

        let result = apply(&connection, &user, date!(2025 - 01 - 15));

        assert_eq!(result.created_count, 0);
        assert_eq!(get_transactions(user.id, None, &connection), Ok(vec![]));
    }

    #[test]
    fn each_month_gets_its_own_transaction() {
        let (connection, user, category) = setup();
        create_definition(&connection, &user, &category, 15, "Gaji");

        apply(&connection, &user, date!(2025 - 01 - 15));
        apply(&connection, &user, date!(2025 - 02 - 15));

        let transactions = get_transactions(user.id, None, &connection).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(
            transactions[0].recurring_period.as_deref(),
            Some("2025-02")
        );
        assert_eq!(
            transactions[1].recurring_period.as_deref(),
            Some("2025-01")
        );
    }

    #[test]
    fn year_boundary_is_a_new_month() {
        let (connection, user, category) = setup();
        create_definition(&connection, &user, &category, 1, "Sewa");

        apply(&connection, &user, date!(2024 - 12 - 01));
        let result = apply(&connection, &user, date!(2025 - 01 - 01));

        assert_eq!(result.created_count, 1);
    }

    #[test]
    fn definitions_of_other_users_are_ignored() {
        let (connection, user, category) = setup();
        let other = create_test_user("budi@example.com", &connection);
        create_definition(&connection, &other, &category, 15, "Gaji");

        let result = apply(&connection, &user, date!(2025 - 01 - 15));

        assert_eq!(result.created_count, 0);
        assert_eq!(get_transactions(other.id, None, &connection), Ok(vec![]));
    }

    #[test]
    fn manual_transaction_with_same_description_does_not_block() {
        let (connection, user, category) = setup();
        create_definition(&connection, &user, &category, 15, "Gaji");
        crate::transaction::create_transaction(
            user.id,
            crate::transaction::NewTransaction::new(
                category.id,
                1.0,
                TransactionType::Income,
                date!(2025 - 01 - 02),
            )
            .description("[Automatic] Gaji"),
            &connection,
        )
        .unwrap();

        let result = apply(&connection, &user, date!(2025 - 01 - 15));

        assert_eq!(result.created_count, 1);
    }

    #[test]
    fn deleted_generated_transaction_is_created_again() {
        let (connection, user, category) = setup();
        create_definition(&connection, &user, &category, 15, "Gaji");
        apply(&connection, &user, date!(2025 - 01 - 15));
        let generated = get_transactions(user.id, None, &connection).unwrap()[0].id;
        delete_transaction(user.id, generated, &connection).unwrap();

        let result = apply(&connection, &user, date!(2025 - 01 - 15));

        assert_eq!(result.created_count, 1);
    }
}

#[cfg(test)]
mod ledger_failure_tests {
    use std::cell::RefCell;

    use time::{Date, OffsetDateTime, macros::date};

    use crate::{
        Error,
        auth::UserID,
        month::MonthWindow,
        recurring::{DayOfMonth, RecurringId, RecurringLedger, RecurringTransaction},
        transaction::{Transaction, TransactionType},
    };

    use super::apply_due_recurring;

    /// Keeps generated transactions in memory and fails on request.
    #[derive(Default)]
    struct FakeLedger {
        definitions: Vec<RecurringTransaction>,
        generated: RefCell<Vec<Transaction>>,
        fail_to_create: Vec<RecurringId>,
        lose_race_for: Vec<RecurringId>,
        fail_to_list: bool,
    }

    impl RecurringLedger for FakeLedger {
        fn list_due_definitions(
            &self,
            _user_id: UserID,
            day: u8,
        ) -> Result<Vec<RecurringTransaction>, Error> {
            if self.fail_to_list {
                return Err(Error::DatabaseLockError);
            }

            Ok(self
                .definitions
                .iter()
                .filter(|definition| definition.is_active && definition.day_of_month.get() == day)
                .cloned()
                .collect())
        }

        fn find_generated(
            &self,
            _user_id: UserID,
            recurring_id: RecurringId,
            window: MonthWindow,
        ) -> Result<Option<Transaction>, Error> {
            Ok(self
                .generated
                .borrow()
                .iter()
                .find(|transaction| {
                    transaction.recurring_id == Some(recurring_id)
                        && window.contains(transaction.date)
                })
                .cloned())
        }

        fn create_generated(
            &self,
            user_id: UserID,
            definition: &RecurringTransaction,
            description: &str,
            date: Date,
            period: &str,
        ) -> Result<Transaction, Error> {
            if self.fail_to_create.contains(&definition.id) {
                return Err(Error::SqlError(rusqlite::Error::InvalidQuery));
            }

            if self.lose_race_for.contains(&definition.id) {
                return Err(Error::AlreadyApplied);
            }

            let transaction = Transaction {
                id: self.generated.borrow().len() as i64 + 1,
                user_id,
                category_id: definition.category_id,
                amount: definition.amount,
                kind: definition.kind,
                description: description.to_owned(),
                date,
                recurring_id: Some(definition.id),
                recurring_period: Some(period.to_owned()),
            };
            self.generated.borrow_mut().push(transaction.clone());

            Ok(transaction)
        }
    }

    fn definition(id: RecurringId, day: i64) -> RecurringTransaction {
        RecurringTransaction {
            id,
            user_id: UserID::new(1),
            category_id: 1,
            category_name: "Tagihan".to_owned(),
            amount: 100.0,
            kind: TransactionType::Expense,
            description: format!("Tagihan {id}"),
            day_of_month: DayOfMonth::new(day).unwrap(),
            is_active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn failure_does_not_block_other_definitions() {
        let ledger = FakeLedger {
            definitions: vec![definition(1, 10), definition(2, 10), definition(3, 10)],
            fail_to_create: vec![2],
            ..Default::default()
        };

        let result = apply_due_recurring(&ledger, UserID::new(1), date!(2025 - 06 - 10)).unwrap();

        assert_eq!(result.created_count, 2);
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.skipped_count, 0);
        assert!(result.message.contains("1 failed"), "got {}", result.message);
        let generated_ids: Vec<_> = ledger
            .generated
            .borrow()
            .iter()
            .map(|transaction| transaction.recurring_id)
            .collect();
        assert_eq!(generated_ids, vec![Some(1), Some(3)]);
    }

    #[test]
    fn losing_a_race_counts_as_skipped() {
        let ledger = FakeLedger {
            definitions: vec![definition(1, 10)],
            lose_race_for: vec![1],
            ..Default::default()
        };

        let result = apply_due_recurring(&ledger, UserID::new(1), date!(2025 - 06 - 10)).unwrap();

        assert_eq!(result.created_count, 0);
        assert_eq!(result.skipped_count, 1);
        assert_eq!(result.failed_count, 0);
    }

    #[test]
    fn listing_failure_is_an_error() {
        let ledger = FakeLedger {
            fail_to_list: true,
            ..Default::default()
        };

        let result = apply_due_recurring(&ledger, UserID::new(1), date!(2025 - 06 - 10));

        assert_eq!(result, Err(Error::DatabaseLockError));
    }

    #[test]
    fn repeated_apply_is_idempotent() {
        let ledger = FakeLedger {
            definitions: vec![definition(1, 28), definition(2, 28)],
            ..Default::default()
        };

        let first = apply_due_recurring(&ledger, UserID::new(1), date!(2025 - 02 - 28)).unwrap();
        let second = apply_due_recurring(&ledger, UserID::new(1), date!(2025 - 02 - 28)).unwrap();

        assert_eq!(first.created_count, 2);
        assert_eq!(second.created_count, 0);
        assert_eq!(second.skipped_count, 2);
        assert_eq!(ledger.generated.borrow().len(), 2);
    }
}
