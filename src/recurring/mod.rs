//! Recurring transactions and the engine that applies them once per month.

mod apply;
mod core;
mod endpoints;
mod ledger;

pub use apply::{ApplyResult, apply_due_recurring};
pub use core::{
    DayOfMonth, NewRecurringTransaction, RecurringId, RecurringTransaction,
    create_recurring_transaction, create_recurring_transaction_table,
    delete_recurring_transaction, get_due_recurring_transactions, get_recurring_transactions,
    set_recurring_active,
};
pub use endpoints::{
    apply_recurring_endpoint, create_recurring_endpoint, delete_recurring_endpoint,
    get_recurring_endpoint, toggle_recurring_endpoint,
};
pub use ledger::{RecurringLedger, SQLiteRecurringLedger};
