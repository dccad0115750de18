//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for the transaction API

mod core;
mod endpoints;

pub use core::{
    NewTransaction, Transaction, TransactionId, TransactionType, create_transaction,
    create_transaction_table, delete_transaction, find_generated_transaction, get_transactions,
    update_transaction, validate_positive_amount,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transactions_endpoint,
    update_transaction_endpoint,
};

#[cfg(test)]
pub use core::{count_transactions, get_transaction};
