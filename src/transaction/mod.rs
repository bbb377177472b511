//! Transactions from the payment service's feed.
//!
//! This module contains the sync engine's core:
//! - The `TransactionRecord` read from the feed and the `StoredTransaction` kept in the store
//! - The `TransactionStore` contract and its SQLite implementation
//! - Reconciliation of a feed against the stored IDs, and the writer that stores new records

mod core;
mod db;
mod reconcile;
mod sync;

pub use core::{NewTransaction, Note, Party, Payload, StoredTransaction, Title, TransactionRecord};
pub use db::{TransactionStore, create_transaction_table};
pub use reconcile::reconcile;
pub use sync::sync_records;

#[cfg(test)]
pub use db::count_transactions;
