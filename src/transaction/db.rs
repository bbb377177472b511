//! Database operations for stored transactions and the store contract the sync engine relies on.

use std::collections::HashSet;

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    transaction::{NewTransaction, StoredTransaction},
};

/// The operations the sync engine needs from a durable transaction store.
///
/// Implementations must make [TransactionStore::insert_if_absent] atomic per
/// ID: when two callers race to insert the same ID, at most one of them may
/// see `true`.
pub trait TransactionStore {
    /// Whether a transaction with `id` is already stored.
    fn exists(&self, id: &str) -> Result<bool, Error>;

    /// Insert `transaction` unless its ID is already stored.
    ///
    /// Returns `true` iff a row was written.
    fn insert_if_absent(&self, transaction: &NewTransaction) -> Result<bool, Error>;

    /// Every stored transaction, newest first.
    fn scan_all(&self) -> Result<Vec<StoredTransaction>, Error>;

    /// The `limit` newest stored transactions, newest first.
    fn scan_recent(&self, limit: usize) -> Result<Vec<StoredTransaction>, Error>;

    /// The IDs of every stored transaction.
    fn known_ids(&self) -> Result<HashSet<String>, Error>;
}

impl TransactionStore for Connection {
    fn exists(&self, id: &str) -> Result<bool, Error> {
        transaction_exists(id, self)
    }

    fn insert_if_absent(&self, transaction: &NewTransaction) -> Result<bool, Error> {
        insert_transaction_if_absent(transaction, self)
    }

    fn scan_all(&self) -> Result<Vec<StoredTransaction>, Error> {
        get_all_transactions(self)
    }

    fn scan_recent(&self, limit: usize) -> Result<Vec<StoredTransaction>, Error> {
        get_recent_transactions(limit, self)
    }

    fn known_ids(&self) -> Result<HashSet<String>, Error> {
        get_transaction_ids(self)
    }
}

/// Check whether a transaction with `id` exists.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn transaction_exists(id: &str, connection: &Connection) -> Result<bool, Error> {
    connection
        .prepare("SELECT EXISTS(SELECT 1 FROM feed_transaction WHERE id = :id)")?
        .query_row(&[(":id", id)], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Insert a transaction, doing nothing if the ID already exists.
///
/// The check and the write happen in one statement, so concurrent callers
/// cannot both insert the same ID.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn insert_transaction_if_absent(
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "INSERT INTO feed_transaction
            (id, transaction_date, note, amount, type, sender, receiver, added_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO NOTHING",
        (
            &transaction.id,
            &transaction.transaction_date,
            &transaction.note,
            &transaction.amount,
            &transaction.kind,
            &transaction.sender,
            &transaction.receiver,
            OffsetDateTime::now_utc(),
        ),
    )?;

    Ok(rows_affected == 1)
}

/// Retrieve every transaction ordered by transaction date, newest first.
///
/// Dates are compared as points in time, not as text. Transactions without a
/// readable date come last.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<StoredTransaction>, Error> {
    connection
        .prepare(
            "SELECT id, transaction_date, note, amount, type, sender, receiver, added_at
             FROM feed_transaction
             ORDER BY julianday(transaction_date) DESC, added_at DESC",
        )?
        .query_map([], map_stored_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the `limit` most recent transactions, newest first.
pub fn get_recent_transactions(
    limit: usize,
    connection: &Connection,
) -> Result<Vec<StoredTransaction>, Error> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    connection
        .prepare(
            "SELECT id, transaction_date, note, amount, type, sender, receiver, added_at
             FROM feed_transaction
             ORDER BY julianday(transaction_date) DESC, added_at DESC
             LIMIT :limit",
        )?
        .query_map(&[(":limit", &limit)], map_stored_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the set of stored transaction IDs.
pub fn get_transaction_ids(connection: &Connection) -> Result<HashSet<String>, Error> {
    connection
        .prepare("SELECT id FROM feed_transaction")?
        .query_map([], |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of stored transactions.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM feed_transaction;", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS feed_transaction (
            id TEXT PRIMARY KEY,
            transaction_date TEXT,
            note TEXT,
            amount TEXT,
            type TEXT,
            sender TEXT,
            receiver TEXT,
            added_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_feed_transaction_julianday
            ON feed_transaction(julianday(transaction_date));",
    )?;

    Ok(())
}

/// Map a database row to a [StoredTransaction].
pub fn map_stored_transaction_row(row: &Row) -> Result<StoredTransaction, rusqlite::Error> {
    Ok(StoredTransaction {
        id: row.get(0)?,
        transaction_date: row.get(1)?,
        note: row.get(2)?,
        amount: row.get(3)?,
        kind: row.get(4)?,
        sender: row.get(5)?,
        receiver: row.get(6)?,
        added_at: row.get(7)?,
    })
}
