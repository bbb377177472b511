//! Sets up the application database.

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{Error, transaction::create_transaction_table};

/// Create the application's tables if they do not exist yet.
///
/// Safe to call on every start-up.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Open the database at `path` and make sure its tables exist.
///
/// # Errors
/// Returns an [Error::StoreUnavailable] if the file cannot be opened, or an
/// [Error::SqlError] if the tables cannot be created.
pub fn open(path: &str) -> Result<Connection, Error> {
    let connection = Connection::open(path)
        .map_err(|error| Error::StoreUnavailable(format!("could not open {path}: {error}")))?;

    initialize(&connection)?;

    Ok(connection)
}

/// Acquire the lock on the shared store.
///
/// # Errors
/// Returns an [Error::DatabaseLockError] if the lock is poisoned.
pub(crate) fn lock_store<S>(store: &Mutex<S>) -> Result<MutexGuard<'_, S>, Error> {
    store.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
