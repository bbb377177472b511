//! Writes newly seen feed records to the store.

use crate::transaction::{TransactionRecord, TransactionStore};

/// Store each record in `candidates` that is not stored yet, in order.
///
/// Every record is checked against the store again just before it is written,
/// so records stored since reconciliation (or repeated within `candidates`)
/// are skipped. A record that cannot be written is logged and the rest of the
/// batch carries on.
///
/// Returns the number of records actually inserted. Skipped and failed records
/// are not counted, so a result smaller than `candidates.len()` means some
/// records were skipped or failed.
pub fn sync_records<S>(candidates: &[TransactionRecord], store: &S) -> usize
where
    S: TransactionStore + ?Sized,
{
    let mut inserted = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for record in candidates {
        let transaction = match record.to_new_transaction() {
            Ok(transaction) => transaction,
            Err(error) => {
                tracing::warn!("Not storing transaction record {record:?}: {error}");
                failed += 1;
                continue;
            }
        };

        match store.exists(&transaction.id) {
            Ok(true) => {
                tracing::debug!("Transaction {} is already stored, skipping.", transaction.id);
                skipped += 1;
                continue;
            }
            Ok(false) => {}
            Err(error) => {
                tracing::warn!("Could not check whether transaction {} exists: {error}", transaction.id);
                failed += 1;
                continue;
            }
        }

        match store.insert_if_absent(&transaction) {
            Ok(true) => inserted += 1,
            Ok(false) => {
                tracing::debug!(
                    "Transaction {} was stored by someone else in the meantime, skipping.",
                    transaction.id
                );
                skipped += 1;
            }
            Err(error) => {
                tracing::warn!("Could not store transaction {}: {error}", transaction.id);
                failed += 1;
            }
        }
    }

    tracing::info!(
        "Stored {inserted} of {} new transactions ({skipped} skipped, {failed} failed).",
        candidates.len()
    );

    inserted
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        transaction::{
            NewTransaction, StoredTransaction, TransactionRecord, TransactionStore, sync_records,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn record(id: &str) -> TransactionRecord {
        TransactionRecord {
            id: Some(id.to_owned()),
            occurred_at: Some("2025-04-05T19:00:41Z".to_owned()),
            amount: Some("+ $10.00".to_owned()),
            ..Default::default()
        }
    }

    /// A store that refuses to insert the given IDs.
    struct FlakyStore {
        inner: Connection,
        failing_ids: HashSet<String>,
    }

    impl TransactionStore for FlakyStore {
        fn exists(&self, id: &str) -> Result<bool, Error> {
            self.inner.exists(id)
        }

        fn insert_if_absent(&self, transaction: &NewTransaction) -> Result<bool, Error> {
            if self.failing_ids.contains(&transaction.id) {
                return Err(Error::SqlError(rusqlite::Error::InvalidQuery));
            }

            self.inner.insert_if_absent(transaction)
        }

        fn scan_all(&self) -> Result<Vec<StoredTransaction>, Error> {
            self.inner.scan_all()
        }

        fn scan_recent(&self, limit: usize) -> Result<Vec<StoredTransaction>, Error> {
            self.inner.scan_recent(limit)
        }

        fn known_ids(&self) -> Result<HashSet<String>, Error> {
            self.inner.known_ids()
        }
    }

    #[test]
    fn sync_is_idempotent() {
        let conn = get_test_connection();
        let candidates = vec![record("a"), record("b"), record("c")];

        let first = sync_records(&candidates, &conn);
        let state_after_first = conn.scan_all().unwrap();
        let second = sync_records(&candidates, &conn);

        assert_eq!(first, 3);
        assert_eq!(second, 0);
        assert_eq!(conn.scan_all().unwrap(), state_after_first);
    }

    #[test]
    fn one_failed_insert_does_not_abort_the_batch() {
        let store = FlakyStore {
            inner: get_test_connection(),
            failing_ids: HashSet::from(["2".to_owned()]),
        };
        let candidates = vec![record("1"), record("2"), record("3")];

        let persisted_count = sync_records(&candidates, &store);

        assert_eq!(persisted_count, 2);
        assert!(store.exists("1").unwrap());
        assert!(!store.exists("2").unwrap());
        assert!(store.exists("3").unwrap());
    }

    #[test]
    fn repeated_ids_are_written_once() {
        let conn = get_test_connection();
        let candidates = vec![record("a"), record("a")];

        let persisted_count = sync_records(&candidates, &conn);

        assert_eq!(persisted_count, 1);
        assert_eq!(conn.known_ids().unwrap().len(), 1);
    }

    #[test]
    fn records_without_ids_never_reach_the_store() {
        let conn = get_test_connection();
        let candidates = vec![TransactionRecord::default(), record("a")];

        let persisted_count = sync_records(&candidates, &conn);

        assert_eq!(persisted_count, 1);
        assert_eq!(conn.scan_all().unwrap().len(), 1);
    }

    #[test]
    fn already_stored_records_are_skipped() {
        let conn = get_test_connection();
        sync_records(&[record("a")], &conn);

        let persisted_count = sync_records(&[record("a"), record("b")], &conn);

        assert_eq!(persisted_count, 1);
    }
}
