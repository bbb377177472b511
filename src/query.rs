//! The two ways the HTTP layer reads transactions: through the feed, or from the store alone.

use std::sync::Mutex;

use crate::{
    Error, FeedMode,
    db::lock_store,
    feed::{ApiStatus, FeedFetcher},
    transaction::{StoredTransaction, TransactionRecord, TransactionStore, reconcile, sync_records},
};

/// The result of one fetch, reconcile and store cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// The whole feed, in the order the source returned it.
    pub records: Vec<TransactionRecord>,
    /// The feed records that were not stored before this cycle.
    pub new_records: Vec<TransactionRecord>,
    /// How many of `new_records` were written by this cycle.
    pub persisted_count: usize,
    /// How the fetch went.
    pub api_status: ApiStatus,
    /// Which kind of source the feed came from.
    pub mode: FeedMode,
}

/// Fetch the feed, store the transactions that have not been seen before and
/// report what happened.
///
/// The store lock is not held while the feed is fetched.
///
/// # Errors
/// Returns an [Error::FetchFailed] if the feed could not be read, in which case
/// the store has not been touched. Returns a store error if the set of known
/// IDs cannot be read.
pub async fn live_reconciliation_read<S>(
    feed: &FeedFetcher,
    store: &Mutex<S>,
) -> Result<SyncOutcome, Error>
where
    S: TransactionStore + Send,
{
    let result = feed.fetch(store).await?;

    if !result.api_status.success {
        tracing::error!(
            "Fetching the feed failed: {:?} {}",
            result.api_status.status_code,
            result.api_status.reason
        );
        return Err(Error::FetchFailed {
            status_code: result.api_status.status_code,
            reason: result.api_status.reason,
        });
    }

    let (new_records, persisted_count) = store_new_records(&result.records, store)?;

    tracing::info!(
        "Feed had {} transactions, {} new, {} stored.",
        result.records.len(),
        new_records.len(),
        persisted_count
    );

    Ok(SyncOutcome {
        records: result.records,
        new_records,
        persisted_count,
        api_status: result.api_status,
        mode: feed.mode(),
    })
}

fn store_new_records<S>(
    records: &[TransactionRecord],
    store: &Mutex<S>,
) -> Result<(Vec<TransactionRecord>, usize), Error>
where
    S: TransactionStore,
{
    let store = lock_store(store)?;

    let known_ids = store.known_ids()?;
    let new_records = reconcile(records, &known_ids);
    let persisted_count = sync_records(&new_records, &*store);

    Ok((new_records, persisted_count))
}

/// Every stored transaction, newest first.
///
/// # Errors
/// Returns an error if the store cannot be locked or read.
pub fn store_only_read<S>(store: &Mutex<S>) -> Result<Vec<StoredTransaction>, Error>
where
    S: TransactionStore,
{
    lock_store(store)?.scan_all()
}
