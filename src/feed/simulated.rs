//! A stand-in feed for demos and testing that always has something new.

use std::sync::{Arc, Mutex, PoisonError};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use time::{Duration, OffsetDateTime};
use uuid::Builder;

use crate::{
    Error,
    feed::{ApiStatus, FeedResult},
    timestamp::format_timestamp,
    transaction::{
        Note, Party, StoredTransaction, Title, TransactionRecord, TransactionStore, sync_records,
    },
};

const NOTES: [&str; 10] = [
    "Dinner",
    "Groceries",
    "Utilities",
    "Movie night",
    "Coffee",
    "Gas",
    "Rent",
    "Drinks",
    "Concert tickets",
    "Lunch",
];

const MOCK_SENDER_USERNAME: &str = "mockuser";
const MOCK_RECEIVER_USERNAME: &str = "mockreceiver";

/// Generates feed records from, and into, the store.
///
/// Every fetch adds exactly one record dated one minute after the newest
/// stored record. An empty store is first seeded with 5 to 10 records from the
/// last 10 days.
///
/// The generator is seedable so a given seed replays the same sequence of
/// records.
#[derive(Debug, Clone)]
pub struct SimulatedFeed {
    rng: Arc<Mutex<StdRng>>,
}

impl SimulatedFeed {
    /// How many of the newest stored records each fetch returns.
    pub const WINDOW: usize = 15;

    /// Create a simulated feed, seeded with `seed` or from the OS when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Produce the next simulated feed, writing its records to `store`.
    ///
    /// The returned records are the store's newest records, newest first,
    /// headed by the record generated by this call. A generated record that
    /// cannot be stored is left out, so the feed never shows a transaction the
    /// store does not have.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn fetch<S>(&self, store: &S) -> Result<FeedResult, Error>
    where
        S: TransactionStore + ?Sized,
    {
        // The RNG holds no invariants a panic could break.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let now = OffsetDateTime::now_utc();
        let now = now - Duration::nanoseconds(i64::from(now.nanosecond()));

        let mut records: Vec<TransactionRecord> = store
            .scan_recent(Self::WINDOW)?
            .iter()
            .map(record_from_stored)
            .collect();

        if records.is_empty() {
            tracing::info!("No stored transactions found, generating an initial set.");
            let initial_records = generate_initial_records(&mut *rng, now);
            let persisted_count = sync_records(&initial_records, store);
            if persisted_count != initial_records.len() {
                tracing::warn!(
                    "Only {persisted_count} of {} generated transactions were stored.",
                    initial_records.len()
                );
            }

            records = store
                .scan_recent(Self::WINDOW)?
                .iter()
                .map(record_from_stored)
                .collect();
        } else {
            tracing::debug!("Found {} stored transactions.", records.len());
        }

        records.sort_by_key(|record| std::cmp::Reverse(record.occurred_at_timestamp()));

        let occurred_at = match records
            .iter()
            .filter_map(TransactionRecord::occurred_at_timestamp)
            .max()
        {
            Some(newest) => newest + Duration::minutes(1),
            None => now - Duration::minutes(rng.gen_range(1..=60)),
        };
        let note = NOTES.choose(&mut *rng).copied().unwrap_or("Payment");
        let new_record = generate_record(&mut *rng, occurred_at, note);

        if sync_records(std::slice::from_ref(&new_record), store) == 1 {
            tracing::info!(
                "Added simulated transaction: {} ({})",
                note,
                new_record.amount.as_deref().unwrap_or_default()
            );
            records.insert(0, new_record);
        } else {
            tracing::warn!(
                "Could not store simulated transaction {}, leaving it out of the feed.",
                new_record.id.as_deref().unwrap_or_default()
            );
        }

        Ok(FeedResult {
            records,
            api_status: ApiStatus::ok(),
        })
    }
}

fn generate_initial_records<R>(rng: &mut R, now: OffsetDateTime) -> Vec<TransactionRecord>
where
    R: Rng,
{
    let count = rng.gen_range(5..=10);

    (1..=count)
        .map(|number| {
            let occurred_at = now - Duration::days(rng.gen_range(0..=10));
            generate_record(&mut *rng, occurred_at, &format!("Mock Transaction {number}"))
        })
        .collect()
}

fn generate_record<R>(rng: &mut R, occurred_at: OffsetDateTime, note: &str) -> TransactionRecord
where
    R: Rng,
{
    let incoming = rng.gen_bool(0.5);
    let cents: u32 = rng.gen_range(100..=10_000);
    let sign = if incoming { '+' } else { '-' };

    let mut id_bytes = [0u8; 16];
    rng.fill(&mut id_bytes);
    let id = Builder::from_random_bytes(id_bytes).into_uuid();

    let (sender, receiver) = if incoming {
        ("Mock User", "You")
    } else {
        ("You", "Mock Receiver")
    };

    TransactionRecord {
        id: Some(id.to_string()),
        occurred_at: Some(format_timestamp(occurred_at)),
        amount: Some(format!("{sign} ${}.{:02}", cents / 100, cents % 100)),
        kind: Some("payment".to_owned()),
        note: Some(Note::Content {
            content: Some(note.to_owned()),
        }),
        title: Some(mock_title(Some(sender.to_owned()), Some(receiver.to_owned()))),
        ..Default::default()
    }
}

/// Rebuild the feed shape of a stored transaction.
fn record_from_stored(transaction: &StoredTransaction) -> TransactionRecord {
    TransactionRecord {
        id: Some(transaction.id.clone()),
        occurred_at: transaction.transaction_date.clone(),
        amount: transaction.amount.clone(),
        kind: transaction.kind.clone(),
        note: Some(Note::Content {
            content: transaction.note.clone(),
        }),
        title: Some(mock_title(
            transaction.sender.clone(),
            transaction.receiver.clone(),
        )),
        ..Default::default()
    }
}

fn mock_title(sender: Option<String>, receiver: Option<String>) -> Title {
    Title {
        sender: Some(Party {
            username: Some(MOCK_SENDER_USERNAME.to_owned()),
            display_name: sender,
            ..Default::default()
        }),
        receiver: Some(Party {
            username: Some(MOCK_RECEIVER_USERNAME.to_owned()),
            display_name: receiver,
            ..Default::default()
        }),
        ..Default::default()
    }
}
