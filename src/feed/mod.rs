//! Fetching the transaction feed, either from the payment service or from a simulated source.

mod live;
mod simulated;

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

pub use live::LiveFeed;
pub use simulated::SimulatedFeed;

use crate::{
    Config, Error, FeedMode,
    db::lock_store,
    transaction::{TransactionRecord, TransactionStore},
};

/// How a fetch went, in the shape API clients receive it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
    /// The HTTP status code of the feed response, if one was received.
    pub status_code: Option<u16>,
    /// The reason phrase, or the error text when the fetch failed.
    pub reason: String,
    /// Whether the feed was read successfully.
    pub success: bool,
}

impl ApiStatus {
    /// A successful fetch.
    pub fn ok() -> Self {
        Self {
            status_code: Some(200),
            reason: "OK".to_owned(),
            success: true,
        }
    }

    /// A failed fetch.
    pub fn failed(status_code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            status_code,
            reason: reason.into(),
            success: false,
        }
    }
}

/// The outcome of one fetch: the feed in the source's own order and its status.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedResult {
    /// The transactions in the feed.
    pub records: Vec<TransactionRecord>,
    /// How the fetch went.
    pub api_status: ApiStatus,
}

impl FeedResult {
    /// A failed fetch, which never carries records.
    pub fn failed(status_code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            api_status: ApiStatus::failed(status_code, reason),
        }
    }
}

/// Where the feed comes from. Chosen once from the configuration.
#[derive(Debug, Clone)]
pub enum FeedFetcher {
    /// The payment service's feed endpoint.
    Live(LiveFeed),
    /// Generated transactions that guarantee at least one new transaction per fetch.
    Simulated(SimulatedFeed),
}

impl FeedFetcher {
    /// Build the fetcher selected by `config`.
    ///
    /// # Errors
    /// Returns an [Error::InvalidConfig] if the HTTP client for the live feed
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        match config.feed_mode() {
            FeedMode::Live => Ok(Self::Live(LiveFeed::new(
                &config.feed_url,
                config.feed_cookie.clone(),
                std::time::Duration::from_secs(config.feed_timeout_secs),
            )?)),
            FeedMode::Simulated => Ok(Self::Simulated(SimulatedFeed::new(config.mock_seed))),
        }
    }

    /// Which kind of source this is.
    pub fn mode(&self) -> FeedMode {
        match self {
            Self::Live(_) => FeedMode::Live,
            Self::Simulated(_) => FeedMode::Simulated,
        }
    }

    /// Fetch the current feed.
    ///
    /// A live fetch never touches `store` and reports every failure through
    /// [FeedResult::api_status]. A simulated fetch reads and writes `store`.
    ///
    /// # Errors
    /// Only a simulated fetch returns an error, when the store is unavailable.
    pub async fn fetch<S>(&self, store: &Mutex<S>) -> Result<FeedResult, Error>
    where
        S: TransactionStore,
    {
        match self {
            Self::Live(feed) => Ok(feed.fetch().await),
            Self::Simulated(feed) => fetch_simulated(feed, store),
        }
    }
}

fn fetch_simulated<S>(feed: &SimulatedFeed, store: &Mutex<S>) -> Result<FeedResult, Error>
where
    S: TransactionStore,
{
    let store = lock_store(store)?;

    feed.fetch(&*store)
}
