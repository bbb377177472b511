//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Config, Error, FeedMode, db::initialize, feed::FeedFetcher};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The secret clients must present in the `x-api-key` header.
    pub api_key: String,

    /// Where the transaction feed is read from.
    pub feed: FeedFetcher,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, api_key: &str, feed: FeedFetcher) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            api_key: api_key.to_owned(),
            feed,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Create a new [AppState] from `config`, using `db_connection` as the store.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the feed
    /// fetcher cannot be built.
    pub fn from_config(db_connection: Connection, config: &Config) -> Result<Self, Error> {
        Self::new(
            db_connection,
            &config.api_key,
            FeedFetcher::from_config(config)?,
        )
    }

    /// Which kind of feed this server reads.
    pub fn feed_mode(&self) -> FeedMode {
        self.feed.mode()
    }
}
