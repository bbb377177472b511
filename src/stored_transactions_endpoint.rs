//! The endpoint that reads the stored transactions without fetching the feed.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error, query::store_only_read, timestamp::now_rfc3339,
    transaction::StoredTransaction,
};

/// The state needed for reading the stored transactions.
#[derive(Debug, Clone)]
pub struct StoredTransactionsState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StoredTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a stored transactions response.
#[derive(Debug, Serialize)]
pub struct StoredTransactionsResponse {
    /// The number of stored transactions.
    pub count: usize,
    /// Every stored transaction, newest first.
    pub transactions: Vec<StoredTransaction>,
    /// When the response was produced.
    pub timestamp: String,
}

/// Return every stored transaction, newest first.
pub async fn get_stored_transactions_endpoint(
    State(state): State<StoredTransactionsState>,
) -> Result<Json<StoredTransactionsResponse>, Error> {
    let transactions = store_only_read(&state.db_connection)?;
    tracing::debug!("Read {} stored transactions.", transactions.len());

    Ok(Json(StoredTransactionsResponse {
        count: transactions.len(),
        transactions,
        timestamp: now_rfc3339(),
    }))
}
