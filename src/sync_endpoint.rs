//! The endpoint that fetches the feed and stores the transactions it has not seen before.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error, FeedMode,
    feed::{ApiStatus, FeedFetcher},
    query::live_reconciliation_read,
    timestamp::now_rfc3339,
    transaction::TransactionRecord,
};

/// The state needed for syncing the feed.
#[derive(Debug, Clone)]
pub struct SyncEndpointState {
    /// Where the feed is read from.
    pub feed: FeedFetcher,
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SyncEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            feed: state.feed.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a successful sync.
#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    /// The number of transactions in the feed.
    pub count: usize,
    /// How many of them had not been stored before.
    pub new_transactions: usize,
    /// How many of the new transactions were stored by this request.
    pub persisted_count: usize,
    /// The whole feed.
    pub transactions: Vec<TransactionRecord>,
    /// How the fetch went.
    pub api_status: ApiStatus,
    /// Whether the feed is simulated.
    pub mock_mode: bool,
    /// When the response was produced.
    pub timestamp: String,
}

/// Fetch the feed, store its new transactions and return the whole feed.
///
/// Responds with 502 if the feed could not be read.
pub async fn sync_transactions_endpoint(
    State(state): State<SyncEndpointState>,
) -> Result<Json<TransactionsResponse>, Error> {
    let outcome = live_reconciliation_read(&state.feed, &state.db_connection).await?;

    Ok(Json(TransactionsResponse {
        count: outcome.records.len(),
        new_transactions: outcome.new_records.len(),
        persisted_count: outcome.persisted_count,
        transactions: outcome.records,
        api_status: outcome.api_status,
        mock_mode: outcome.mode == FeedMode::Simulated,
        timestamp: now_rfc3339(),
    }))
}

#[cfg(test)]
mod sync_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        feed::{FeedFetcher, SimulatedFeed},
        sync_endpoint::{SyncEndpointState, sync_transactions_endpoint},
        test_utils::parse_json_body,
    };

    fn get_test_state() -> SyncEndpointState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        SyncEndpointState {
            feed: FeedFetcher::Simulated(SimulatedFeed::new(Some(11))),
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn reports_feed_and_counts() {
        let state = get_test_state();

        let response = sync_transactions_endpoint(State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        let transactions = body["transactions"].as_array().unwrap();
        assert_eq!(body["count"], transactions.len());
        assert_eq!(body["mock_mode"], true);
        assert_eq!(body["api_status"]["status_code"], 200);
        assert_eq!(body["api_status"]["reason"], "OK");
        assert_eq!(body["api_status"]["success"], true);
        assert!(body["persisted_count"].as_u64().unwrap() <= body["new_transactions"].as_u64().unwrap());
        assert!(body["timestamp"].is_string());
        assert!(transactions[0]["date"].is_string());
    }

    #[tokio::test]
    async fn poisoned_store_is_unavailable() {
        let state = get_test_state();
        let poisoner = state.db_connection.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let response = sync_transactions_endpoint(State(state))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = parse_json_body(response).await;
        assert!(body["detail"].is_string());
    }
}
