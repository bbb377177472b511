//! Feed Sync keeps a local record of a payment service's transaction feed.
//!
//! Each live read fetches the feed, works out which transactions have not been
//! seen before, stores them, and reports the result as JSON. The stored
//! transactions can also be read back directly without touching the feed.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod config;
mod db;
mod endpoints;
mod feed;
mod health;
mod logging;
mod query;
mod routing;
mod stored_transactions_endpoint;
mod sync_endpoint;
mod timestamp;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::{Config, DEFAULT_API_KEY, DEFAULT_FEED_URL, FeedMode};
pub use db::{initialize as initialize_db, open as open_db};
pub use feed::{ApiStatus, FeedFetcher, FeedResult, LiveFeed, SimulatedFeed};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use query::{SyncOutcome, live_reconciliation_read, store_only_read};
pub use routing::build_router;
pub use transaction::{
    NewTransaction, Note, Party, Payload, StoredTransaction, Title, TransactionRecord,
    TransactionStore, reconcile, sync_records,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote feed could not be read: the request failed, the server
    /// answered with a non-success status, or the body was not a feed.
    ///
    /// `status_code` is `None` when no response was received at all.
    #[error("feed request failed: {} {reason}", display_status_code(.status_code))]
    FetchFailed {
        /// The HTTP status code of the response, if there was one.
        status_code: Option<u16>,
        /// The reason phrase or transport error text, verbatim.
        reason: String,
    },

    /// The store could not be reached at all, e.g. the database file could
    /// not be opened.
    #[error("the transaction store is unavailable: {0}")]
    StoreUnavailable(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A request to a protected route did not carry a valid API key.
    #[error("invalid API key")]
    InvalidApiKey,

    /// The configuration could not be turned into a working service.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A transaction record has no ID and so cannot be stored.
    #[error("the transaction record has no ID")]
    MissingId,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

fn display_status_code(status_code: &Option<u16>) -> String {
    status_code.map_or_else(|| "-".to_owned(), |code| code.to_string())
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: rusqlite::ffi::ErrorCode::CannotOpen,
                    ..
                },
                _,
            ) => Error::StoreUnavailable(value.to_string()),
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The status code the HTTP layer answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
            Error::StoreUnavailable(_) | Error::DatabaseLockError => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Error::InvalidConfig(_) | Error::MissingId | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            Error::FetchFailed { .. } | Error::InvalidApiKey => self.to_string(),
            Error::StoreUnavailable(_) | Error::DatabaseLockError => {
                tracing::error!("{self}");
                "The transaction store is unavailable, try again later.".to_owned()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                "Internal Server Error, check the server logs for more details.".to_owned()
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
