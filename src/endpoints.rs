//! The API endpoints URIs.

/// The welcome message.
pub const ROOT: &str = "/";
/// Liveness check that touches neither the store nor the feed.
pub const HEALTH: &str = "/health";
/// Fetch the feed, store the new transactions and report them.
pub const TRANSACTIONS: &str = "/transactions";
/// Read the stored transactions without fetching the feed.
pub const DB_TRANSACTIONS: &str = "/db-transactions";
