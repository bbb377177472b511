//! Command line and environment configuration for the service.

use std::net::IpAddr;

use clap::{ArgAction, Parser};
use serde::Serialize;

/// The feed endpoint of the payment service.
pub const DEFAULT_FEED_URL: &str = "https://account.venmo.com/api/stories?feedType=me";

/// The API key accepted when none is configured. Only suitable for local development.
pub const DEFAULT_API_KEY: &str = "default-dev-key";

/// Where the transaction feed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Read the payment service's feed over HTTP.
    Live,
    /// Generate transactions locally.
    Simulated,
}

/// Keeps a local record of a payment service's transaction feed.
///
/// Every option may also be set with the environment variable named in its
/// help text.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH", default_value = "transactions.db")]
    pub db_path: String,

    /// The secret clients must send in the `x-api-key` header.
    #[arg(long, env = "API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    pub api_key: String,

    /// Generate transactions locally instead of reading the payment service's feed.
    ///
    /// Accepts `true`, `1` or `yes`; anything else leaves simulated mode off.
    #[arg(
        long = "mock",
        env = "USE_MOCK_API",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub use_mock_api: bool,

    /// The URL of the feed endpoint.
    #[arg(long, env = "FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// The session cookie sent with feed requests, as a raw `cookie` header value.
    #[arg(long, env = "FEED_COOKIE", hide_env_values = true)]
    pub feed_cookie: Option<String>,

    /// How long to wait for the feed before giving up, in seconds.
    #[arg(long, env = "FEED_TIMEOUT_SECS", default_value_t = 30)]
    pub feed_timeout_secs: u64,

    /// Seed for the simulated feed, for a reproducible sequence of transactions.
    #[arg(long, env = "MOCK_SEED")]
    pub mock_seed: Option<u64>,

    /// The address to serve the API from.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Directory holding an SSL certificate `cert.pem` and key `key.pem`.
    ///
    /// The API is served over plain HTTP when this is not set.
    #[arg(long, env = "CERT_PATH")]
    pub cert_path: Option<String>,
}

impl Config {
    /// The feed source selected by this configuration.
    pub fn feed_mode(&self) -> FeedMode {
        if self.use_mock_api {
            FeedMode::Simulated
        } else {
            FeedMode::Live
        }
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes"
    ))
}
