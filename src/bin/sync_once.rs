use std::{error::Error, sync::Mutex};

use clap::Parser;

use feed_sync::{Config, FeedFetcher, FeedMode, live_reconciliation_read, open_db};

/// Run one sync of the transaction feed against the database and print a summary.
///
/// Takes the same options as the server; only the database and feed options are used.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::parse();

    let feed = FeedFetcher::from_config(&config)?;
    let store = Mutex::new(open_db(&config.db_path)?);

    let outcome = live_reconciliation_read(&feed, &store).await?;

    let mode = match outcome.mode {
        FeedMode::Live => "live",
        FeedMode::Simulated => "simulated",
    };
    println!(
        "Fetched {} transactions from the {mode} feed ({} {}).",
        outcome.records.len(),
        outcome
            .api_status
            .status_code
            .map_or_else(|| "-".to_owned(), |code| code.to_string()),
        outcome.api_status.reason
    );
    println!(
        "{} new, {} stored.",
        outcome.new_records.len(),
        outcome.persisted_count
    );

    for record in &outcome.new_records {
        println!(
            "  {} {} {} -> {}: {}",
            record.occurred_at.as_deref().unwrap_or("-"),
            record.amount.as_deref().unwrap_or("-"),
            record.sender().unwrap_or_default(),
            record.receiver().unwrap_or_default(),
            record.note_text().unwrap_or_default()
        );
    }

    Ok(())
}
