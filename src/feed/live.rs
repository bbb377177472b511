//! Reads the feed from the payment service.

use std::{fmt, time::Duration};

use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, USER_AGENT},
};
use serde::Deserialize;

use crate::{
    Error,
    feed::{ApiStatus, FeedResult},
    transaction::TransactionRecord,
};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

/// The body of a feed response.
#[derive(Deserialize)]
struct FeedPage {
    stories: Vec<TransactionRecord>,
}

/// Fetches the feed with one GET request carrying the session cookie.
#[derive(Clone)]
pub struct LiveFeed {
    client: Client,
    url: String,
    cookie: Option<String>,
}

impl fmt::Debug for LiveFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveFeed")
            .field("url", &self.url)
            .field("cookie", &self.cookie.as_ref().map(|_| "********"))
            .finish()
    }
}

impl LiveFeed {
    /// Create a fetcher for the feed at `url`.
    ///
    /// `cookie` is sent verbatim as the `cookie` header. `timeout` bounds the
    /// whole request; there are no retries.
    ///
    /// # Errors
    /// Returns an [Error::InvalidConfig] if the HTTP client cannot be built.
    pub fn new(url: &str, cookie: Option<String>, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::InvalidConfig(format!("could not build HTTP client: {error}")))?;

        Ok(Self {
            client,
            url: url.to_owned(),
            cookie,
        })
    }

    /// Request the feed.
    ///
    /// Transport errors, non-success statuses and bodies that are not a feed
    /// are all reported as a failed [ApiStatus] with the status code and
    /// reason preserved.
    pub async fn fetch(&self) -> FeedResult {
        let mut request = self
            .client
            .get(&self.url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, "*/*")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9");

        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!("Could not reach the feed at {}: {error}", self.url);
                return FeedResult::failed(
                    error.status().map(|status| status.as_u16()),
                    error.to_string(),
                );
            }
        };

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_owned();
        tracing::info!("Feed responded with {status}");

        if !status.is_success() {
            return FeedResult::failed(Some(status.as_u16()), reason);
        }

        match response.json::<FeedPage>().await {
            Ok(page) => {
                tracing::debug!("Feed contained {} transactions", page.stories.len());
                FeedResult {
                    records: page.stories,
                    api_status: ApiStatus {
                        status_code: Some(status.as_u16()),
                        reason,
                        success: true,
                    },
                }
            }
            Err(error) => {
                tracing::error!("Could not parse the feed response: {error}");
                FeedResult::failed(Some(status.as_u16()), format!("JSON Decode Error: {error}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use serde_json::json;

    use crate::{feed::LiveFeed, test_utils::serve};

    const FEED_PATH: &str = "/api/stories";

    fn live_feed(url: &str) -> LiveFeed {
        LiveFeed::new(url, Some("session=abc".to_owned()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn reads_stories_and_sends_cookie() {
        let router = Router::new().route(
            FEED_PATH,
            get(|headers: HeaderMap| async move {
                if headers.get("cookie").map(|value| value.as_bytes())
                    != Some(b"session=abc".as_slice())
                {
                    return (StatusCode::UNAUTHORIZED, Json(json!({})));
                }

                (
                    StatusCode::OK,
                    Json(json!({"stories": [{"id": "a"}, {"id": "b"}, {"date": "2025-04-05"}]})),
                )
            }),
        );
        let base_url = serve(router).await;

        let result = live_feed(&format!("{base_url}{FEED_PATH}")).fetch().await;

        assert!(result.api_status.success);
        assert_eq!(result.api_status.status_code, Some(200));
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.records[0].id.as_deref(), Some("a"));
        assert_eq!(result.records[2].id, None);
    }

    #[tokio::test]
    async fn non_success_status_is_reported_verbatim() {
        let router = Router::new().route(FEED_PATH, get(|| async { StatusCode::BAD_GATEWAY }));
        let base_url = serve(router).await;

        let result = live_feed(&format!("{base_url}{FEED_PATH}")).fetch().await;

        assert!(!result.api_status.success);
        assert_eq!(result.api_status.status_code, Some(502));
        assert_eq!(result.api_status.reason, "Bad Gateway");
        assert!(result.records.is_empty());
    }

    #[tokio::test]
    async fn body_without_stories_is_a_failure() {
        let router = Router::new().route(FEED_PATH, get(|| async { Json(json!({"data": []})) }));
        let base_url = serve(router).await;

        let result = live_feed(&format!("{base_url}{FEED_PATH}")).fetch().await;

        assert!(!result.api_status.success);
        assert_eq!(result.api_status.status_code, Some(200));
        assert!(result.api_status.reason.starts_with("JSON Decode Error"));
    }

    #[tokio::test]
    async fn unreachable_feed_has_no_status_code() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = live_feed(&format!("http://{addr}{FEED_PATH}")).fetch().await;

        assert!(!result.api_status.success);
        assert_eq!(result.api_status.status_code, None);
        assert!(!result.api_status.reason.is_empty());
    }
}
