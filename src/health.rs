//! The public routes: the welcome message and the health check.

use axum::{
    Json,
    extract::{FromRef, State},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{AppState, FeedMode, timestamp::now_rfc3339};

/// The state needed for the health check.
#[derive(Debug, Clone, Copy)]
pub struct HealthState {
    /// Which kind of feed the server reads.
    pub mode: FeedMode,
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            mode: state.feed_mode(),
        }
    }
}

/// The body of a health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy"; the server answering at all is the signal.
    pub status: &'static str,
    /// Whether the feed is simulated.
    pub mock_mode: bool,
    /// When the check was answered.
    pub timestamp: String,
}

/// Greet API clients.
pub async fn get_root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Feed Sync API" }))
}

/// Report that the server is up. Touches neither the store nor the feed.
pub async fn get_health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        mock_mode: state.mode == FeedMode::Simulated,
        timestamp: now_rfc3339(),
    })
}

#[cfg(test)]
mod health_tests {
    use axum::extract::State;

    use crate::{
        FeedMode,
        health::{HealthState, get_health, get_root},
    };

    #[tokio::test]
    async fn root_has_welcome_message() {
        let body = get_root().await;

        assert!(body["message"].as_str().unwrap().starts_with("Welcome"));
    }

    #[tokio::test]
    async fn health_reports_mode() {
        let body = get_health(State(HealthState {
            mode: FeedMode::Simulated,
        }))
        .await;

        assert_eq!(body.status, "healthy");
        assert!(body.mock_mode);
        assert!(!body.timestamp.is_empty());
    }
}
