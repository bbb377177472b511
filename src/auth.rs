//! API key middleware for the protected routes.

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{AppState, Error};

/// The header that carries the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The state needed for the API key middleware.
#[derive(Debug, Clone)]
pub struct ApiKeyState {
    /// The secret clients must present.
    pub api_key: String,
}

impl FromRef<AppState> for ApiKeyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api_key: state.api_key.clone(),
        }
    }
}

/// Middleware function that only lets a request through if its `x-api-key`
/// header matches the configured key, otherwise responds with 401.
pub async fn api_key_guard(
    State(state): State<ApiKeyState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|value| value.as_bytes());

    match presented {
        Some(key) if key == state.api_key.as_bytes() => next.run(request).await,
        Some(_) => {
            tracing::warn!("Rejected request to {} with a wrong API key.", request.uri());
            Error::InvalidApiKey.into_response()
        }
        None => {
            tracing::warn!("Rejected request to {} without an API key.", request.uri());
            Error::InvalidApiKey.into_response()
        }
    }
}
