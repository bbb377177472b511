//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::{
    AppState,
    auth::api_key_guard,
    endpoints,
    health::{get_health, get_root},
    stored_transactions_endpoint::get_stored_transactions_endpoint,
    sync_endpoint::sync_transactions_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_root))
        .route(endpoints::HEALTH, get(get_health));

    let protected_routes = Router::new()
        .route(endpoints::TRANSACTIONS, get(sync_transactions_endpoint))
        .route(
            endpoints::DB_TRANSACTIONS,
            get(get_stored_transactions_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), api_key_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {uri}");

    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("Not Found: {}", uri.path()) })),
    )
        .into_response()
}
