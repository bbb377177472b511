use axum::{Router, body::Body, response::Response};
use serde_json::Value;

#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    let header_error_message = format!("Headers missing {header_name}");

    response
        .headers()
        .get(header_name)
        .expect(&header_error_message)
        .to_str()
        .expect("Could not convert to str")
        .to_string()
}

pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    assert_eq!(get_header(&response, "content-type"), "application/json");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&body).expect("Response body is not JSON")
}

/// Serve `router` on a random local port and return its base URL.
///
/// The server runs until the test's runtime shuts down.
pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind a local port");
    let addr = listener.local_addr().expect("Could not read the local address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server stopped unexpectedly");
    });

    format!("http://{addr}")
}
