use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn, Instrument};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Get the default tracing layer for HTTP requests
pub fn get_tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Per-request logging with a process-local request id.
///
/// The id is echoed back in the `x-request-id` response header.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);

    let method = request.method().clone();
    let uri = request.uri().clone();
    let has_user = request.headers().contains_key(crate::routes::USER_ID_HEADER);

    info!(
        request_id,
        method = %method,
        uri = %uri,
        has_user,
        "Incoming HTTP request"
    );

    let span = info_span!("http_request", request_id, method = %method, uri = %uri);
    let mut response = next.run(request).instrument(span).await;

    let duration = start_time.elapsed();
    let status = response.status();
    if status.is_server_error() {
        error!(request_id, status = %status, duration_ms = %duration.as_millis(), "HTTP request failed with server error");
    } else if status.is_client_error() {
        warn!(request_id, status = %status, duration_ms = %duration.as_millis(), "HTTP request failed with client error");
    } else {
        info!(request_id, status = %status, duration_ms = %duration.as_millis(), "HTTP request completed");
    }

    response
        .headers_mut()
        .insert("x-request-id", HeaderValue::from(request_id));
    response
}
