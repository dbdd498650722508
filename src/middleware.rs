//! Request-scoped middleware: request IDs and deadlines.
//!
//! `request_id_layer` generates a UUID v4 for each incoming request and
//! creates a tracing span that wraps the entire request lifecycle, so all logs
//! emitted while handling it carry the `request_id` field. The ID is echoed in
//! the `x-request-id` response header.
//!
//! `deadline_layer` stamps each request with the configured deadline, which
//! handlers pass on to anything they wait for.

use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::HeaderValue;
use tracing::Instrument;
use uuid::Uuid;

use crate::health::RequestDeadline;

/// Response header carrying the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Extension type for accessing request ID in handlers if needed.
#[derive(Clone, Debug)]
pub struct RequestId(pub Uuid);

/// Middleware that generates a request ID and creates a request span.
///
/// This should be the outermost middleware layer so the span wraps
/// all request processing, including other middleware and handlers.
pub async fn request_id_layer(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();
    request.extensions_mut().insert(RequestId(request_id));

    async move {
        let mut response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Middleware that attaches a `RequestDeadline` `timeout` from now.
///
/// A timeout too large to represent leaves the request without a deadline.
pub async fn deadline_layer(
    State(timeout): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(deadline) = tokio::time::Instant::now().checked_add(timeout) {
        request.extensions_mut().insert(RequestDeadline(deadline));
    }
    next.run(request).await
}
