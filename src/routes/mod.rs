//! HTTP route table.
//!
//! Probes are served without caching. The webhook verification route is only
//! mounted when a `[webhook]` section is configured.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod webhook;

use std::time::Duration;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{CACHE_CONTROL_PROBE, WEBHOOK_PATH};
use crate::middleware::{deadline_layer, request_id_layer};
use crate::state::AppState;

/// Creates the Axum router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Health probes - never cached
    let health_routes = state
        .health
        .clone()
        .register_routes(Router::<AppState>::new())
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_PROBE),
        ));

    let mut router = health_routes;

    if state.config.webhook.is_some() {
        router = router.route(WEBHOOK_PATH, get(webhook::verify));
    }

    let timeout = Duration::from_secs(state.config.http.request_timeout_seconds);

    router
        .with_state(state)
        // Deadline - bounds how long handlers wait on the dependency
        .layer(middleware::from_fn_with_state(timeout, deadline_layer))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
