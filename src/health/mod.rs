//! Liveness and readiness probes for container orchestration.
//!
//! Liveness only says the process can answer HTTP. Readiness delegates to a
//! single injected `DependencyChecker` and reports a strictly binary result:
//! 200 `{"status":"ok"}` when the dependency answers, 503 `{"status":"error"}`
//! for any failure. The failure itself is not disclosed.

pub mod checker;
pub mod probes;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::config::{LIVENESS_PATH, READINESS_PATH};

pub use checker::{CheckContext, CheckError, DependencyChecker, RequestDeadline};
pub use probes::build_checker;

/// Probe outcome, serialized as the value of the `status` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Error,
}

/// Probe response body: exactly one `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthBody {
    pub status: HealthStatus,
}

impl HealthBody {
    const OK: Self = Self {
        status: HealthStatus::Ok,
    };
    const ERROR: Self = Self {
        status: HealthStatus::Error,
    };
}

/// Serves the probes for one dependency.
///
/// The checker is fixed at construction and shared by reference across all
/// concurrent requests.
#[derive(Clone)]
pub struct HealthReporter {
    checker: Arc<dyn DependencyChecker>,
}

impl HealthReporter {
    pub fn new(checker: Arc<dyn DependencyChecker>) -> Self {
        Self { checker }
    }

    /// Bind `GET /healthz` and `GET /readyz` onto `router`.
    pub fn register_routes<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.merge(
            Router::new()
                .route(LIVENESS_PATH, get(liveness))
                .route(READINESS_PATH, get(readiness))
                .with_state::<S>(self),
        )
    }

    /// Run the dependency check and map it to a probe response.
    pub async fn readiness(&self, ctx: &CheckContext) -> (StatusCode, Json<HealthBody>) {
        match self.checker.check(ctx).await {
            Ok(()) => (StatusCode::OK, Json(HealthBody::OK)),
            Err(_) => (StatusCode::SERVICE_UNAVAILABLE, Json(HealthBody::ERROR)),
        }
    }
}

/// Liveness probe handler. Never consults the dependency.
#[instrument(name = "health::liveness")]
pub async fn liveness() -> (StatusCode, Json<HealthBody>) {
    (StatusCode::OK, Json(HealthBody::OK))
}

/// Readiness probe handler.
#[instrument(name = "health::readiness", skip(reporter))]
pub async fn readiness(
    State(reporter): State<HealthReporter>,
    ctx: CheckContext,
) -> (StatusCode, Json<HealthBody>) {
    reporter.readiness(&ctx).await
}
