//! hookgate: health probes and webhook subscription verification.
//!
//! Serves `GET /healthz` (liveness), `GET /readyz` (readiness against one
//! configured dependency) and, when configured, `GET /webhook` for the
//! provider's subscription handshake.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod webhook;

pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
