//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::health::{DependencyChecker, HealthReporter};

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Contains the application configuration and the health reporter bound to
/// the readiness dependency.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub health: HealthReporter,
}

impl AppState {
    /// Creates a new application state from the given configuration and dependency checker.
    pub fn new(config: AppConfig, checker: Arc<dyn DependencyChecker>) -> Self {
        Self {
            config: Arc::new(config),
            health: HealthReporter::new(checker),
        }
    }
}
