//! Configuration loading and constants.
//!
//! Loads application configuration from a TOML file and defines the defaults
//! for the HTTP listener, the readiness dependency, webhook verification and
//! logging. `AppConfig` is the root configuration struct containing all settings.

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// Probe Routes
// =============================================================================

/// Liveness probe path
pub const LIVENESS_PATH: &str = "/healthz";

/// Readiness probe path
pub const READINESS_PATH: &str = "/readyz";

/// Webhook subscription verification path
pub const WEBHOOK_PATH: &str = "/webhook";

/// Probes must never be served from an intermediate cache
pub const CACHE_CONTROL_PROBE: &str = "no-store";

// =============================================================================
// Defaults
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str =
    formatcp!("{}=debug,tower_http=info", env!("CARGO_CRATE_NAME"));

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Deadline handed to each request, and through it to the readiness check
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Upper bound accepted for `http.request_timeout_seconds`
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Mode a provider sends when asking to subscribe an endpoint
pub const DEFAULT_WEBHOOK_MODE: &str = "subscribe";

/// Seconds to wait for in-flight connections on shutdown
pub const SHUTDOWN_GRACE_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    /// The single dependency gating readiness
    pub dependency: DependencyConfig,
    /// Webhook verification; the route is not mounted when absent
    pub webhook: Option<WebhookConfig>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "HttpServerConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub tls: TlsConfig,
}

impl HttpServerConfig {
    fn default_request_timeout() -> u64 {
        DEFAULT_REQUEST_TIMEOUT_SECS
    }
}

/// TLS termination mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain HTTP, typically behind a terminating proxy
    #[default]
    None,
    /// User-provided certificate and key files
    Manual,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub mode: TlsMode,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// How readiness reaches its dependency
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "probe", rename_all = "lowercase")]
pub enum DependencyConfig {
    /// Plain TCP connect
    Tcp { address: String },
    /// Redis-protocol PING round trip
    Redis { address: String },
    /// HTTP GET expecting a 2xx status
    Http { url: String },
}

impl DependencyConfig {
    /// Probe kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            DependencyConfig::Tcp { .. } => "tcp",
            DependencyConfig::Redis { .. } => "redis",
            DependencyConfig::Http { .. } => "http",
        }
    }

    /// Address or URL probed
    pub fn target(&self) -> &str {
        match self {
            DependencyConfig::Tcp { address } | DependencyConfig::Redis { address } => address,
            DependencyConfig::Http { url } => url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret the provider echoes back as `hub.verify_token`
    pub verify_token: String,
    #[serde(default = "WebhookConfig::default_mode")]
    pub expected_mode: String,
}

impl WebhookConfig {
    fn default_mode() -> String {
        DEFAULT_WEBHOOK_MODE.to_string()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.http.request_timeout_seconds;
        if timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "http.request_timeout_seconds must be between 1 and {}, got {}",
                MAX_REQUEST_TIMEOUT_SECS, timeout
            )));
        }

        if self.http.tls.mode == TlsMode::Manual
            && (self.http.tls.cert_path.is_none() || self.http.tls.key_path.is_none())
        {
            return Err(ConfigError::Validation(
                "tls mode \"manual\" requires both cert_path and key_path".to_string(),
            ));
        }

        if self.dependency.target().trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} dependency probe has no target",
                self.dependency.kind()
            )));
        }

        if let Some(webhook) = &self.webhook {
            if webhook.verify_token.is_empty() {
                return Err(ConfigError::Validation(
                    "webhook.verify_token must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
