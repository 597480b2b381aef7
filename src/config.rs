//! Configuration loading and constants.
//!
//! Loads the probe configuration from an optional TOML file and defines the
//! constants for the probe route, listener defaults, Docker request timeout,
//! shutdown grace period, and logging. `AppConfig` is the root configuration
//! struct containing all settings.

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Probe Route
// =============================================================================

/// Path of the single probe route
pub const HEALTH_PATH: &str = "/ishealthy";

/// Body returned with 503 when the node is not an active swarm member
pub const NOT_READY_MESSAGE: &str = "Node is not ready";

/// Probe responses must never be served from a cache
pub const CACHE_CONTROL_PROBE: &str = "no-store";

// =============================================================================
// Listener and Lifecycle
// =============================================================================

/// Default listen host (all interfaces)
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_HTTP_PORT: u16 = 44444;

/// Default listen address, for display in help text and logs
pub const DEFAULT_HTTP_ADDR: &str = formatcp!("{}:{}", DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT);

/// How long in-flight requests may run after a shutdown signal before
/// connections are closed
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;

// =============================================================================
// Docker Daemon
// =============================================================================

/// Upper bound on a single `GET /info` call to the daemon
pub const DEFAULT_DOCKER_REQUEST_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path. A missing file at this path is not an error.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/swarm-probe.toml";

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "swarm_probe=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Docker daemon connection settings
    #[serde(default)]
    pub docker: DockerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
    /// Grace period for in-flight requests on shutdown, in seconds
    #[serde(default = "HttpServerConfig::default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            shutdown_grace_seconds: Self::default_shutdown_grace(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HTTP_HOST.to_string()
    }
    fn default_port() -> u16 {
        DEFAULT_HTTP_PORT
    }
    fn default_shutdown_grace() -> u64 {
        DEFAULT_SHUTDOWN_GRACE_SECS
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

/// Docker daemon connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    /// Unix socket path of the daemon. When unset, bollard's local defaults
    /// apply (honours DOCKER_HOST).
    pub socket: Option<String>,
    /// Timeout for a single status query, in seconds
    #[serde(default = "DockerConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: None,
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

impl DockerConfig {
    fn default_request_timeout() -> u64 {
        DEFAULT_DOCKER_REQUEST_TIMEOUT_SECS
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
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
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file at `path`, falling back to built-in defaults when
    /// `path` is the default location and nothing exists there.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.shutdown_grace_seconds == 0 {
            return Err(ConfigError::Validation(
                "http.shutdown_grace_seconds must be greater than zero".to_string(),
            ));
        }
        if self.docker.request_timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "docker.request_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        match self.logging.format.to_ascii_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got \"{other}\""
            ))),
        }
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
