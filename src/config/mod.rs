// Configuration module entry point
// Loads layered configuration and converts it into engine options

mod types;

use std::net::IpAddr;
use std::time::Duration;

use crate::server::ServerOptions;

// Re-export public types
pub use types::{Config, LoggingConfig, MountConfig, PerformanceConfig, ServerConfig};

/// Default config file name (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from the default "config" file, environment and defaults
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (extension optional)
    ///
    /// Environment variables override the file, e.g.
    /// `MOUNTSERVE_SERVER__PORT=8080` or `MOUNTSERVE_LOGGING__LEVEL=debug`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("MOUNTSERVE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(crate::DEFAULT_PORT))?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.idle_timeout", 60)?
            .set_default("performance.read_buffer_size", 1024)?
            .set_default("performance.max_request_size", 8192)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_host(&self) -> Result<IpAddr, String> {
        self.server
            .host
            .parse()
            .map_err(|e| format!("Invalid host '{}': {e}", self.server.host))
    }

    /// Engine options derived from this configuration
    pub fn server_options(&self) -> Result<ServerOptions, String> {
        if self.performance.read_buffer_size == 0 {
            return Err("performance.read_buffer_size must be greater than zero".to_string());
        }
        Ok(ServerOptions {
            host: self.get_host()?,
            idle_timeout: Duration::from_secs(self.performance.idle_timeout),
            read_buffer_size: self.performance.read_buffer_size,
            max_request_size: self
                .performance
                .max_request_size
                .max(self.performance.read_buffer_size),
            access_log: self.logging.access_log,
            access_log_format: self.logging.access_log_format.clone(),
        })
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
