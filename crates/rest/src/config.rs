//! Server configuration.
//!
//! Configuration types for the hosting transport layer, supporting both
//! programmatic construction and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EMBER_SERVER_PORT` | 8080 | Server port |
//! | `EMBER_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `EMBER_LOG_LEVEL` | info | Log level |
//! | `EMBER_BASE_URL` | http://localhost:8080 | Server base URL |
//! | `EMBER_MODULES` | (empty) | Handler modules to load, comma-separated |
//! | `EMBER_MAX_DECOMPRESSED_BODY_SIZE` | 10485760 | Decompression ceiling (bytes, 0 disables) |
//! | `EMBER_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `EMBER_ENABLE_CORS` | true | Enable CORS |

use std::net::SocketAddr;

use clap::Parser;

/// Server configuration for the Ember transport layer.
///
/// Constructed from command line arguments with [`ServerConfig::parse`],
/// from the environment, or programmatically via struct update syntax on
/// [`ServerConfig::default`].
#[derive(Debug, Clone, Parser)]
#[command(name = "ember-server")]
#[command(about = "Ember pluggable FHIR facade server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "EMBER_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "EMBER_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "EMBER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Base URL for the server (used in Location headers and key
    /// serialization).
    #[arg(long, env = "EMBER_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Handler modules to load from the catalog at startup,
    /// comma-separated. An unknown name aborts startup.
    #[arg(long, env = "EMBER_MODULES", value_delimiter = ',', default_value = "")]
    pub modules: Vec<String>,

    /// Maximum decompressed request body size in bytes. `0` disables the
    /// ceiling entirely, an explicit opt-out of the decompression-bomb
    /// defense.
    #[arg(
        long,
        env = "EMBER_MAX_DECOMPRESSED_BODY_SIZE",
        default_value = "10485760"
    )]
    pub max_decompressed_body_size: u64,

    /// Request timeout in seconds.
    #[arg(long, env = "EMBER_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "EMBER_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            base_url: "http://localhost:8080".to_string(),
            modules: Vec::new(),
            max_decompressed_body_size: 10 * 1024 * 1024, // 10MB
            request_timeout: 30,
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    /// Creates a configuration from environment variables alone, falling
    /// back to the defaults when parsing fails. Process argv is not
    /// consulted, so a host's own flags cannot mask `EMBER_*` settings.
    pub fn from_env() -> Self {
        Self::try_parse_from(["ember-server"]).unwrap_or_default()
    }

    /// The socket address to bind.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The decompression ceiling, with `0` meaning "unbounded".
    pub fn decompression_limit(&self) -> Option<u64> {
        match self.max_decompressed_body_size {
            0 => None,
            limit => Some(limit),
        }
    }

    /// The configured module names, with empty entries dropped.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Validates the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push("host must not be empty".to_string());
        } else if self.socket_addr().parse::<SocketAddr>().is_err()
            && self.host != "localhost"
        {
            errors.push(format!("invalid host: {}", self.host));
        }

        if self.base_url.is_empty() {
            errors.push("base_url must not be empty".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("request_timeout must be at least 1 second".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.decompression_limit(), Some(10_485_760));
        assert_eq!(config.module_names().count(), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_reads_environment_not_argv() {
        // The test harness's own argv must not disturb the result.
        unsafe { std::env::set_var("EMBER_SERVER_PORT", "4242") };
        let config = ServerConfig::from_env();
        unsafe { std::env::remove_var("EMBER_SERVER_PORT") };

        assert_eq!(config.port, 4242);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_zero_ceiling_means_unbounded() {
        let config = ServerConfig {
            max_decompressed_body_size: 0,
            ..Default::default()
        };
        assert_eq!(config.decompression_limit(), None);
    }

    #[test]
    fn test_module_names_skip_empty_entries() {
        let config = ServerConfig {
            modules: vec!["demo".to_string(), String::new()],
            ..Default::default()
        };
        let names: Vec<&str> = config.module_names().collect();
        assert_eq!(names, vec!["demo"]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ServerConfig {
            host: String::new(),
            request_timeout: 0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
