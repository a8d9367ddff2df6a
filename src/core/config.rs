//! Configuration management for the vector index health service
//!
//! Values come from defaults, then `vector-health.toml` (or an explicit file),
//! then `VH_*` environment variables, then command line overrides.

use crate::client::IndexDescriptor;
use crate::core::error::{Error, Result};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "vector-health.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deployment environment reported in health responses
    pub environment: Option<String>,

    /// Server configuration
    pub server: ServerConfig,

    /// Vector index client configuration
    pub client: ClientConfig,

    /// Health check behaviour
    pub health: HealthConfig,

    /// Metrics export
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,

    /// Allow cross-origin GET requests (dashboards served elsewhere)
    pub enable_cors: bool,
}

/// Which client implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientProvider {
    /// Hosted Pinecone-style index over HTTP
    Pinecone,
    /// In-process index with sample data
    Memory,
}

/// Vector index client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client implementation
    pub provider: ClientProvider,

    /// Index name
    pub index_name: String,

    /// Provider environment
    pub environment: String,

    /// Distance metric
    pub metric: String,

    /// Cloud hosting the index
    pub cloud: String,

    /// Cloud region
    pub region: String,

    /// Vector dimension
    pub dimension: u32,

    /// Data-plane host; resolved through the control plane when unset
    pub host: Option<String>,

    /// Control-plane base URL
    pub control_plane_url: String,

    /// API key
    pub api_key: Option<String>,

    /// Create the index on startup when it does not exist
    pub create_if_missing: bool,

    /// HTTP request timeout inside the client
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,

    /// How long a non-forced health probe may be answered from cache
    #[serde(deserialize_with = "deserialize_duration")]
    pub health_cache_ttl: Duration,

    /// Fullness at or above which the index is reported degraded
    pub degraded_fullness: f64,

    /// Probe latency at or above which the index is reported degraded
    #[serde(deserialize_with = "deserialize_duration")]
    pub slow_probe_threshold: Duration,
}

/// Health check behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Upper bound on every client call made by the health endpoints
    #[serde(deserialize_with = "deserialize_duration")]
    pub call_timeout: Duration,

    /// Capacity of the deferred check-recording queue
    pub recorder_capacity: usize,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve `/vector-db/metrics`.
    ///
    /// On by default. Turning it off removes the route, so the service no
    /// longer exposes the full `/vector-db` route table.
    pub enable_prometheus: bool,

    /// Append per-endpoint request metrics to the export
    pub endpoint_metrics: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: true,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            provider: ClientProvider::Pinecone,
            index_name: "support-tickets".to_string(),
            environment: "us-east-1-aws".to_string(),
            metric: "cosine".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            dimension: 384,
            host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            api_key: None,
            create_if_missing: false,
            request_timeout: Duration::from_secs(10),
            health_cache_ttl: Duration::from_secs(30),
            degraded_fullness: 0.9,
            slow_probe_threshold: Duration::from_secs(2),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(4),
            recorder_capacity: 1024,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enable_prometheus: true,
            endpoint_metrics: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ClientConfig {
    /// Read-only descriptor handed to clients
    pub fn descriptor(&self) -> IndexDescriptor {
        let provider = match self.provider {
            ClientProvider::Pinecone => "pinecone",
            ClientProvider::Memory => "memory",
        };
        IndexDescriptor {
            provider: provider.to_string(),
            index_name: self.index_name.clone(),
            environment: self.environment.clone(),
            metric: self.metric.clone(),
            cloud: self.cloud.clone(),
            region: self.region.clone(),
            dimension: self.dimension,
        }
    }
}

impl Config {
    /// Load configuration from the default file (if present) and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without overrides or validation
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("VH_HTTP_ADDR") {
            self.server.http_addr = addr.parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Some(environment) = lookup("VH_ENVIRONMENT") {
            self.environment = Some(environment);
        }

        if let Some(provider) = lookup("VH_CLIENT_PROVIDER") {
            self.client.provider = parse_provider(&provider)?;
        }

        if let Some(index_name) = lookup("VH_INDEX_NAME") {
            self.client.index_name = index_name;
        }

        if let Some(host) = lookup("VH_INDEX_HOST") {
            self.client.host = Some(host);
        }

        if let Some(api_key) = lookup("PINECONE_API_KEY") {
            self.client.api_key = Some(api_key);
        }

        if let Some(level) = lookup("VH_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("VH_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.client.index_name.trim().is_empty() {
            return Err(Error::config("Index name must not be empty"));
        }

        if self.client.dimension == 0 {
            return Err(Error::config("Vector dimension must be positive"));
        }

        if !(0.0..=1.0).contains(&self.client.degraded_fullness) {
            return Err(Error::config("Degraded fullness must be between 0.0 and 1.0"));
        }

        if self.health.call_timeout.is_zero() {
            return Err(Error::config("Health call timeout must be positive"));
        }

        if self.health.recorder_capacity == 0 {
            return Err(Error::config("Recorder capacity must be positive"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => return Err(Error::config("Invalid log format (expected pretty or json)")),
        }

        Ok(())
    }
}

/// Parse a client provider name
pub fn parse_provider(value: &str) -> Result<ClientProvider> {
    match value {
        "pinecone" => Ok(ClientProvider::Pinecone),
        "memory" => Ok(ClientProvider::Memory),
        other => Err(Error::config(format!(
            "Invalid client provider: {}. Valid options: pinecone, memory",
            other
        ))),
    }
}

// Durations in TOML are written as strings like "250ms" or "5s"
fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a duration string like '30s' or '5m', or whole seconds")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Duration, E>
        where
            E: de::Error,
        {
            parse_duration(value).map_err(E::custom)
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Duration, E>
        where
            E: de::Error,
        {
            u64::try_from(value)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("duration must not be negative"))
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<Duration, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(value))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}

/// Parse `"250ms"`, `"5s"`, `"2m"`, `"1h"` or bare seconds
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let ms: u64 = ms.parse().map_err(|_| "Invalid milliseconds")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(secs) = s.strip_suffix('s') {
        let secs: u64 = secs.parse().map_err(|_| "Invalid seconds")?;
        Ok(Duration::from_secs(secs))
    } else if let Some(mins) = s.strip_suffix('m') {
        let mins: u64 = mins.parse().map_err(|_| "Invalid minutes")?;
        let secs = mins.checked_mul(60).ok_or("Duration too large")?;
        Ok(Duration::from_secs(secs))
    } else if let Some(hours) = s.strip_suffix('h') {
        let hours: u64 = hours.parse().map_err(|_| "Invalid hours")?;
        let secs = hours.checked_mul(3600).ok_or("Duration too large")?;
        Ok(Duration::from_secs(secs))
    } else {
        let secs: u64 = s.parse().map_err(|_| "Invalid duration format")?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client.provider, ClientProvider::Pinecone);
        assert_eq!(config.health.call_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("7").unwrap(), Duration::from_secs(7));
        assert_eq!(parse_duration(&format!("{}h", u64::MAX / 60)).unwrap_err(), "Duration too large");
        assert_eq!(parse_duration(&format!("{}m", u64::MAX)).unwrap_err(), "Duration too large");
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
environment = "staging"

[server]
http_addr = "127.0.0.1:9100"

[client]
provider = "memory"
index_name = "tickets-staging"
health_cache_ttl = "15s"

[health]
call_timeout = "750ms"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.environment.as_deref(), Some("staging"));
        assert_eq!(config.server.http_addr.port(), 9100);
        assert_eq!(config.client.provider, ClientProvider::Memory);
        assert_eq!(config.client.index_name, "tickets-staging");
        assert_eq!(config.client.health_cache_ttl, Duration::from_secs(15));
        assert_eq!(config.health.call_timeout, Duration::from_millis(750));
        // Untouched sections keep their defaults
        assert_eq!(config.client.dimension, 384);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VH_HTTP_ADDR", "127.0.0.1:7000"),
            ("VH_INDEX_NAME", "routing"),
            ("VH_CLIENT_PROVIDER", "memory"),
            ("PINECONE_API_KEY", "pk-test"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.http_addr.port(), 7000);
        assert_eq!(config.client.index_name, "routing");
        assert_eq!(config.client.provider, ClientProvider::Memory);
        assert_eq!(config.client.api_key.as_deref(), Some("pk-test"));
    }

    #[test]
    fn test_invalid_env_override() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|key| {
            (key == "VH_CLIENT_PROVIDER").then(|| "qdrant".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.client.degraded_fullness = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.health.call_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
