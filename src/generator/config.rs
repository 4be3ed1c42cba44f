use std::env;
use std::fmt;
use std::time::Duration;

use crate::generator::error::ConfigError;

pub const DEFAULT_GRPC_ENDPOINT: &str = "http://localhost:4317";
pub const DEFAULT_HTTP_ENDPOINT: &str = "http://localhost:4318/v1/logs";

pub const DEFAULT_SERVICE_NAME: &str = "example-app";
pub const DEFAULT_SERVICE_VERSION: &str = "1.0.0";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_HOST_NAME: &str = "localhost";

pub const DEFAULT_RECORD_COUNT: usize = 20;
pub const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_BATCH_SIZE: usize = 512;
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 2048;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// Console log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty human-readable format with colors
    #[default]
    Pretty,
    /// JSON structured format
    Json,
}

/// OTLP wire transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// OTLP/gRPC (port 4317, no TLS)
    #[default]
    Grpc,
    /// OTLP/HTTP with binary protobuf payloads (port 4318)
    Http,
}

impl Protocol {
    /// Endpoint used when no override is configured
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Grpc => DEFAULT_GRPC_ENDPOINT,
            Self::Http => DEFAULT_HTTP_ENDPOINT,
        }
    }

    /// Cargo feature that compiles this transport in
    pub fn feature(&self) -> &'static str {
        match self {
            Self::Grpc => "grpc",
            Self::Http => "http",
        }
    }

    /// Parse an `OTEL_EXPORTER_OTLP_PROTOCOL` style value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grpc" => Some(Self::Grpc),
            "http" | "http/protobuf" => Some(Self::Http),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grpc => f.write_str("gRPC"),
            Self::Http => f.write_str("HTTP"),
        }
    }
}

/// Main generator configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub host_name: String,
    pub protocol: Protocol,
    pub endpoint: Option<String>,
    pub headers: Vec<(String, String)>,
    pub export_timeout: Duration,
    pub record_count: usize,
    pub emit_interval: Duration,
    pub max_batch_size: usize,
    pub max_queue_size: usize,
    pub flush_interval: Duration,
    pub seed: Option<u64>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl GeneratorConfig {
    /// Create config from environment variables.
    /// Unparseable numeric values are reported rather than ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let protocol = match env::var("OTEL_EXPORTER_OTLP_PROTOCOL") {
            Ok(value) => Protocol::parse(&value).ok_or(ConfigError::InvalidValue {
                key: "OTEL_EXPORTER_OTLP_PROTOCOL",
                value,
            })?,
            Err(_) => Protocol::default(),
        };

        let export_timeout = match env::var("OTEL_EXPORTER_OTLP_TIMEOUT") {
            Ok(value) => value
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidValue {
                    key: "OTEL_EXPORTER_OTLP_TIMEOUT",
                    value,
                })?,
            Err(_) => DEFAULT_EXPORT_TIMEOUT,
        };

        let headers = match env::var("OTEL_EXPORTER_OTLP_HEADERS") {
            Ok(value) => parse_headers(&value)?,
            Err(_) => Vec::new(),
        };

        let defaults = Self::default();
        Ok(Self {
            service_name: env::var("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
            service_version: env::var("OTEL_SERVICE_VERSION").unwrap_or(defaults.service_version),
            environment: env::var("DEPLOYMENT_ENVIRONMENT").unwrap_or(defaults.environment),
            protocol,
            endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            headers,
            export_timeout,
            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            ..defaults
        })
    }

    /// Create a new config with explicit identity values
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            host_name: DEFAULT_HOST_NAME.to_string(),
            protocol: Protocol::Grpc,
            endpoint: None,
            headers: Vec::new(),
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
            record_count: DEFAULT_RECORD_COUNT,
            emit_interval: DEFAULT_EMIT_INTERVAL,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            seed: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }

    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::default()
    }

    /// Endpoint the selected transport binds to
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.protocol.default_endpoint())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::Validation(
                "max_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.max_queue_size < self.max_batch_size {
            return Err(ConfigError::Validation(format!(
                "max_queue_size ({}) must be at least max_batch_size ({})",
                self.max_queue_size, self.max_batch_size
            )));
        }
        if self.flush_interval.is_zero() {
            return Err(ConfigError::Validation(
                "flush_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = timeout;
        self
    }

    pub fn with_record_count(mut self, count: usize) -> Self {
        self.record_count = count;
        self
    }

    pub fn with_emit_interval(mut self, interval: Duration) -> Self {
        self.emit_interval = interval;
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_VERSION)
    }
}

/// Parse `key=value,key2=value2` as used by `OTEL_EXPORTER_OTLP_HEADERS`
pub fn parse_headers(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidValue {
                key: "OTEL_EXPORTER_OTLP_HEADERS",
                value: pair.to_string(),
            }),
        })
        .collect()
}

#[derive(Default)]
pub struct GeneratorConfigBuilder {
    service_name: Option<String>,
    service_version: Option<String>,
    environment: Option<String>,
    host_name: Option<String>,
    protocol: Option<Protocol>,
    endpoint: Option<String>,
    record_count: Option<usize>,
    emit_interval: Option<Duration>,
    max_batch_size: Option<usize>,
    flush_interval: Option<Duration>,
    seed: Option<u64>,
    log_level: Option<String>,
    log_format: Option<LogFormat>,
}

impl GeneratorConfigBuilder {
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn http(self) -> Self {
        self.protocol(Protocol::Http)
    }

    pub fn grpc(self) -> Self {
        self.protocol(Protocol::Grpc)
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn record_count(mut self, count: usize) -> Self {
        self.record_count = Some(count);
        self
    }

    pub fn emit_interval(mut self, interval: Duration) -> Self {
        self.emit_interval = Some(interval);
        self
    }

    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = Some(size);
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = Some(interval);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.log_format = Some(LogFormat::Json);
        self
    }

    pub fn pretty(mut self) -> Self {
        self.log_format = Some(LogFormat::Pretty);
        self
    }

    pub fn build(self) -> GeneratorConfig {
        let defaults = GeneratorConfig::default();
        GeneratorConfig {
            service_name: self.service_name.unwrap_or(defaults.service_name),
            service_version: self.service_version.unwrap_or(defaults.service_version),
            environment: self.environment.unwrap_or(defaults.environment),
            host_name: self.host_name.unwrap_or(defaults.host_name),
            protocol: self.protocol.unwrap_or_default(),
            endpoint: self.endpoint,
            record_count: self.record_count.unwrap_or(defaults.record_count),
            emit_interval: self.emit_interval.unwrap_or(defaults.emit_interval),
            max_batch_size: self.max_batch_size.unwrap_or(defaults.max_batch_size),
            flush_interval: self.flush_interval.unwrap_or(defaults.flush_interval),
            seed: self.seed,
            log_level: self.log_level.unwrap_or(defaults.log_level),
            log_format: self.log_format.unwrap_or_default(),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Removes the listed env vars when dropped
    struct EnvGuard {
        vars: Vec<&'static str>,
    }

    impl EnvGuard {
        fn new(vars: &[&'static str]) -> Self {
            Self { vars: vars.to_vec() }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for var in &self.vars {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn from_env_reads_protocol_headers_and_timeout() {
        let _guard = EnvGuard::new(&[
            "OTEL_EXPORTER_OTLP_PROTOCOL",
            "OTEL_EXPORTER_OTLP_HEADERS",
            "OTEL_EXPORTER_OTLP_TIMEOUT",
            "HOSTNAME",
        ]);
        env::set_var("OTEL_EXPORTER_OTLP_PROTOCOL", "http/protobuf");
        env::set_var("HOSTNAME", "build-box-7");
        env::set_var("OTEL_EXPORTER_OTLP_HEADERS", "api-key=secret");
        env::set_var("OTEL_EXPORTER_OTLP_TIMEOUT", "2500");

        let config = GeneratorConfig::from_env().unwrap();

        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(
            config.headers,
            vec![("api-key".to_string(), "secret".to_string())]
        );
        assert_eq!(config.export_timeout, Duration::from_millis(2500));
        assert_eq!(config.record_count, DEFAULT_RECORD_COUNT);
        assert_eq!(config.host_name, DEFAULT_HOST_NAME);
    }

    #[test]
    fn protocol_default_is_grpc() {
        assert_eq!(Protocol::default(), Protocol::Grpc);
    }

    #[test]
    fn protocol_default_endpoints() {
        assert_eq!(Protocol::Grpc.default_endpoint(), "http://localhost:4317");
        assert_eq!(
            Protocol::Http.default_endpoint(),
            "http://localhost:4318/v1/logs"
        );
    }

    #[test]
    fn protocol_parse_accepts_otel_values() {
        assert_eq!(Protocol::parse("grpc"), Some(Protocol::Grpc));
        assert_eq!(Protocol::parse("http/protobuf"), Some(Protocol::Http));
        assert_eq!(Protocol::parse(" HTTP "), Some(Protocol::Http));
        assert_eq!(Protocol::parse("http/json"), None);
    }

    #[test]
    fn config_new_sets_defaults() {
        let config = GeneratorConfig::new("test-service", "1.0.0");

        assert_eq!(config.service_name, "test-service");
        assert_eq!(config.service_version, "1.0.0");
        assert_eq!(config.environment, "development");
        assert_eq!(config.host_name, "localhost");
        assert_eq!(config.protocol, Protocol::Grpc);
        assert_eq!(config.record_count, 20);
        assert_eq!(config.emit_interval, Duration::from_millis(500));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.endpoint.is_none());
        assert!(config.seed.is_none());
    }

    #[test]
    fn endpoint_follows_protocol_unless_overridden() {
        let grpc = GeneratorConfig::new("svc", "1.0");
        let http = GeneratorConfig::new("svc", "1.0").with_protocol(Protocol::Http);
        let custom = GeneratorConfig::new("svc", "1.0")
            .with_protocol(Protocol::Http)
            .with_endpoint("http://collector:4318/v1/logs");

        assert_eq!(grpc.endpoint(), DEFAULT_GRPC_ENDPOINT);
        assert_eq!(http.endpoint(), DEFAULT_HTTP_ENDPOINT);
        assert_eq!(custom.endpoint(), "http://collector:4318/v1/logs");
    }

    #[test]
    fn config_with_methods_chain() {
        let config = GeneratorConfig::new("svc", "1.0")
            .with_record_count(5)
            .with_emit_interval(Duration::ZERO)
            .with_seed(7)
            .with_header("authorization", "Bearer token")
            .with_log_format(LogFormat::Json);

        assert_eq!(config.record_count, 5);
        assert_eq!(config.emit_interval, Duration::ZERO);
        assert_eq!(config.seed, Some(7));
        assert_eq!(
            config.headers,
            vec![("authorization".to_string(), "Bearer token".to_string())]
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn builder_sets_all_fields() {
        let config = GeneratorConfig::builder()
            .service_name("my-service")
            .service_version("2.0.0")
            .environment("staging")
            .host_name("box-1")
            .http()
            .endpoint("http://collector:4318/v1/logs")
            .record_count(3)
            .max_batch_size(2)
            .seed(42)
            .log_level("warn")
            .json()
            .build();

        assert_eq!(config.service_name, "my-service");
        assert_eq!(config.service_version, "2.0.0");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.host_name, "box-1");
        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(config.endpoint(), "http://collector:4318/v1/logs");
        assert_eq!(config.record_count, 3);
        assert_eq!(config.max_batch_size, 2);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn builder_uses_defaults_when_not_set() {
        let config = GeneratorConfig::builder().build();

        assert_eq!(config.service_name, "example-app");
        assert_eq!(config.service_version, "1.0.0");
        assert_eq!(config.environment, "development");
        assert_eq!(config.host_name, "localhost");
        assert_eq!(config.protocol, Protocol::Grpc);
        assert_eq!(config.max_queue_size, DEFAULT_MAX_QUEUE_SIZE);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let config = GeneratorConfig::new("svc", "1.0").with_max_batch_size(0);

        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_queue_smaller_than_batch() {
        let config = GeneratorConfig::new("svc", "1.0").with_max_batch_size(4096);

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_headers_splits_pairs() {
        let headers = parse_headers("api-key=secret, x-tenant = acme ,").unwrap();

        assert_eq!(
            headers,
            vec![
                ("api-key".to_string(), "secret".to_string()),
                ("x-tenant".to_string(), "acme".to_string()),
            ]
        );
    }

    #[test]
    fn parse_headers_rejects_missing_separator() {
        assert!(parse_headers("no-separator").is_err());
        assert!(parse_headers("=value").is_err());
    }
}
