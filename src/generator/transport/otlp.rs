use std::time::{Duration, SystemTime};

use opentelemetry::logs::{AnyValue, LogRecord as _, Logger as _, LoggerProvider as _};
use opentelemetry_otlp::LogExporter;
use opentelemetry_sdk::logs::{BatchConfigBuilder, BatchLogProcessor, SdkLogger, SdkLoggerProvider};
use tracing::debug;

use crate::generator::config::{GeneratorConfig, Protocol};
use crate::generator::error::{DeliveryError, TransportError};
use crate::generator::record::LogRecord;
use crate::generator::resource::ResourceDescriptor;
use crate::generator::transport::{LogTransport, SelectedExporter};

/// Instrumentation scope attached to every exported record
pub const SCOPE_NAME: &str = env!("CARGO_PKG_NAME");

/// Timer for the SDK processor. Exports are driven by `force_flush`, so it
/// must never fire during a run.
const SDK_SCHEDULED_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Build the OTLP log exporter for the configured protocol
pub(crate) fn build_exporter(config: &GeneratorConfig) -> Result<LogExporter, TransportError> {
    match config.protocol {
        Protocol::Grpc => build_grpc_exporter(config),
        Protocol::Http => build_http_exporter(config),
    }
}

#[cfg(feature = "grpc")]
fn build_grpc_exporter(config: &GeneratorConfig) -> Result<LogExporter, TransportError> {
    use opentelemetry_otlp::{WithExportConfig, WithTonicConfig};

    let metadata = grpc_metadata(&config.headers)?;

    LogExporter::builder()
        .with_tonic()
        .with_endpoint(config.endpoint())
        .with_timeout(config.export_timeout)
        .with_metadata(metadata)
        .build()
        .map_err(|e| TransportError::Build {
            protocol: Protocol::Grpc,
            reason: e.to_string(),
        })
}

#[cfg(not(feature = "grpc"))]
fn build_grpc_exporter(_config: &GeneratorConfig) -> Result<LogExporter, TransportError> {
    Err(TransportError::MissingCapability {
        protocol: Protocol::Grpc,
        feature: Protocol::Grpc.feature(),
    })
}

#[cfg(feature = "grpc")]
fn grpc_metadata(headers: &[(String, String)]) -> Result<tonic::metadata::MetadataMap, TransportError> {
    use tonic::metadata::{MetadataKey, MetadataMap, MetadataValue};

    let mut metadata = MetadataMap::new();
    for (name, value) in headers {
        let key = MetadataKey::from_bytes(name.to_ascii_lowercase().as_bytes()).map_err(|e| {
            TransportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
        let value = MetadataValue::try_from(value.as_str()).map_err(|e| {
            TransportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
        metadata.insert(key, value);
    }
    Ok(metadata)
}

#[cfg(feature = "http")]
fn build_http_exporter(config: &GeneratorConfig) -> Result<LogExporter, TransportError> {
    use opentelemetry_otlp::{Protocol as WireProtocol, WithExportConfig, WithHttpConfig};

    let headers = config.headers.iter().cloned().collect();

    LogExporter::builder()
        .with_http()
        .with_protocol(WireProtocol::HttpBinary)
        .with_endpoint(config.endpoint())
        .with_timeout(config.export_timeout)
        .with_headers(headers)
        .build()
        .map_err(|e| TransportError::Build {
            protocol: Protocol::Http,
            reason: e.to_string(),
        })
}

#[cfg(not(feature = "http"))]
fn build_http_exporter(_config: &GeneratorConfig) -> Result<LogExporter, TransportError> {
    Err(TransportError::MissingCapability {
        protocol: Protocol::Http,
        feature: Protocol::Http.feature(),
    })
}

/// OTLP transport backed by the OpenTelemetry SDK logger provider.
///
/// The session resource is attached to the provider once, so it travels with
/// every export request rather than with every record.
pub struct OtlpTransport {
    protocol: Protocol,
    endpoint: String,
    provider: SdkLoggerProvider,
}

impl OtlpTransport {
    pub fn new(
        selected: SelectedExporter,
        resource: &ResourceDescriptor,
        config: &GeneratorConfig,
    ) -> Self {
        // The SDK processor must only export from force_flush, the one path that
        // returns the export result. Its size trigger sits above the largest
        // dispatcher batch and its timer never fires within a run.
        let sdk_batch_size = config.max_batch_size + 1;
        let batch_config = BatchConfigBuilder::default()
            .with_max_queue_size(sdk_batch_size)
            .with_max_export_batch_size(sdk_batch_size)
            .with_scheduled_delay(SDK_SCHEDULED_DELAY)
            .build();

        let processor = BatchLogProcessor::builder(selected.exporter)
            .with_batch_config(batch_config)
            .build();

        let provider = SdkLoggerProvider::builder()
            .with_resource(resource.to_resource())
            .with_log_processor(processor)
            .build();

        Self {
            protocol: selected.protocol,
            endpoint: selected.endpoint,
            provider,
        }
    }
}

fn emit_record(logger: &SdkLogger, record: LogRecord) {
    let mut log_record = logger.create_log_record();

    log_record.set_timestamp(record.timestamp);
    log_record.set_observed_timestamp(SystemTime::now());
    log_record.set_severity_number(record.severity.to_otel_severity());
    log_record.set_severity_text(record.severity.as_str());
    log_record.set_body(AnyValue::from(record.message));

    for (key, value) in record.attributes {
        log_record.add_attribute(key, AnyValue::from(value));
    }

    logger.emit(log_record);
}

impl LogTransport for OtlpTransport {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn export(&self, batch: Vec<LogRecord>) -> Result<(), DeliveryError> {
        let records = batch.len();
        let provider = self.provider.clone();

        // The SDK processor blocks on flush; keep it off the async workers
        let result = tokio::task::spawn_blocking(move || {
            let logger = provider.logger(SCOPE_NAME);
            for record in batch {
                emit_record(&logger, record);
            }
            provider.force_flush()
        })
        .await
        .map_err(|e| DeliveryError {
            records,
            reason: e.to_string(),
        })?;

        result.map_err(|e| DeliveryError {
            records,
            reason: e.to_string(),
        })?;

        debug!(records, endpoint = %self.endpoint, "Exported batch");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), DeliveryError> {
        let provider = self.provider.clone();

        tokio::task::spawn_blocking(move || provider.shutdown())
            .await
            .map_err(|e| DeliveryError {
                records: 0,
                reason: e.to_string(),
            })?
            .map_err(|e| DeliveryError {
                records: 0,
                reason: e.to_string(),
            })
    }
}
