use tracing::info;

use crate::generator::config::{GeneratorConfig, Protocol};
use crate::generator::dispatcher::{BatchDispatcher, DeliveryReport, DispatcherSettings, RecordSink};
use crate::generator::error::DispatchError;
use crate::generator::resource::ResourceDescriptor;
use crate::generator::transport::{LogTransport, OtlpTransport, SelectedExporter};

/// One process run: the resource identity, the bound transport and the
/// dispatcher feeding it.
pub struct Session {
    resource: ResourceDescriptor,
    protocol: Protocol,
    endpoint: String,
    dispatcher: BatchDispatcher,
}

impl Session {
    /// Start a session over any transport
    pub fn new<T: LogTransport>(
        resource: ResourceDescriptor,
        transport: T,
        settings: DispatcherSettings,
    ) -> Self {
        let protocol = transport.protocol();
        let endpoint = transport.endpoint().to_string();
        let dispatcher = BatchDispatcher::spawn(transport, settings);

        info!(
            service = resource.service_name(),
            protocol = %protocol,
            endpoint = %endpoint,
            "Session started"
        );

        Self {
            resource,
            protocol,
            endpoint,
            dispatcher,
        }
    }

    /// Start a session exporting through OTLP. The resource is built here and
    /// bound to the exporter, so no other session can share it.
    pub fn open(config: &GeneratorConfig, selected: SelectedExporter) -> Self {
        let resource = ResourceDescriptor::from_config(config);
        let transport = OtlpTransport::new(selected, &resource, config);
        Self::new(resource, transport, DispatcherSettings::from_config(config))
    }

    pub fn resource(&self) -> &ResourceDescriptor {
        &self.resource
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn sink(&self) -> RecordSink {
        self.dispatcher.sink()
    }

    pub async fn flush(&self) -> Result<(), DispatchError> {
        self.dispatcher.flush().await
    }

    /// Terminal flush and release of the transport
    pub async fn close(self) -> Result<DeliveryReport, DispatchError> {
        info!(endpoint = %self.endpoint, "Closing session");
        self.dispatcher.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::generator::record::{LogRecord, Severity};
    use crate::generator::transport::recording::RecordingTransport;

    fn record() -> LogRecord {
        LogRecord {
            severity: Severity::Warning,
            message: "High memory usage detected".to_string(),
            attributes: Vec::new(),
            timestamp: SystemTime::now(),
        }
    }

    fn settings() -> DispatcherSettings {
        DispatcherSettings {
            max_batch_size: 10,
            max_queue_size: 10,
            flush_interval: Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn session_reports_bound_transport() {
        let config = GeneratorConfig::new("svc", "1.0");
        let session = Session::new(
            ResourceDescriptor::from_config(&config),
            RecordingTransport::new(Protocol::Http),
            settings(),
        );

        assert_eq!(session.protocol(), Protocol::Http);
        assert_eq!(session.endpoint(), "http://localhost:4318/v1/logs");
        assert_eq!(session.resource().service_name(), "svc");
        session.close().await.unwrap();
    }

    #[cfg(feature = "grpc")]
    #[tokio::test]
    async fn open_binds_config_identity_to_selected_exporter() {
        use crate::generator::transport::TransportSelector;

        let config = GeneratorConfig::new("svc", "2.0").with_endpoint("http://collector:4317");
        let selected = TransportSelector::default().select(&config).unwrap();

        let session = Session::open(&config, selected);

        assert_eq!(session.protocol(), Protocol::Grpc);
        assert_eq!(session.endpoint(), "http://collector:4317");
        assert_eq!(session.resource().service_name(), "svc");
        let report = session.close().await.unwrap();
        assert_eq!(report.accepted, 0);
    }

    #[tokio::test]
    async fn close_delivers_buffered_records() {
        let config = GeneratorConfig::new("svc", "1.0");
        let transport = RecordingTransport::new(Protocol::Grpc);
        let session = Session::new(
            ResourceDescriptor::from_config(&config),
            transport.clone(),
            settings(),
        );

        session.sink().submit(record()).await.unwrap();
        session.sink().submit(record()).await.unwrap();
        let report = session.close().await.unwrap();

        assert_eq!(report.delivered, 2);
        assert_eq!(transport.records().len(), 2);
        assert_eq!(transport.shutdown_calls(), 1);
    }

    #[tokio::test]
    async fn flush_keeps_session_open() {
        let config = GeneratorConfig::new("svc", "1.0");
        let transport = RecordingTransport::new(Protocol::Grpc);
        let session = Session::new(
            ResourceDescriptor::from_config(&config),
            transport.clone(),
            settings(),
        );

        session.sink().submit(record()).await.unwrap();
        session.flush().await.unwrap();
        session.sink().submit(record()).await.unwrap();
        session.close().await.unwrap();

        assert_eq!(transport.batch_sizes(), vec![1, 1]);
        assert_eq!(transport.shutdown_calls(), 1);
    }
}
