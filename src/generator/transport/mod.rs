//! Transport selection and the seam the dispatcher sends through.
//!
//! Each OTLP transport is a capability compiled in through a cargo feature
//! (`grpc`, `http`). [`TransportSelector`] negotiates the requested protocol
//! against the available [`Capabilities`] and fails fast with
//! [`TransportError::MissingCapability`] instead of falling back to the other
//! protocol.

pub mod otlp;

#[cfg(test)]
pub(crate) mod recording;

use std::future::Future;

use opentelemetry_otlp::LogExporter;
use tracing::info;

use crate::generator::config::{GeneratorConfig, Protocol};
use crate::generator::error::{DeliveryError, TransportError};
use crate::generator::record::LogRecord;

pub use otlp::OtlpTransport;

/// Destination for batches of records.
///
/// Only the dispatcher calls [`LogTransport::export`]; only the session's
/// terminal flush calls [`LogTransport::shutdown`].
pub trait LogTransport: Send + Sync + 'static {
    fn protocol(&self) -> Protocol;

    fn endpoint(&self) -> &str;

    /// Hand one ordered batch to the wire. Retries are the transport's business.
    fn export(
        &self,
        batch: Vec<LogRecord>,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// Flush anything still held and release connections
    fn shutdown(&self) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Set of transports this binary can construct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    grpc: bool,
    http: bool,
}

impl Capabilities {
    /// Capabilities enabled by cargo features at build time
    pub const fn compiled() -> Self {
        Self {
            grpc: cfg!(feature = "grpc"),
            http: cfg!(feature = "http"),
        }
    }

    pub const fn none() -> Self {
        Self {
            grpc: false,
            http: false,
        }
    }

    pub fn with(mut self, protocol: Protocol) -> Self {
        match protocol {
            Protocol::Grpc => self.grpc = true,
            Protocol::Http => self.http = true,
        }
        self
    }

    pub fn supports(&self, protocol: Protocol) -> bool {
        match protocol {
            Protocol::Grpc => self.grpc,
            Protocol::Http => self.http,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::compiled()
    }
}

/// An exporter bound to its endpoint. No connection is opened until first send.
pub struct SelectedExporter {
    pub protocol: Protocol,
    pub endpoint: String,
    pub exporter: LogExporter,
}

impl std::fmt::Debug for SelectedExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedExporter")
            .field("protocol", &self.protocol)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransportSelector {
    capabilities: Capabilities,
}

impl TransportSelector {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Check that `protocol` can be constructed, without building anything
    pub fn require(&self, protocol: Protocol) -> Result<(), TransportError> {
        if self.capabilities.supports(protocol) {
            Ok(())
        } else {
            Err(TransportError::MissingCapability {
                protocol,
                feature: protocol.feature(),
            })
        }
    }

    /// Build the exporter for the configured protocol
    pub fn select(&self, config: &GeneratorConfig) -> Result<SelectedExporter, TransportError> {
        let protocol = config.protocol;
        self.require(protocol)?;

        let exporter = otlp::build_exporter(config)?;
        let endpoint = config.endpoint().to_string();

        info!(protocol = %protocol, endpoint = %endpoint, "Selected OTLP transport");

        Ok(SelectedExporter {
            protocol,
            endpoint,
            exporter,
        })
    }
}
