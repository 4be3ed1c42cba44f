//! Synthetic OTLP log generation.
//!
//! Builds a stream of representative log records and exports them to an
//! OTLP receiver over gRPC or HTTP, with batched delivery and a guaranteed
//! flush before exit.
//!
//! # Features
//!
//! - `grpc`: OTLP/gRPC transport (tonic)
//! - `http`: OTLP/HTTP transport (binary protobuf)
//!
//! Both are enabled by default. Requesting a transport that was not compiled
//! in fails at startup with [`TransportError::MissingCapability`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! let config = GeneratorConfig::from_env()?;
//! let (_stop, shutdown) = tokio::sync::watch::channel(false);
//! let outcome = generator::run(&config, shutdown).await?;
//! ```
//!
//! # Data Flow
//!
//! [`RecordEmitter`] → [`RecordSink`] → [`BatchDispatcher`] → [`LogTransport`].
//! The [`ResourceDescriptor`] is bound to the transport once per [`Session`];
//! [`ShutdownCoordinator`] wraps the run and owns the terminal flush.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OTEL_SERVICE_NAME` | Service name | `example-app` |
//! | `OTEL_SERVICE_VERSION` | Service version | `1.0.0` |
//! | `DEPLOYMENT_ENVIRONMENT` | `environment` resource attribute | `development` |
//! | `OTEL_EXPORTER_OTLP_PROTOCOL` | `grpc`, `http/protobuf` or `http` | `grpc` |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | Endpoint override | per protocol |
//! | `OTEL_EXPORTER_OTLP_HEADERS` | `key=value,...` request headers | - |
//! | `OTEL_EXPORTER_OTLP_TIMEOUT` | Export timeout in milliseconds | `10000` |
//! | `RUST_LOG` | Console log filter | `info` |
//! | `LOG_FORMAT` | `pretty` or `json` | `pretty` |

#![allow(dead_code, unused_imports)] // Public API - not all items used by the binary

pub mod api;
pub mod config;
pub mod console;
pub mod dispatcher;
pub mod emitter;
pub mod error;
pub mod record;
pub mod resource;
pub mod session;
pub mod shutdown;
pub mod transport;

// Re-exports
pub use api::{run, run_with_capabilities, run_with_transport};
pub use config::{GeneratorConfig, GeneratorConfigBuilder, LogFormat, Protocol};
pub use dispatcher::{BatchDispatcher, DeliveryReport, DispatcherSettings, RecordSink};
pub use emitter::{EmissionSummary, RecordEmitter};
pub use error::{
    ConfigError, DeliveryError, DispatchError, EmitError, GeneratorError, TransportError,
};
pub use record::{AttributeValue, LogRecord, Severity};
pub use resource::ResourceDescriptor;
pub use session::Session;
pub use shutdown::{RunOutcome, ShutdownCoordinator};
pub use transport::{Capabilities, LogTransport, OtlpTransport, SelectedExporter, TransportSelector};
