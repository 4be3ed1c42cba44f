use thiserror::Error;

use crate::generator::config::Protocol;
use crate::generator::shutdown::EXIT_CONFIG;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(
        "{protocol} transport is not available in this build; \
         rebuild with `cargo build --features {feature}` or select another protocol"
    )]
    MissingCapability {
        protocol: Protocol,
        feature: &'static str,
    },
    #[error("Failed to build {protocol} log exporter: {reason}")]
    Build { protocol: Protocol, reason: String },
    #[error("Invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// A batch the transport could not hand off.
#[derive(Debug, Clone, Error)]
#[error("Delivery of {records} record(s) failed: {reason}")]
pub struct DeliveryError {
    pub records: usize,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Dispatcher is closed and no longer accepts records")]
    Closed,
    #[error("{failed} record(s) were not delivered")]
    Delivery {
        failed: u64,
        #[source]
        source: DeliveryError,
    },
    #[error("Dispatcher worker terminated unexpectedly")]
    WorkerLost,
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Record {index} was rejected: {source}")]
    Rejected {
        index: usize,
        #[source]
        source: DispatchError,
    },
}

/// Failure to start a run. Emission and delivery failures after start are
/// reported through `RunOutcome` instead.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl GeneratorError {
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Transport(_) => EXIT_CONFIG,
        }
    }
}
