//! Synthetic log record model.

use std::fmt;
use std::time::SystemTime;

use opentelemetry::logs::{AnyValue, Severity as OtelSeverity};

/// Record severity, ordered from least to most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Fatal,
    ];

    /// Severity text carried on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// Convert to OpenTelemetry Severity.
    pub fn to_otel_severity(self) -> OtelSeverity {
        match self {
            Self::Trace => OtelSeverity::Trace,
            Self::Debug => OtelSeverity::Debug,
            Self::Info => OtelSeverity::Info,
            Self::Warning => OtelSeverity::Warn,
            Self::Error => OtelSeverity::Error,
            Self::Fatal => OtelSeverity::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    Int(i64),
}

impl AttributeValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<AttributeValue> for AnyValue {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::String(s) => AnyValue::from(s),
            AttributeValue::Int(n) => AnyValue::Int(n),
        }
    }
}

/// One emitted log record. Immutable once handed to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    pub attributes: Vec<(&'static str, AttributeValue)>,
    pub timestamp: SystemTime,
}

impl LogRecord {
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }
}
