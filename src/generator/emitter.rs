//! Synthetic record generation.

use std::time::{Duration, SystemTime};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tracing::info;

use crate::generator::config::GeneratorConfig;
use crate::generator::dispatcher::RecordSink;
use crate::generator::error::EmitError;
use crate::generator::record::{AttributeValue, LogRecord, Severity};

/// Representative severity/message pairs, at least one per level.
pub const CATALOG: &[(Severity, &str)] = &[
    (Severity::Info, "Application started successfully"),
    (Severity::Info, "Connecting to database"),
    (Severity::Debug, "Database connection pool initialized"),
    (Severity::Info, "Processing user request"),
    (Severity::Warning, "High memory usage detected"),
    (Severity::Error, "Failed to connect to external API"),
    (Severity::Info, "Retrying connection..."),
    (Severity::Info, "Successfully processed request"),
    (Severity::Debug, "Cache hit for key: user_123"),
    (Severity::Info, "Request completed in 245ms"),
    (Severity::Trace, "Detailed trace information"),
    (Severity::Fatal, "Critical system failure"),
];

pub const ENDPOINTS: &[&str] = &["/api/users", "/api/products", "/api/orders"];
pub const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];
pub const STATUS_CODES: &[i64] = &[200, 201, 400, 404, 500];

/// Attribute keys present on every record
pub const ATTRIBUTE_KEYS: [&str; 6] = [
    "request_id",
    "user_id",
    "latency_ms",
    "endpoint",
    "method",
    "status_code",
];

const USER_ID_RANGE: std::ops::RangeInclusive<u32> = 100..=999;
const LATENCY_MS_RANGE: std::ops::RangeInclusive<i64> = 10..=500;

/// How the emission loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmissionSummary {
    pub emitted: usize,
    pub interrupted: bool,
}

pub struct RecordEmitter {
    count: usize,
    interval: Duration,
    rng: StdRng,
}

impl RecordEmitter {
    pub fn new(count: usize, interval: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            count,
            interval,
            rng,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.record_count, config.emit_interval, config.seed)
    }

    /// Build the record with sequence number `index`
    pub fn next_record(&mut self, index: usize) -> LogRecord {
        let (severity, message) = *CATALOG
            .choose(&mut self.rng)
            .unwrap_or(&(Severity::Info, "Processing user request"));

        let user_id = self.rng.gen_range(USER_ID_RANGE);
        let latency_ms = self.rng.gen_range(LATENCY_MS_RANGE);
        let endpoint = pick(&mut self.rng, ENDPOINTS);
        let method = pick(&mut self.rng, METHODS);
        let status_code = STATUS_CODES.choose(&mut self.rng).copied().unwrap_or(200);

        LogRecord {
            severity,
            message: message.to_string(),
            attributes: vec![
                (
                    "request_id",
                    AttributeValue::String(request_id(index)),
                ),
                ("user_id", AttributeValue::String(format!("user_{user_id}"))),
                ("latency_ms", AttributeValue::Int(latency_ms)),
                ("endpoint", AttributeValue::String(endpoint.to_string())),
                ("method", AttributeValue::String(method.to_string())),
                ("status_code", AttributeValue::Int(status_code)),
            ],
            timestamp: SystemTime::now(),
        }
    }

    /// Emit up to `count` records into `sink`, pausing `interval` between them.
    ///
    /// A `true` on `shutdown` ends the loop early; the records already
    /// submitted stay with the dispatcher.
    pub async fn run(
        mut self,
        sink: RecordSink,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<EmissionSummary, EmitError> {
        let mut emitted = 0;

        for index in 0..self.count {
            let stop = *shutdown.borrow();
            if stop {
                return Ok(EmissionSummary {
                    emitted,
                    interrupted: true,
                });
            }

            let record = self.next_record(index);
            let severity = record.severity;
            let message = record.message.clone();
            let request_id = request_id(index);

            sink.submit(record)
                .await
                .map_err(|source| EmitError::Rejected { index, source })?;
            emitted += 1;

            info!(
                request_id = %request_id,
                severity = %severity,
                body = %message,
                "Sent"
            );

            if index + 1 < self.count {
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    _ = stop_requested(&mut shutdown) => {
                        return Ok(EmissionSummary { emitted, interrupted: true });
                    }
                }
            }
        }

        Ok(EmissionSummary {
            emitted,
            interrupted: false,
        })
    }
}

/// Resolves once a stop is signalled. A dropped sender never signals.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn pick<'a>(rng: &mut StdRng, choices: &[&'a str]) -> &'a str {
    choices.choose(rng).copied().unwrap_or_default()
}

/// Zero-padded sequential id, e.g. `req_0007`
fn request_id(index: usize) -> String {
    format!("req_{index:04}")
}
