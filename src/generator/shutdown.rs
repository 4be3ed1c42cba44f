//! Guaranteed terminal flush around the emission loop.
//!
//! [`ShutdownCoordinator`] owns the [`Session`] for the length of the run.
//! Whether emission completes, is interrupted, returns an error or panics,
//! the coordinator closes the session exactly once. Closing consumes the
//! session, so a second flush is not expressible.

use std::future::Future;

use tracing::{error, info, warn};

use crate::generator::dispatcher::RecordSink;
use crate::generator::emitter::EmissionSummary;
use crate::generator::error::EmitError;
use crate::generator::session::Session;

pub const EXIT_OK: u8 = 0;
pub const EXIT_DELIVERY_FAILED: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;

/// Final account of a run, produced after the terminal flush
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Records accepted by the dispatcher
    pub emitted: u64,
    pub delivered: u64,
    pub failed: u64,
    pub interrupted: bool,
    pub emission_error: Option<String>,
    pub flush_error: Option<String>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.failed == 0
            && self.delivered == self.emitted
            && self.emission_error.is_none()
            && self.flush_error.is_none()
    }

    pub fn exit_status(&self) -> u8 {
        if self.is_success() {
            EXIT_OK
        } else {
            EXIT_DELIVERY_FAILED
        }
    }
}

pub struct ShutdownCoordinator {
    session: Session,
}

impl ShutdownCoordinator {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Run `emission` against the session's sink, then flush and close.
    ///
    /// Emission runs on its own task so that a panic inside it is observed
    /// here instead of unwinding past the flush.
    pub async fn run<F, Fut>(self, emission: F) -> RunOutcome
    where
        F: FnOnce(RecordSink) -> Fut,
        Fut: Future<Output = Result<EmissionSummary, EmitError>> + Send + 'static,
    {
        let task = tokio::spawn(emission(self.session.sink()));

        let mut outcome = RunOutcome::default();
        match task.await {
            Ok(Ok(summary)) => {
                outcome.interrupted = summary.interrupted;
                if summary.interrupted {
                    info!(emitted = summary.emitted, "Emission interrupted");
                } else {
                    info!(emitted = summary.emitted, "Emission complete");
                }
            }
            Ok(Err(e)) => {
                error!(error = %e, "Emission failed");
                outcome.emission_error = Some(e.to_string());
            }
            Err(e) => {
                error!(error = %e, "Emission task aborted");
                outcome.emission_error = Some(e.to_string());
            }
        }

        info!("Flushing buffered records");
        match self.session.close().await {
            Ok(report) => {
                outcome.emitted = report.accepted;
                outcome.delivered = report.delivered;
                outcome.failed = report.failed;
                if report.failed > 0 {
                    warn!(
                        failed = report.failed,
                        last_error = report.last_error.as_deref().unwrap_or_default(),
                        "Some records were not delivered"
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "Terminal flush failed");
                outcome.flush_error = Some(e.to_string());
            }
        }

        outcome
    }
}
