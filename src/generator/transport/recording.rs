//! In-memory transport used by tests to observe what reaches the wire.

use std::sync::{Arc, Mutex};

use crate::generator::config::Protocol;
use crate::generator::error::DeliveryError;
use crate::generator::record::LogRecord;
use crate::generator::transport::LogTransport;

#[derive(Debug, Default)]
struct RecordingState {
    batches: Vec<Vec<LogRecord>>,
    shutdown_calls: usize,
    failing: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordingTransport {
    protocol: Protocol,
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingTransport {
    pub(crate) fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            state: Arc::default(),
        }
    }

    /// A transport whose every export fails, as if the endpoint were unreachable
    pub(crate) fn failing(protocol: Protocol) -> Self {
        let transport = Self::new(protocol);
        transport.state.lock().unwrap().failing = true;
        transport
    }

    pub(crate) fn records(&self) -> Vec<LogRecord> {
        self.state
            .lock()
            .unwrap()
            .batches
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.state
            .lock()
            .unwrap()
            .batches
            .iter()
            .map(Vec::len)
            .collect()
    }

    pub(crate) fn shutdown_calls(&self) -> usize {
        self.state.lock().unwrap().shutdown_calls
    }
}

impl LogTransport for RecordingTransport {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn endpoint(&self) -> &str {
        self.protocol.default_endpoint()
    }

    async fn export(&self, batch: Vec<LogRecord>) -> Result<(), DeliveryError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(DeliveryError {
                records: batch.len(),
                reason: "endpoint unreachable".to_string(),
            });
        }
        state.batches.push(batch);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), DeliveryError> {
        self.state.lock().unwrap().shutdown_calls += 1;
        Ok(())
    }
}
