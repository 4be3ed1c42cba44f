//! Batching between the emitter and the transport.
//!
//! Records flow through a bounded channel into a single worker task that owns
//! the buffer and is the only caller of [`LogTransport::export`]. A full
//! channel applies backpressure to the emitter; records are never dropped.
//! The buffer is exported when it reaches `max_batch_size`, on every
//! `flush_interval` tick, on an explicit [`BatchDispatcher::flush`], and once
//! more on [`BatchDispatcher::shutdown`].

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::generator::config::GeneratorConfig;
use crate::generator::error::{DeliveryError, DispatchError};
use crate::generator::record::LogRecord;
use crate::generator::transport::LogTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    pub max_batch_size: usize,
    pub max_queue_size: usize,
    pub flush_interval: Duration,
}

impl DispatcherSettings {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            max_batch_size: config.max_batch_size.max(1),
            max_queue_size: config.max_queue_size.max(1),
            flush_interval: config.flush_interval,
        }
    }
}

/// Outcome of everything the dispatcher accepted over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub accepted: u64,
    pub delivered: u64,
    pub failed: u64,
    pub batches_sent: u64,
    pub batches_failed: u64,
    pub last_error: Option<String>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.delivered == self.accepted
    }
}

enum Command {
    Record(LogRecord),
    Flush(oneshot::Sender<Result<(), DeliveryError>>),
    Shutdown(oneshot::Sender<DeliveryReport>),
}

/// Cloneable handle the emitter submits records through
#[derive(Clone)]
pub struct RecordSink {
    tx: mpsc::Sender<Command>,
}

impl RecordSink {
    /// Queue a record, waiting for room if the queue is full
    pub async fn submit(&self, record: LogRecord) -> Result<(), DispatchError> {
        self.tx
            .send(Command::Record(record))
            .await
            .map_err(|_| DispatchError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct BatchDispatcher {
    tx: mpsc::Sender<Command>,
    worker: JoinHandle<()>,
}

impl BatchDispatcher {
    /// Spawn the worker task on the current tokio runtime
    pub fn spawn<T: LogTransport>(transport: T, settings: DispatcherSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.max_queue_size);
        let worker = Worker {
            transport,
            rx,
            buffer: Vec::with_capacity(settings.max_batch_size),
            settings,
            report: DeliveryReport::default(),
        };

        Self {
            tx,
            worker: tokio::spawn(worker.run()),
        }
    }

    pub fn sink(&self) -> RecordSink {
        RecordSink {
            tx: self.tx.clone(),
        }
    }

    /// Export whatever is buffered now and wait for the result
    pub async fn flush(&self) -> Result<(), DispatchError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .await
            .map_err(|_| DispatchError::Closed)?;

        response
            .await
            .map_err(|_| DispatchError::WorkerLost)?
            .map_err(|source| DispatchError::Delivery {
                failed: source.records as u64,
                source,
            })
    }

    /// Stop accepting records, deliver everything queued and release the transport.
    ///
    /// Consumes the dispatcher, so the terminal flush can only happen once.
    pub async fn shutdown(self) -> Result<DeliveryReport, DispatchError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Command::Shutdown(reply))
            .await
            .map_err(|_| DispatchError::WorkerLost)?;

        let report = response.await.map_err(|_| DispatchError::WorkerLost)?;
        self.worker.await.map_err(|_| DispatchError::WorkerLost)?;
        Ok(report)
    }
}

struct Worker<T> {
    transport: T,
    rx: mpsc::Receiver<Command>,
    buffer: Vec<LogRecord>,
    settings: DispatcherSettings,
    report: DeliveryReport,
}

impl<T: LogTransport> Worker<T> {
    async fn run(mut self) {
        let mut ticker = interval(self.settings.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(Command::Record(record)) => self.accept(record).await,
                    Some(Command::Flush(reply)) => {
                        let result = self.export_buffer().await;
                        let _ = reply.send(result);
                    }
                    Some(Command::Shutdown(reply)) => {
                        let report = self.terminate().await;
                        let _ = reply.send(report);
                        return;
                    }
                    None => {
                        warn!("Dispatcher dropped without shutdown, flushing remaining records");
                        self.terminate().await;
                        return;
                    }
                },
                _ = ticker.tick() => {
                    if !self.buffer.is_empty() {
                        let _ = self.export_buffer().await;
                    }
                }
            }
        }
    }

    async fn accept(&mut self, record: LogRecord) {
        self.report.accepted += 1;
        self.buffer.push(record);
        if self.buffer.len() >= self.settings.max_batch_size {
            let _ = self.export_buffer().await;
        }
    }

    /// Close the queue, drain it, export the remainder and shut the transport down
    async fn terminate(&mut self) -> DeliveryReport {
        self.rx.close();

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Record(record) => self.accept(record).await,
                Command::Flush(reply) => {
                    let result = self.export_buffer().await;
                    let _ = reply.send(result);
                }
                Command::Shutdown(reply) => {
                    let _ = reply.send(self.report.clone());
                }
            }
        }

        let _ = self.export_buffer().await;

        if let Err(e) = self.transport.shutdown().await {
            error!(error = %e, "Transport shutdown failed");
            self.report.last_error = Some(e.to_string());
        }

        debug!(
            accepted = self.report.accepted,
            delivered = self.report.delivered,
            failed = self.report.failed,
            "Dispatcher terminated"
        );
        self.report.clone()
    }

    async fn export_buffer(&mut self) -> Result<(), DeliveryError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let batch = std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.settings.max_batch_size),
        );
        let records = batch.len() as u64;

        match self.transport.export(batch).await {
            Ok(()) => {
                self.report.delivered += records;
                self.report.batches_sent += 1;
                debug!(records, "Batch delivered");
                Ok(())
            }
            Err(e) => {
                self.report.failed += records;
                self.report.batches_failed += 1;
                self.report.last_error = Some(e.to_string());
                warn!(
                    records,
                    endpoint = self.transport.endpoint(),
                    error = %e,
                    "Batch delivery failed"
                );
                Err(e)
            }
        }
    }
}
