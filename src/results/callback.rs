//! # CallbackQueue: buffered result delivery
//!
//! [`CallbackQueue`] is a [`ResultSink`] backed by a bounded channel and one
//! worker task. The worker drains records in batches and hands each batch to a
//! [`Report`] implementation (the transport back to the scheduler).
//!
//! ## Diagram
//! ```text
//!  JobQueue ── submit(record) ──► [bounded queue] ──► worker ──► Report::report(batch)
//!                   │                                    └─► Err/panic → ReportFailed
//!                   └─► full/closed → ResultDropped
//! ```
//!
//! ## Rules
//! - `submit` never blocks; overflow drops the record and publishes `ResultDropped`.
//! - Records are delivered in submission order, at most `batch_size` per call.
//! - A failed batch is reported on the bus and not retried here.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};

use super::{record::ResultRecord, sink::ResultSink};

/// Delivers batches of result records to the scheduler.
#[async_trait]
pub trait Report: Send + Sync + 'static {
    /// Delivers one batch. Errors are published as `ReportFailed`.
    async fn report(&self, batch: Vec<ResultRecord>) -> anyhow::Result<()>;
}

/// Configuration for the callback queue.
#[derive(Clone, Debug)]
pub struct CallbackConfig {
    /// Capacity of the record buffer.
    ///
    /// When full, new records are dropped and `ResultDropped` is published.
    pub capacity: usize,

    /// Maximum records per [`Report::report`] call (min 1).
    pub batch_size: usize,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            batch_size: 64,
        }
    }
}

/// Channel-backed [`ResultSink`] with a batching delivery worker.
pub struct CallbackQueue {
    tx: Mutex<Option<mpsc::Sender<ResultRecord>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    bus: Bus,
}

impl CallbackQueue {
    /// Creates the queue and spawns its delivery worker.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn(cfg: CallbackConfig, reporter: Arc<dyn Report>, bus: Bus) -> Arc<Self> {
        let (tx, rx) = mpsc::channel::<ResultRecord>(cfg.capacity.max(1));
        let batch_size = cfg.batch_size.max(1);
        let worker = tokio::spawn(deliver(rx, reporter, batch_size, bus.clone()));

        Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            bus,
        })
    }

    /// Stops accepting records, delivers what is buffered and waits for the worker.
    pub async fn close(&self) {
        drop(self.tx.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }

    fn dropped(&self, record: &ResultRecord, reason: &'static str) {
        tracing::warn!(
            job_id = record.job_id,
            trigger_id = record.trigger_id,
            reason,
            "result record dropped"
        );
        self.bus.publish(
            Event::new(EventKind::ResultDropped)
                .with_job(record.job_id)
                .with_trigger(record.trigger_id)
                .with_reason(reason),
        );
    }
}

impl ResultSink for CallbackQueue {
    fn submit(&self, record: ResultRecord) {
        let res = match self.tx.lock().as_ref() {
            Some(tx) => tx.try_send(record),
            None => Err(mpsc::error::TrySendError::Closed(record)),
        };
        match res {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => self.dropped(&record, "full"),
            Err(mpsc::error::TrySendError::Closed(record)) => self.dropped(&record, "closed"),
        }
    }
}

/// Worker loop: wait for one record, drain up to `batch_size`, report.
async fn deliver(
    mut rx: mpsc::Receiver<ResultRecord>,
    reporter: Arc<dyn Report>,
    batch_size: usize,
    bus: Bus,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = Vec::with_capacity(batch_size);
        batch.push(first);
        while batch.len() < batch_size {
            match rx.try_recv() {
                Ok(record) => batch.push(record),
                Err(_) => break,
            }
        }

        let size = batch.len();
        let fut = reporter.report(batch);
        let reason = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => format!("batch of {size} failed: {e:#}"),
            Err(_) => format!("batch of {size} failed: reporter panicked"),
        };
        tracing::warn!(%reason, "result delivery failed");
        bus.publish(Event::new(EventKind::ReportFailed).with_reason(reason));
    }
}
