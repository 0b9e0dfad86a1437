//! # LogWriter: events as `tracing` records
//!
//! A subscriber that turns every [`Event`] into one structured `tracing` record.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output (fmt)
//! ```text
//! INFO jobvisor: trigger accepted job_id=1 trigger_id=42 route="created"
//! WARN jobvisor: trigger rejected job_id=1 trigger_id=43 reason="block strategy effect: DISCARD_LATER"
//! INFO jobvisor: execution succeeded job_id=1 trigger_id=42 executor="demo"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let job_id = e.job_id;
        let trigger_id = e.trigger_id;
        let executor = e.executor.as_deref();
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::TriggerAccepted => {
                tracing::info!(?job_id, ?trigger_id, route = ?reason, "trigger accepted");
            }
            EventKind::TriggerRejected => {
                tracing::warn!(?job_id, ?trigger_id, ?reason, "trigger rejected");
            }
            EventKind::TriggerDiscarded => {
                tracing::warn!(?job_id, ?trigger_id, ?reason, "trigger discarded");
            }
            EventKind::ExecutionStarting => {
                tracing::debug!(?job_id, ?trigger_id, ?executor, "execution starting");
            }
            EventKind::ExecutionSucceeded => {
                tracing::info!(?job_id, ?trigger_id, ?executor, "execution succeeded");
            }
            EventKind::ExecutionFailed => {
                tracing::warn!(?job_id, ?trigger_id, ?executor, ?reason, "execution failed");
            }
            EventKind::QueueCreated => {
                tracing::info!(?job_id, ?executor, "job queue created");
            }
            EventKind::QueueReplaced => {
                tracing::info!(?job_id, ?executor, "job queue replaced");
            }
            EventKind::QueueStopped => {
                tracing::info!(?job_id, ?reason, "job queue stopped");
            }
            EventKind::QueueFaulted => {
                tracing::error!(?job_id, ?reason, "job queue faulted");
            }
            EventKind::ResultDropped => {
                tracing::warn!(?job_id, ?trigger_id, ?reason, "result dropped");
            }
            EventKind::ReportFailed => {
                tracing::warn!(?reason, "result report failed");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(?reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(?reason, "subscriber panicked");
            }
            EventKind::ShutdownRequested => {
                tracing::info!("shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!("all job queues stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::warn!("grace exceeded");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
