//! # Runtime events emitted by the dispatcher and job queues.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Admission events**: what happened to an incoming trigger
//! - **Execution events**: one trigger running inside a job queue
//! - **Queue events**: job queue lifecycle in the registry
//! - **Runtime events**: result delivery, subscribers and shutdown
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use jobvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TriggerRejected)
//!     .with_job(7)
//!     .with_trigger(42)
//!     .with_reason("block strategy effect: DISCARD_LATER");
//!
//! assert_eq!(ev.kind, EventKind::TriggerRejected);
//! assert_eq!(ev.job_id, Some(7));
//! assert_eq!(ev.reason.as_deref(), Some("block strategy effect: DISCARD_LATER"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission events ===
    /// Trigger accepted into a job queue.
    ///
    /// Sets: `job_id`, `trigger_id`, `reason` (route taken).
    TriggerAccepted,

    /// Trigger rejected by the dispatcher.
    ///
    /// Sets: `job_id`, `trigger_id`, `reason` (rejection text).
    TriggerRejected,

    /// Pending trigger dropped without running (covered or queue stopped).
    ///
    /// Sets: `job_id`, `trigger_id`, `reason`.
    TriggerDiscarded,

    // === Execution events ===
    /// A trigger was promoted to running.
    ///
    /// Sets: `job_id`, `trigger_id`, `executor`.
    ExecutionStarting,

    /// Execution finished successfully.
    ///
    /// Sets: `job_id`, `trigger_id`, `executor`.
    ExecutionSucceeded,

    /// Execution failed (error, cancellation or panic).
    ///
    /// Sets: `job_id`, `trigger_id`, `executor`, `reason`.
    ExecutionFailed,

    // === Queue events ===
    /// A job queue was created and registered.
    ///
    /// Sets: `job_id`, `executor`.
    QueueCreated,

    /// A job queue was swapped for a new one bound to another executor.
    ///
    /// Sets: `job_id`, `executor` (the new one).
    QueueReplaced,

    /// A job queue was stopped.
    ///
    /// Sets: `job_id`, `reason`.
    QueueStopped,

    /// A job queue's run loop died outside executor code.
    ///
    /// Sets: `job_id`, `reason`.
    QueueFaulted,

    // === Runtime events ===
    /// A result record could not be buffered for delivery.
    ///
    /// Sets: `job_id`, `trigger_id`, `reason`.
    ResultDropped,

    /// The reporter failed to deliver a batch of result records.
    ///
    /// Sets: `reason`.
    ReportFailed,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (subscriber name and cause).
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (subscriber name and panic info).
    SubscriberPanicked,

    /// Shutdown requested.
    ShutdownRequested,

    /// All job queues stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some job queues did not stop in time.
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Job identity, if applicable.
    pub job_id: Option<i32>,
    /// Trigger id, if applicable.
    pub trigger_id: Option<i64>,
    /// Executor name, if applicable.
    pub executor: Option<Arc<str>>,
    /// Human-readable reason (errors, routes, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            job_id: None,
            trigger_id: None,
            executor: None,
            reason: None,
        }
    }

    /// Attaches a job id.
    #[inline]
    pub fn with_job(mut self, job_id: i32) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Attaches a trigger id.
    #[inline]
    pub fn with_trigger(mut self, trigger_id: i64) -> Self {
        self.trigger_id = Some(trigger_id);
        self
    }

    /// Attaches an executor name.
    #[inline]
    pub fn with_executor(mut self, name: impl Into<Arc<str>>) -> Self {
        self.executor = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::QueueCreated);
        let b = Event::new(EventKind::QueueCreated);
        assert!(b.seq > a.seq);
    }
}
