//! # Result sink.
//!
//! The outbound contract of a job queue: completed (or discarded) triggers are
//! handed over as [`ResultRecord`]s. `submit` must not block the caller; buffering,
//! backpressure and delivery retries belong to the sink.

use super::record::ResultRecord;

/// Non-blocking hand-off of result records.
///
/// ## Example
/// ```rust
/// use parking_lot::Mutex;
/// use jobvisor::{ResultRecord, ResultSink};
///
/// #[derive(Default)]
/// struct Collect(Mutex<Vec<ResultRecord>>);
///
/// impl ResultSink for Collect {
///     fn submit(&self, record: ResultRecord) {
///         self.0.lock().push(record);
///     }
/// }
/// ```
pub trait ResultSink: Send + Sync + 'static {
    /// Accepts a record for asynchronous delivery. Must return promptly.
    fn submit(&self, record: ResultRecord);
}
