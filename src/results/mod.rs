//! # Execution results and their hand-off to the scheduler.
//!
//! - [`ResultRecord`], [`Outcome`] - what a job queue reports per trigger
//! - [`ResultSink`] - non-blocking hand-off consumed by job queues
//! - [`CallbackQueue`] - channel-backed sink that batches records to a [`Report`]er

mod callback;
mod record;
mod sink;

pub use callback::{CallbackConfig, CallbackQueue, Report};
pub use record::{Outcome, ResultRecord};
pub use sink::ResultSink;
