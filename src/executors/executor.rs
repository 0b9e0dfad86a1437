//! # Executor abstraction.
//!
//! An [`Executor`] is the opaque job logic selected by a trigger's logic kind.
//! It receives an [`Invocation`] and a [`CancellationToken`]; the token is cancelled
//! when the owning job queue is stopped, and implementors should check it to exit
//! cooperatively. The core never aborts a running execution.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutionError;

/// Parameters of one execution.
#[derive(Clone, Debug)]
pub struct Invocation {
    /// Job identity.
    pub job_id: i32,
    /// Trigger id assigned by the scheduler.
    pub trigger_id: i64,
    /// Opaque parameters from the trigger.
    pub payload: Arc<str>,
}

/// # Asynchronous, cancelable job logic.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use jobvisor::{ExecutionError, Executor, Invocation};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Executor for Echo {
///     fn name(&self) -> &str { "echo" }
///
///     async fn execute(&self, inv: Invocation, ctx: CancellationToken) -> Result<String, ExecutionError> {
///         if ctx.is_cancelled() {
///             return Err(ExecutionError::Canceled);
///         }
///         Ok(inv.payload.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    /// Returns a stable, human-readable executor name.
    fn name(&self) -> &str;

    /// Runs the job logic once.
    ///
    /// `Ok` carries an optional message for the result record; errors are captured
    /// as a failed outcome and never stop the job queue.
    async fn execute(
        &self,
        invocation: Invocation,
        ctx: CancellationToken,
    ) -> Result<String, ExecutionError>;
}

/// Shared handle to an executor.
pub type ExecutorRef = Arc<dyn Executor>;

/// Identity comparison of two executor handles (data pointer only).
pub(crate) fn same_executor(a: &ExecutorRef, b: &ExecutorRef) -> bool {
    Arc::ptr_eq(a, b)
}
