//! Error types used by the jobvisor dispatch core and by executors.
//!
//! This module defines three enums:
//!
//! - [`DispatchError`]: why a trigger was rejected by the dispatcher or a job queue.
//! - [`ExecutionError`]: failures raised by executor logic (captured as data, never propagated).
//! - [`RuntimeError`]: errors raised by the runtime itself (shutdown).
//!
//! All types provide `as_label` for logs/metrics. The `Display` text of
//! [`DispatchError`] is the human-readable rejection reason returned to the scheduler.

use std::time::Duration;
use thiserror::Error;

use crate::trigger::BlockStrategy;

/// # Rejections produced by the dispatcher.
///
/// Every variant is returned synchronously to the caller of
/// [`Dispatcher::dispatch`](crate::Dispatcher::dispatch); none of them is fatal for the dispatcher.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No executor is registered for the requested logic kind.
    #[error("logic kind [{kind}] is not supported")]
    UnsupportedLogicKind {
        /// The logic kind carried by the trigger.
        kind: String,
    },

    /// `DISCARD_LATER` is in effect and a previous trigger is still pending or running.
    #[error("block strategy effect: {strategy}")]
    BlockedByStrategy {
        /// The strategy that caused the rejection.
        strategy: BlockStrategy,
    },

    /// The create/replace race for this job was lost on every attempt.
    #[error("registration conflict for job {job_id} after {attempts} attempts")]
    RegistrationConflict {
        /// Job identity.
        job_id: i32,
        /// Number of routing attempts made.
        attempts: usize,
    },

    /// The job queue has been stopped and accepts no more work.
    #[error("job queue {job_id} stopped")]
    QueueStopped {
        /// Job identity.
        job_id: i32,
    },

    /// A trigger with the same id is already pending or running in this queue.
    #[error("repeat trigger {trigger_id} for job {job_id}")]
    DuplicateTrigger {
        /// Job identity.
        job_id: i32,
        /// Duplicated trigger id.
        trigger_id: i64,
    },

    /// The dispatcher is shutting down and accepts no new triggers.
    #[error("dispatcher is shutting down")]
    ShuttingDown,
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::DispatchError;
    ///
    /// let err = DispatchError::QueueStopped { job_id: 7 };
    /// assert_eq!(err.as_label(), "queue_stopped");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::UnsupportedLogicKind { .. } => "unsupported_logic_kind",
            DispatchError::BlockedByStrategy { .. } => "blocked_by_strategy",
            DispatchError::RegistrationConflict { .. } => "registration_conflict",
            DispatchError::QueueStopped { .. } => "queue_stopped",
            DispatchError::DuplicateTrigger { .. } => "duplicate_trigger",
            DispatchError::ShuttingDown => "shutting_down",
        }
    }
}

/// # Errors produced by executor logic.
///
/// These never reach the dispatch caller. The job queue captures them into a
/// [`ResultRecord`](crate::ResultRecord) with [`Outcome::Failed`](crate::Outcome::Failed).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The job logic failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The job logic observed cancellation and exited early.
    #[error("execution cancelled")]
    Canceled,

    /// The job logic panicked.
    #[error("executor panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },
}

impl ExecutionError {
    /// Shorthand for [`ExecutionError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ExecutionError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutionError::Fail { .. } => "execution_failed",
            ExecutionError::Canceled => "execution_canceled",
            ExecutionError::Panicked { .. } => "execution_panicked",
        }
    }
}

/// # Errors produced by the jobvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some job queues were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck jobs: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Job ids whose run loop did not finish in time.
        stuck: Vec<i32>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_reason_names_the_strategy() {
        let err = DispatchError::BlockedByStrategy {
            strategy: BlockStrategy::DiscardLater,
        };
        assert_eq!(err.to_string(), "block strategy effect: DISCARD_LATER");
    }

    #[test]
    fn unsupported_kind_reason() {
        let err = DispatchError::UnsupportedLogicKind {
            kind: "GLUE_SHELL".into(),
        };
        assert_eq!(err.to_string(), "logic kind [GLUE_SHELL] is not supported");
        assert_eq!(err.as_label(), "unsupported_logic_kind");
    }
}
