//! # Result records.
//!
//! A [`ResultRecord`] closes out one trigger with its [`Outcome`]. Every accepted
//! trigger yields exactly one record, including triggers discarded before running.

use std::fmt;
use std::time::SystemTime;

/// Final outcome of one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The executor returned `Ok`.
    Succeeded,
    /// The executor failed, was cancelled or panicked.
    Failed,
    /// The trigger never ran (covered by a later trigger, or its queue stopped).
    Discarded,
}

impl Outcome {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Failed => "failed",
            Outcome::Discarded => "discarded",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Outcome of one trigger, handed to the [`ResultSink`](crate::ResultSink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    /// Job identity.
    pub job_id: i32,
    /// Trigger id the record answers.
    pub trigger_id: i64,
    /// Final outcome.
    pub outcome: Outcome,
    /// Executor message, failure text or discard reason.
    pub detail: String,
    /// When the record was produced.
    pub finished_at: SystemTime,
}

impl ResultRecord {
    /// Creates a record stamped with the current time.
    pub fn new(job_id: i32, trigger_id: i64, outcome: Outcome, detail: impl Into<String>) -> Self {
        Self {
            job_id,
            trigger_id,
            outcome,
            detail: detail.into(),
            finished_at: SystemTime::now(),
        }
    }

    /// Returns true if the executor returned `Ok`.
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }
}
