//! # Trigger request.
//!
//! Defines [`TriggerRequest`], one instance of "run job X once" sent by the scheduler.
//! A request is immutable once built; ownership moves into the job queue that accepts it.

use std::sync::Arc;

use super::strategy::BlockStrategy;

/// One incoming trigger.
///
/// ## Example
/// ```rust
/// use jobvisor::{BlockStrategy, TriggerRequest};
///
/// let t = TriggerRequest::new(1, 100, "BEAN", BlockStrategy::Serial, "--full");
/// assert_eq!(t.job_id(), 1);
/// assert_eq!(t.trigger_id(), 100);
/// assert_eq!(t.logic_kind(), "BEAN");
/// assert_eq!(t.payload(), "--full");
/// ```
#[derive(Clone, Debug)]
pub struct TriggerRequest {
    job_id: i32,
    trigger_id: i64,
    logic_kind: Arc<str>,
    block_strategy: BlockStrategy,
    payload: Arc<str>,
}

impl TriggerRequest {
    /// Creates a trigger request.
    ///
    /// ### Parameters
    /// - `job_id`: job identity (registry key)
    /// - `trigger_id`: scheduler-assigned id of this trigger (echoed in the result record)
    /// - `logic_kind`: key selecting the executor
    /// - `block_strategy`: policy applied when the job is busy
    /// - `payload`: opaque parameters handed to the executor
    pub fn new(
        job_id: i32,
        trigger_id: i64,
        logic_kind: impl Into<Arc<str>>,
        block_strategy: BlockStrategy,
        payload: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            job_id,
            trigger_id,
            logic_kind: logic_kind.into(),
            block_strategy,
            payload: payload.into(),
        }
    }

    /// Returns the job identity.
    pub fn job_id(&self) -> i32 {
        self.job_id
    }

    /// Returns the trigger id.
    pub fn trigger_id(&self) -> i64 {
        self.trigger_id
    }

    /// Returns the logic kind.
    pub fn logic_kind(&self) -> &str {
        &self.logic_kind
    }

    /// Returns the block strategy.
    pub fn block_strategy(&self) -> BlockStrategy {
        self.block_strategy
    }

    /// Returns the opaque payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub(crate) fn payload_arc(&self) -> Arc<str> {
        Arc::clone(&self.payload)
    }
}
