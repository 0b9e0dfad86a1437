//! # Trigger request builder.
//!
//! [`TriggerRequestBuilder`] assembles a [`TriggerRequest`]: job id, trigger id and
//! logic kind are required, block strategy and payload are optional.

use std::sync::Arc;

use crate::{BlockStrategy, TriggerRequest};

/// Builder for TriggerRequest with fluent API
#[derive(Clone, Debug)]
pub struct TriggerRequestBuilder {
    job_id: i32,
    trigger_id: i64,
    logic_kind: Arc<str>,
    block_strategy: BlockStrategy,
    payload: Arc<str>,
}

impl TriggerRequestBuilder {
    /// Creates a new builder for one trigger of the given job and logic kind.
    ///
    /// Defaults: `SERIAL_EXECUTION`, empty payload.
    pub fn new(job_id: i32, trigger_id: i64, logic_kind: impl Into<Arc<str>>) -> Self {
        Self {
            job_id,
            trigger_id,
            logic_kind: logic_kind.into(),
            block_strategy: BlockStrategy::default(),
            payload: Arc::from(""),
        }
    }

    /// Sets how the trigger interacts with a busy job queue.
    pub fn with_block_strategy(mut self, block_strategy: BlockStrategy) -> Self {
        self.block_strategy = block_strategy;
        self
    }

    /// Sets the opaque parameter string handed to the executor.
    pub fn with_payload(mut self, payload: impl Into<Arc<str>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Builds the immutable [`TriggerRequest`].
    pub fn build(self) -> TriggerRequest {
        TriggerRequest::new(
            self.job_id,
            self.trigger_id,
            self.logic_kind,
            self.block_strategy,
            self.payload,
        )
    }
}

impl TriggerRequest {
    /// Creates a builder for constructing TriggerRequest with fluent API
    pub fn builder(
        job_id: i32,
        trigger_id: i64,
        logic_kind: impl Into<Arc<str>>,
    ) -> TriggerRequestBuilder {
        TriggerRequestBuilder::new(job_id, trigger_id, logic_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serial_with_empty_payload() {
        let t = TriggerRequest::builder(3, 11, "demo").build();
        assert_eq!(t.job_id(), 3);
        assert_eq!(t.trigger_id(), 11);
        assert_eq!(t.block_strategy(), BlockStrategy::Serial);
        assert_eq!(t.payload(), "");
    }

    #[test]
    fn setters_override_defaults() {
        let t = TriggerRequest::builder(3, 12, "demo")
            .with_block_strategy(BlockStrategy::CoverEarly)
            .with_payload("limit=10")
            .build();
        assert_eq!(t.block_strategy(), BlockStrategy::CoverEarly);
        assert_eq!(t.payload(), "limit=10");
        assert_eq!(t.logic_kind(), "demo");
    }
}
