//! # Run a single execution of a trigger.
//!
//! Executes one trigger through its job queue's [`Executor`](crate::Executor),
//! publishes the terminal event and builds the [`ResultRecord`].
//!
//! ## Event flow
//! ```text
//! Success:
//!   executor.execute() → Ok(msg)  → publish ExecutionSucceeded → Outcome::Succeeded
//!
//! Failure / cancellation / panic:
//!   executor.execute() → Err(e)   → publish ExecutionFailed    → Outcome::Failed
//!   executor panics    → Panicked → publish ExecutionFailed    → Outcome::Failed
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event.
//! - Executor failures are data: they never escape this function.
//! - No timeout is applied; that belongs to the executor.

use std::any::Any;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::{
    error::ExecutionError,
    events::{Bus, Event, EventKind},
    executors::{ExecutorRef, Invocation},
    results::{Outcome, ResultRecord},
    trigger::TriggerRequest,
};

/// Executes `trigger` once and returns the record to hand to the result sink.
pub(crate) async fn execute_once(
    executor: &ExecutorRef,
    trigger: &TriggerRequest,
    ctx: CancellationToken,
    bus: &Bus,
) -> ResultRecord {
    let invocation = Invocation {
        job_id: trigger.job_id(),
        trigger_id: trigger.trigger_id(),
        payload: trigger.payload_arc(),
    };

    let fut = executor.execute(invocation, ctx);
    let res = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(ExecutionError::Panicked {
            info: panic_message(panic.as_ref()),
        }),
    };

    let ev = Event::new(EventKind::ExecutionSucceeded)
        .with_job(trigger.job_id())
        .with_trigger(trigger.trigger_id())
        .with_executor(executor.name());

    match res {
        Ok(msg) => {
            bus.publish(ev);
            ResultRecord::new(
                trigger.job_id(),
                trigger.trigger_id(),
                Outcome::Succeeded,
                msg,
            )
        }
        Err(e) => {
            let detail = e.to_string();
            bus.publish(Event {
                kind: EventKind::ExecutionFailed,
                ..ev.with_reason(detail.as_str())
            });
            ResultRecord::new(trigger.job_id(), trigger.trigger_id(), Outcome::Failed, detail)
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::ExecutorFn;
    use crate::trigger::BlockStrategy;

    fn trigger(payload: &str) -> TriggerRequest {
        TriggerRequest::new(3, 30, "A", BlockStrategy::Serial, payload)
    }

    #[tokio::test]
    async fn success_carries_executor_message() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let exec: ExecutorRef = ExecutorFn::arc(
            "echo",
            |inv: Invocation, _ctx: CancellationToken| async move {
                Ok::<_, ExecutionError>(format!("echo {}", inv.payload))
            },
        );

        let record = execute_once(&exec, &trigger("hi"), CancellationToken::new(), &bus).await;

        assert_eq!(record.outcome, Outcome::Succeeded);
        assert_eq!(record.detail, "echo hi");
        assert_eq!((record.job_id, record.trigger_id), (3, 30));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ExecutionSucceeded);
        assert_eq!(ev.executor.as_deref(), Some("echo"));
    }

    #[tokio::test]
    async fn failure_is_captured_as_outcome() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let exec: ExecutorRef = ExecutorFn::arc(
            "boom",
            |_inv: Invocation, _ctx: CancellationToken| async move {
                Err::<String, _>(ExecutionError::fail("disk full"))
            },
        );

        let record = execute_once(&exec, &trigger(""), CancellationToken::new(), &bus).await;

        assert_eq!(record.outcome, Outcome::Failed);
        assert_eq!(record.detail, "execution failed: disk full");
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ExecutionFailed);
    }

    #[tokio::test]
    async fn panic_is_captured_as_outcome() {
        let bus = Bus::new(8);
        let exec: ExecutorRef = ExecutorFn::arc(
            "panics",
            |_inv: Invocation, _ctx: CancellationToken| async move {
                if true {
                    panic!("bad payload");
                }
                Ok::<String, ExecutionError>(String::new())
            },
        );

        let record = execute_once(&exec, &trigger(""), CancellationToken::new(), &bus).await;

        assert_eq!(record.outcome, Outcome::Failed);
        assert_eq!(record.detail, "executor panicked: bad payload");
    }
}
