//! # Example: dispatch
//!
//! Demonstrates the full trigger path with the built-in `LogWriter`.
//!
//! Shows how to:
//! - Register executors by logic kind.
//! - Dispatch triggers and read the [`Route`] they took.
//! - Answer idle beats and remove a job.
//! - Shut down with a grace period.
//!
//! ## Flow
//! ```text
//! dispatch(job 1, "HELLO") ──► Created ──► JobQueue(1) ──► executor "hello"
//! dispatch(job 1, "HELLO") ──► Enqueued
//! dispatch(job 1, "SLEEPY") ─► Replaced (executor changed, old queue stopped)
//! idle_beat(1) ──► Busy;  remove_job(1) ──► true;  idle_beat(1) ──► Idle
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example dispatch --features logging
//! ```

use std::{sync::Arc, time::Duration};

use jobvisor::{
    BlockStrategy, Dispatcher, DispatcherConfig, ExecutionError, ExecutorFn, ExecutorRegistry,
    Invocation, LogWriter, ResultRecord, ResultSink, Subscribe, TriggerRequest,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Prints every record; stands in for the callback to the scheduler.
struct PrintSink;

impl ResultSink for PrintSink {
    fn submit(&self, record: ResultRecord) {
        println!(
            "[result] job={} trigger={} outcome={} detail={:?}",
            record.job_id, record.trigger_id, record.outcome, record.detail
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let hello = ExecutorFn::arc("hello", |inv: Invocation, _ctx: CancellationToken| async move {
        Ok::<_, ExecutionError>(format!("hello, {}", inv.payload))
    });
    let sleepy = ExecutorFn::arc("sleepy", |_inv: Invocation, ctx: CancellationToken| async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(200)) => Ok("slept".to_string()),
            _ = ctx.cancelled() => Err(ExecutionError::Canceled),
        }
    });

    let mut cfg = DispatcherConfig::default();
    cfg.grace = Duration::from_secs(2);

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let dispatcher = Dispatcher::builder(cfg)
        .with_executors(
            ExecutorRegistry::new()
                .with_executor("HELLO", hello)
                .with_executor("SLEEPY", sleepy),
        )
        .with_sink(Arc::new(PrintSink))
        .with_subscribers(subs)
        .build();

    for (trigger_id, kind) in [(1, "HELLO"), (2, "HELLO"), (3, "SLEEPY")] {
        let trigger = TriggerRequest::builder(1, trigger_id, kind)
            .with_block_strategy(BlockStrategy::Serial)
            .with_payload("world")
            .build();
        let accepted = dispatcher.dispatch(trigger)?;
        println!("[dispatch] trigger={trigger_id} route={:?}", accepted.route);
    }

    let unknown = TriggerRequest::builder(2, 10, "GLUE_SHELL").build();
    if let Err(e) = dispatcher.dispatch(unknown) {
        println!("[dispatch] rejected: {e}");
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("[idle-beat] {:?}", dispatcher.idle_beat(1));
    println!("[remove] {}", dispatcher.remove_job(1));
    println!("[idle-beat] {:?}", dispatcher.idle_beat(1));

    dispatcher.shutdown().await?;
    Ok(())
}
