//! # Example: callback_queue
//!
//! Routes results through the built-in [`CallbackQueue`](jobvisor::CallbackQueue):
//! records are buffered and delivered in batches to a [`Report`] implementation,
//! which in a real agent would call back to the scheduler.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example callback_queue
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use jobvisor::{
    CallbackConfig, Dispatcher, DispatcherConfig, ExecutionError, ExecutorFn, ExecutorRegistry,
    Invocation, Report, ResultRecord, TriggerRequest,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct Scheduler;

#[async_trait]
impl Report for Scheduler {
    async fn report(&self, batch: Vec<ResultRecord>) -> anyhow::Result<()> {
        tracing::info!(size = batch.len(), "callback batch");
        for record in &batch {
            tracing::info!(
                job_id = record.job_id,
                trigger_id = record.trigger_id,
                outcome = %record.outcome,
                detail = %record.detail,
                "callback"
            );
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let flaky = ExecutorFn::arc("flaky", |inv: Invocation, _ctx: CancellationToken| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if inv.trigger_id % 3 == 0 {
            return Err(ExecutionError::fail("upstream unavailable"));
        }
        Ok(format!("trigger {} ok", inv.trigger_id))
    });

    let dispatcher = Dispatcher::builder(DispatcherConfig::default())
        .with_executors(ExecutorRegistry::new().with_executor("FLAKY", flaky))
        .with_callback(
            CallbackConfig {
                capacity: 128,
                batch_size: 4,
            },
            Arc::new(Scheduler),
        )
        .build();

    for job_id in 1..=3 {
        for trigger_id in 1..=4 {
            let trigger_id = i64::from(job_id) * 100 + trigger_id;
            let trigger = TriggerRequest::builder(job_id, trigger_id, "FLAKY").build();
            dispatcher.dispatch(trigger)?;
        }
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    // Flushes the callback queue once every job queue has stopped.
    dispatcher.shutdown().await?;
    Ok(())
}
