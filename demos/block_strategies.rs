//! # Example: block_strategies
//!
//! Shows how each block strategy arbitrates a trigger that arrives while the job is busy.
//!
//! ```text
//! SERIAL_EXECUTION ─► queued behind the running execution
//! DISCARD_LATER    ─► rejected while anything is pending or running
//! COVER_EARLY      ─► pending triggers are discarded, the new one takes their place
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example block_strategies
//! ```

use std::{sync::Arc, time::Duration};

use jobvisor::{
    BlockStrategy, Dispatcher, DispatcherConfig, ExecutionError, ExecutorFn, ExecutorRegistry,
    Invocation, ResultRecord, ResultSink, TriggerRequest,
};
use tokio_util::sync::CancellationToken;

struct PrintSink;

impl ResultSink for PrintSink {
    fn submit(&self, record: ResultRecord) {
        println!(
            "  [result] trigger={} outcome={} detail={:?}",
            record.trigger_id, record.outcome, record.detail
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let slow = ExecutorFn::arc("slow", |inv: Invocation, _ctx: CancellationToken| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, ExecutionError>(format!("trigger {} done", inv.trigger_id))
    });
    let dispatcher = Dispatcher::builder(DispatcherConfig::default())
        .with_executors(ExecutorRegistry::new().with_executor("SLOW", slow))
        .with_sink(Arc::new(PrintSink))
        .build();

    // Strategy names arrive as strings from the scheduler.
    let strategies = ["SERIAL_EXECUTION", "DISCARD_LATER", "COVER_EARLY"];
    for (job_id, name) in (1..).zip(strategies) {
        let strategy = BlockStrategy::parse_or_default(name);
        println!("== {strategy} ==");

        for trigger_id in 1..=3 {
            let trigger = TriggerRequest::builder(job_id, trigger_id, "SLOW")
                .with_block_strategy(strategy)
                .build();
            match dispatcher.dispatch(trigger) {
                Ok(accepted) => {
                    println!("  [dispatch] trigger={trigger_id} route={:?}", accepted.route)
                }
                Err(e) => println!("  [dispatch] trigger={trigger_id} rejected: {e}"),
            }
        }
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    dispatcher.shutdown().await?;
    Ok(())
}
