//! # jobvisor
//!
//! **Jobvisor** is the trigger-dispatch core of a job execution agent.
//!
//! A remote scheduler sends *triggers* ("run job X once, with these parameters").
//! Jobvisor routes each trigger to a per-job queue that runs at most one execution
//! at a time, arbitrates overlapping triggers with a block strategy, and hands every
//! outcome to a result sink for reporting back to the scheduler.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   scheduler ──► dispatch(TriggerRequest) / remove_job(id) / idle_beat(id)
//!                              │
//! ┌────────────────────────────▼──────────────────────────────────────┐
//! │  Dispatcher                                                       │
//! │  - ExecutorResolver (logic kind → Executor)                       │
//! │  - DispatchRegistry (job id → JobQueue, atomic conditional ops)   │
//! │  - Bus (broadcast events) + SubscriberSet (user subscribers)      │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ JobQueue │       │ JobQueue │       │ JobQueue │   one per job id,
//!   │  job 1   │       │  job 2   │       │  job N   │   single-flight run loop
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        │ ResultRecord     │                  │
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ResultSink (e.g. CallbackQueue ──► Report::report(batch))        │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle of one trigger
//! ```text
//! dispatch(trigger)
//!   ├─► resolve executor          (none → UnsupportedLogicKind)
//!   ├─► find or create job queue  (executor changed → swap queue, stop old one)
//!   ├─► apply block strategy
//!   │     SERIAL_EXECUTION ─► append
//!   │     DISCARD_LATER    ─► reject while pending/running
//!   │     COVER_EARLY      ─► replace pending triggers (they are reported as discarded)
//!   └─► Accepted { route }
//!
//! JobQueue run loop:
//!   pop next ─► ExecutionStarting ─► executor.execute(invocation, token)
//!            ─► ExecutionSucceeded / ExecutionFailed ─► sink.submit(record)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                              |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------------|
//! | **Dispatch**      | Route triggers, remove jobs, answer idle beats, shut down.   | [`Dispatcher`], [`DispatcherBuilder`]           |
//! | **Queues**        | Per-job single-flight execution streams.                     | [`JobQueue`], [`DispatchRegistry`]              |
//! | **Executors**     | Job logic as async, cancelable units.                        | [`Executor`], [`ExecutorFn`], [`ExecutorRegistry`] |
//! | **Results**       | Outcome records and their delivery.                          | [`ResultSink`], [`CallbackQueue`], [`Report`]   |
//! | **Subscriber API**| Hook into runtime events (logging, metrics).                 | [`Subscribe`]                                   |
//! | **Errors**        | Typed rejection, execution and runtime errors.               | [`DispatchError`], [`ExecutionError`], [`RuntimeError`] |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber writing events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use jobvisor::{
//!     BlockStrategy, Dispatcher, DispatcherConfig, ExecutionError, ExecutorFn, ExecutorRegistry,
//!     Invocation, ResultRecord, ResultSink, Route, TriggerRequest,
//! };
//!
//! struct Print;
//! impl ResultSink for Print {
//!     fn submit(&self, record: ResultRecord) {
//!         println!("job={} trigger={} {}", record.job_id, record.trigger_id, record.outcome);
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hello = ExecutorFn::arc("hello", |inv: Invocation, _ctx: CancellationToken| async move {
//!         Ok::<_, ExecutionError>(format!("hello {}", inv.payload))
//!     });
//!
//!     let dispatcher = Dispatcher::builder(DispatcherConfig::default())
//!         .with_executors(ExecutorRegistry::new().with_executor("BEAN", hello))
//!         .with_sink(Arc::new(Print))
//!         .build();
//!
//!     let trigger = TriggerRequest::builder(1, 100, "BEAN")
//!         .with_block_strategy(BlockStrategy::Serial)
//!         .with_payload("world")
//!         .build();
//!     let accepted = dispatcher.dispatch(trigger)?;
//!     assert_eq!(accepted.route, Route::Created);
//!
//!     dispatcher.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod executors;
mod results;
mod subscribers;
mod trigger;

// ---- Public re-exports ----

pub use crate::core::{
    Accepted, DispatchRegistry, Dispatcher, DispatcherBuilder, DispatcherConfig, IdleBeat,
    JobQueue, QueueStatus, Route,
};
pub use error::{DispatchError, ExecutionError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use executors::{
    Executor, ExecutorFn, ExecutorRef, ExecutorRegistry, ExecutorResolver, Invocation,
};
pub use results::{CallbackConfig, CallbackQueue, Outcome, Report, ResultRecord, ResultSink};
pub use subscribers::{Subscribe, SubscriberSet};
pub use trigger::{BlockStrategy, ParseBlockStrategyError, TriggerRequest, TriggerRequestBuilder};

// Optional: expose a built-in tracing subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
