//! Dispatch core: routing, per-job queues and lifecycle.
//!
//! The public entry point is [`Dispatcher`], built with [`DispatcherBuilder`].
//!
//! Internal modules:
//! - [`dispatcher`]: resolves executors, applies block strategies, owns shutdown;
//! - [`queue`]: one job's pending triggers and its single-flight run loop;
//! - [`registry`]: job id → queue map with atomic conditional updates;
//! - [`runner`]: executes one trigger with panic capture and event publishing;
//! - [`builder`]: assembles the dispatcher and its listeners;
//! - [`config`]: runtime settings.

mod builder;
mod config;
mod dispatcher;
mod queue;
mod registry;
mod runner;

#[cfg(test)]
pub(crate) mod testkit;

pub use builder::DispatcherBuilder;
pub use config::DispatcherConfig;
pub use dispatcher::{Accepted, Dispatcher, IdleBeat, Route};
pub use queue::{JobQueue, QueueStatus};
pub use registry::DispatchRegistry;

pub(crate) use runner::panic_message;
