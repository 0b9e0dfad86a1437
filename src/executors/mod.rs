//! # Executor abstractions and resolution.
//!
//! This module provides the execution capability consumed by job queues:
//! - [`Executor`] - trait for async, cancelable job logic
//! - [`ExecutorFn`] - function-based executor implementation
//! - [`ExecutorRef`] - shared reference to an executor (`Arc<dyn Executor>`)
//! - [`Invocation`] - what an executor receives for one trigger
//! - [`ExecutorResolver`] / [`ExecutorRegistry`] - logic kind → executor lookup

mod executor;
mod executor_fn;
mod resolver;

pub use executor::{Executor, ExecutorRef, Invocation};
pub use executor_fn::ExecutorFn;
pub use resolver::{ExecutorRegistry, ExecutorResolver};

pub(crate) use executor::same_executor;
