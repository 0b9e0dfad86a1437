//! # Function-backed executor (`ExecutorFn`)
//!
//! [`ExecutorFn`] wraps a closure `F: Fn(Invocation, CancellationToken) -> Fut`,
//! producing a fresh future per execution. Shared state, if needed, goes into an
//! explicit `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use jobvisor::{ExecutionError, ExecutorFn, ExecutorRef, Invocation};
//!
//! let e: ExecutorRef = ExecutorFn::arc("shell", |inv: Invocation, _ctx: CancellationToken| async move {
//!     Ok::<_, ExecutionError>(format!("ran job {}", inv.job_id))
//! });
//!
//! assert_eq!(e.name(), "shell");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutionError;

use super::executor::{Executor, Invocation};

/// Function-backed executor implementation.
#[derive(Debug)]
pub struct ExecutorFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ExecutorFn<F> {
    /// Creates a new function-backed executor.
    ///
    /// Prefer [`ExecutorFn::arc`] when you immediately need an [`ExecutorRef`](crate::ExecutorRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the executor and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Executor for ExecutorFn<F>
where
    F: Fn(Invocation, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ExecutionError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        invocation: Invocation,
        ctx: CancellationToken,
    ) -> Result<String, ExecutionError> {
        (self.f)(invocation, ctx).await
    }
}
