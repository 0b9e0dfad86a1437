//! # Executor resolution.
//!
//! Maps a trigger's logic kind to an executor. Resolution is a pure lookup:
//! no side effects, safe for concurrent calls. The same logic kind resolves to
//! the same [`ExecutorRef`] every time, which is how the dispatcher detects that a
//! job's logic kind changed (handle identity differs).

use std::collections::HashMap;

use super::executor::ExecutorRef;

/// Resolves a logic kind to an executor.
pub trait ExecutorResolver: Send + Sync + 'static {
    /// Returns the executor for `logic_kind`, or `None` when the kind is unknown.
    fn resolve(&self, logic_kind: &str) -> Option<ExecutorRef>;
}

/// Static table of executors keyed by logic kind.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use jobvisor::{ExecutionError, ExecutorFn, ExecutorRegistry, ExecutorResolver, Invocation};
///
/// let registry = ExecutorRegistry::new().with_executor(
///     "BEAN",
///     ExecutorFn::arc("bean", |_inv: Invocation, _ctx: CancellationToken| async {
///         Ok::<_, ExecutionError>(String::new())
///     }),
/// );
/// assert!(registry.resolve("BEAN").is_some());
/// assert!(registry.resolve("GLUE_SHELL").is_none());
/// ```
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, ExecutorRef>,
}

impl ExecutorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registry with `executor` bound to `logic_kind`.
    pub fn with_executor(mut self, logic_kind: impl Into<String>, executor: ExecutorRef) -> Self {
        self.register(logic_kind, executor);
        self
    }

    /// Binds `executor` to `logic_kind`, returning the previous binding.
    pub fn register(
        &mut self,
        logic_kind: impl Into<String>,
        executor: ExecutorRef,
    ) -> Option<ExecutorRef> {
        self.executors.insert(logic_kind.into(), executor)
    }

    /// Returns sorted list of known logic kinds.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.executors.keys().cloned().collect();
        kinds.sort_unstable();
        kinds
    }
}

impl ExecutorResolver for ExecutorRegistry {
    fn resolve(&self, logic_kind: &str) -> Option<ExecutorRef> {
        self.executors.get(logic_kind).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::{ExecutorFn, Invocation, same_executor};
    use crate::error::ExecutionError;
    use tokio_util::sync::CancellationToken;

    fn noop(name: &'static str) -> ExecutorRef {
        ExecutorFn::arc(name, |_inv: Invocation, _ctx: CancellationToken| async {
            Ok::<_, ExecutionError>(String::new())
        })
    }

    #[test]
    fn resolves_same_handle_per_kind() {
        let registry = ExecutorRegistry::new()
            .with_executor("A", noop("a"))
            .with_executor("B", noop("b"));

        let a1 = registry.resolve("A").unwrap();
        let a2 = registry.resolve("A").unwrap();
        let b = registry.resolve("B").unwrap();

        assert!(same_executor(&a1, &a2));
        assert!(!same_executor(&a1, &b));
        assert_eq!(registry.kinds(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn unknown_kind_is_not_found() {
        let registry = ExecutorRegistry::new().with_executor("A", noop("a"));
        assert!(registry.resolve("a").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn register_returns_previous_binding() {
        let mut registry = ExecutorRegistry::new();
        assert!(registry.register("A", noop("first")).is_none());
        let prev = registry.register("A", noop("second")).unwrap();
        assert_eq!(prev.name(), "first");
        assert_eq!(registry.resolve("A").unwrap().name(), "second");
    }
}
