//! # Dispatch registry - job id → active job queue.
//!
//! The single source of truth for "has a job queue been created for this job and
//! not stopped". Backed by a sharded [`DashMap`], so contention is scoped to the
//! shard of one job id; there is no global lock across jobs.
//!
//! ## Atomic operations
//! ```text
//! insert_if_absent(id, q)           → Ok | Err(winner)
//! replace_if_matches(id, old, new)  → Ok(old) | Err(current)
//! remove_if_matches(id, q)          → Some(q) | None
//! ```
//!
//! ## Rules
//! - At most one queue is reachable per job id at any instant.
//! - Queue identity is pointer identity (`Arc::ptr_eq`).
//! - Shard locks are held only for the map operation itself; no queue method
//!   is called while a shard is locked.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};

use super::queue::JobQueue;

/// Concurrency-safe map of active job queues.
#[derive(Default)]
pub struct DispatchRegistry {
    queues: DashMap<i32, Arc<JobQueue>>,
}

impl DispatchRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the queue registered for `job_id`.
    pub fn get(&self, job_id: i32) -> Option<Arc<JobQueue>> {
        self.queues.get(&job_id).map(|q| Arc::clone(q.value()))
    }

    /// Returns true if a queue is registered for `job_id`.
    pub fn contains(&self, job_id: i32) -> bool {
        self.queues.contains_key(&job_id)
    }

    /// Registers `queue` unless `job_id` is taken; on conflict returns the winner.
    pub fn insert_if_absent(
        &self,
        job_id: i32,
        queue: Arc<JobQueue>,
    ) -> Result<(), Arc<JobQueue>> {
        match self.queues.entry(job_id) {
            Entry::Vacant(slot) => {
                slot.insert(queue);
                Ok(())
            }
            Entry::Occupied(slot) => Err(Arc::clone(slot.get())),
        }
    }

    /// Swaps `expected` for `queue` if `expected` is still the registered queue.
    ///
    /// Returns the replaced queue, or the current entry (if any) when it did not match.
    pub fn replace_if_matches(
        &self,
        job_id: i32,
        expected: &Arc<JobQueue>,
        queue: Arc<JobQueue>,
    ) -> Result<Arc<JobQueue>, Option<Arc<JobQueue>>> {
        match self.queues.entry(job_id) {
            Entry::Occupied(mut slot) if Arc::ptr_eq(slot.get(), expected) => {
                Ok(slot.insert(queue))
            }
            Entry::Occupied(slot) => Err(Some(Arc::clone(slot.get()))),
            Entry::Vacant(_) => Err(None),
        }
    }

    /// Removes whatever is registered for `job_id`.
    pub fn remove(&self, job_id: i32) -> Option<Arc<JobQueue>> {
        self.queues.remove(&job_id).map(|(_, q)| q)
    }

    /// Removes the entry only if it is still `expected`.
    pub fn remove_if_matches(
        &self,
        job_id: i32,
        expected: &Arc<JobQueue>,
    ) -> Option<Arc<JobQueue>> {
        self.queues
            .remove_if(&job_id, |_, q| Arc::ptr_eq(q, expected))
            .map(|(_, q)| q)
    }

    /// Removes the entry only if its queue has been stopped.
    pub fn remove_if_stopped(&self, job_id: i32) -> Option<Arc<JobQueue>> {
        self.queues
            .remove_if(&job_id, |_, q| q.is_stopped())
            .map(|(_, q)| q)
    }

    /// Returns sorted list of registered job ids.
    pub fn job_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.queues.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered queues.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Returns true if no queue is registered.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Removes and returns every registered queue.
    pub fn drain(&self) -> Vec<Arc<JobQueue>> {
        self.job_ids()
            .into_iter()
            .filter_map(|id| self.remove(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testkit::{CollectSink, Gate};
    use crate::events::Bus;
    use tokio_util::sync::CancellationToken;

    fn queue(job_id: i32) -> Arc<JobQueue> {
        JobQueue::new(
            job_id,
            Gate::new().executor("gated"),
            CollectSink::new(),
            Bus::new(8),
            &CancellationToken::new(),
        )
    }

    #[test]
    fn insert_if_absent_returns_winner() {
        let registry = DispatchRegistry::new();
        let first = queue(1);
        let second = queue(1);

        assert!(registry.insert_if_absent(1, Arc::clone(&first)).is_ok());
        let winner = registry.insert_if_absent(1, second).unwrap_err();
        assert!(Arc::ptr_eq(&winner, &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn replace_only_when_expected_is_current() {
        let registry = DispatchRegistry::new();
        let (a, b, c) = (queue(1), queue(1), queue(1));
        registry.insert_if_absent(1, Arc::clone(&a)).unwrap();

        let old = registry.replace_if_matches(1, &a, Arc::clone(&b)).unwrap();
        assert!(Arc::ptr_eq(&old, &a));

        // `a` is stale now: the swap to `c` must lose and report `b`.
        let current = registry.replace_if_matches(1, &a, c).unwrap_err().unwrap();
        assert!(Arc::ptr_eq(&current, &b));

        assert!(registry.replace_if_matches(2, &a, queue(2)).unwrap_err().is_none());
    }

    #[test]
    fn conditional_removal() {
        let registry = DispatchRegistry::new();
        let (a, stale) = (queue(1), queue(1));
        registry.insert_if_absent(1, Arc::clone(&a)).unwrap();

        assert!(registry.remove_if_matches(1, &stale).is_none());
        assert!(registry.remove_if_stopped(1).is_none());

        a.stop("test");
        assert!(registry.remove_if_stopped(1).is_some());
        assert!(!registry.contains(1));
    }

    #[test]
    fn drain_empties_registry() {
        let registry = DispatchRegistry::new();
        for id in [3, 1, 2] {
            registry.insert_if_absent(id, queue(id)).unwrap();
        }
        assert_eq!(registry.job_ids(), vec![1, 2, 3]);

        let drained = registry.drain();
        assert_eq!(drained.len(), 3);
        assert!(registry.is_empty());
    }
}
