//! Test helpers: a recording sink and a gated executor.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::{ExecutionError, ExecutorFn, ExecutorRef, Invocation, ResultRecord, ResultSink};

/// Records every submitted result.
pub(crate) struct CollectSink {
    records: Mutex<Vec<ResultRecord>>,
    arrived: Notify,
}

impl CollectSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            arrived: Notify::new(),
        })
    }

    pub(crate) fn records(&self) -> Vec<ResultRecord> {
        self.records.lock().clone()
    }

    /// Waits until at least `n` records arrived and returns them.
    pub(crate) async fn wait_for(&self, n: usize) -> Vec<ResultRecord> {
        loop {
            let arrived = self.arrived.notified();
            {
                let records = self.records.lock();
                if records.len() >= n {
                    return records.clone();
                }
            }
            arrived.await;
        }
    }
}

impl ResultSink for CollectSink {
    fn submit(&self, record: ResultRecord) {
        self.records.lock().push(record);
        self.arrived.notify_waiters();
    }
}

/// Executor whose executions block until released; tracks overlap.
pub(crate) struct Gate {
    started: Mutex<Vec<i64>>,
    started_notify: Notify,
    release: Semaphore,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl Gate {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Mutex::new(Vec::new()),
            started_notify: Notify::new(),
            release: Semaphore::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    /// Builds an executor that runs through this gate.
    pub(crate) fn executor(self: &Arc<Self>, name: &'static str) -> ExecutorRef {
        let gate = Arc::clone(self);
        ExecutorFn::arc(name, move |inv: Invocation, _ctx: CancellationToken| {
            let gate = Arc::clone(&gate);
            async move {
                gate.enter(inv.trigger_id);
                if let Ok(permit) = gate.release.acquire().await {
                    permit.forget();
                }
                gate.active.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, ExecutionError>(format!("{name} ran {}", inv.trigger_id))
            }
        })
    }

    /// Lets `n` executions finish.
    pub(crate) fn release(&self, n: usize) {
        self.release.add_permits(n);
    }

    /// Trigger ids in the order they started.
    pub(crate) fn started(&self) -> Vec<i64> {
        self.started.lock().clone()
    }

    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Waits until at least `n` executions started.
    pub(crate) async fn wait_started(&self, n: usize) {
        loop {
            let started = self.started_notify.notified();
            if self.started.lock().len() >= n {
                return;
            }
            started.await;
        }
    }

    fn enter(&self, trigger_id: i64) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.started.lock().push(trigger_id);
        self.started_notify.notify_waiters();
    }
}
