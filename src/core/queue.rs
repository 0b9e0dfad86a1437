//! # JobQueue: serialized execution stream for one job.
//!
//! A [`JobQueue`] owns the pending triggers of exactly one job identity and a run
//! loop that executes them one at a time through the queue's bound executor.
//!
//! ## States
//! ```text
//!            push                 promote (run loop)
//!   Idle ───────────► Pending ───────────────────► Running
//!    ▲                   ▲                            │
//!    │                   └──── next pending ◄─────────┤ completion → sink.submit(record)
//!    └──────────────── nothing pending ◄──────────────┘
//!
//!   stop() from any state ──► Stopped (terminal)
//! ```
//!
//! ## Rules
//! - At most **one** execution is running per queue (the run loop is the only consumer).
//! - Pending triggers run in FIFO order.
//! - `replace` only swaps triggers that are still pending; promotion to running happens
//!   under the same lock, so a trigger that already started is never replaced.
//! - `stop` discards pending triggers (reported as `Outcome::Discarded`) and cancels the
//!   execution token; the running execution is never aborted.
//! - Cancelling the parent token (dispatcher shutdown or drop) stops the queue the same way.
//! - The state lock is never held across an `.await`.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::Notify, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::{execute_once, panic_message},
    error::DispatchError,
    events::{Bus, Event, EventKind},
    executors::ExecutorRef,
    results::{Outcome, ResultRecord, ResultSink},
    trigger::{BlockStrategy, TriggerRequest},
};

/// Observable state of a job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// Nothing pending or running.
    Idle,
    /// At least one trigger accepted, none started yet.
    Pending,
    /// An execution is in progress (more triggers may be pending behind it).
    Running,
    /// Terminal: no more triggers are accepted.
    Stopped,
}

#[derive(Default)]
struct QueueState {
    stopped: bool,
    running: Option<i64>,
    pending: VecDeque<TriggerRequest>,
}

impl QueueState {
    fn status(&self) -> QueueStatus {
        if self.stopped {
            QueueStatus::Stopped
        } else if self.running.is_some() {
            QueueStatus::Running
        } else if !self.pending.is_empty() {
            QueueStatus::Pending
        } else {
            QueueStatus::Idle
        }
    }

    fn is_busy(&self) -> bool {
        self.running.is_some() || !self.pending.is_empty()
    }

    fn holds(&self, trigger_id: i64) -> bool {
        self.running == Some(trigger_id)
            || self.pending.iter().any(|t| t.trigger_id() == trigger_id)
    }

    /// Common admission checks for every enqueue path.
    fn admit(&self, job_id: i32, trigger: &TriggerRequest) -> Result<(), DispatchError> {
        if self.stopped {
            return Err(DispatchError::QueueStopped { job_id });
        }
        if self.holds(trigger.trigger_id()) {
            return Err(DispatchError::DuplicateTrigger {
                job_id,
                trigger_id: trigger.trigger_id(),
            });
        }
        Ok(())
    }
}

/// Serialized execution stream for one job identity.
pub struct JobQueue {
    job_id: i32,
    executor: ExecutorRef,
    sink: Arc<dyn ResultSink>,
    bus: Bus,
    state: Mutex<QueueState>,
    wake: Notify,
    token: CancellationToken,
    run_loop: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueue")
            .field("job_id", &self.job_id)
            .field("executor", &self.executor.name())
            .field("status", &self.status())
            .finish()
    }
}

impl JobQueue {
    /// Creates a queue bound to `executor`. Nothing runs until [`JobQueue::start`].
    ///
    /// `token` is the parent of the queue's cancellation token (runtime shutdown).
    pub fn new(
        job_id: i32,
        executor: ExecutorRef,
        sink: Arc<dyn ResultSink>,
        bus: Bus,
        token: &CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            job_id,
            executor,
            sink,
            bus,
            state: Mutex::new(QueueState::default()),
            wake: Notify::new(),
            token: token.child_token(),
            run_loop: Mutex::new(None),
        })
    }

    /// Spawns the run loop on `runtime`. Calling it more than once has no effect.
    ///
    /// Safe to call from threads outside the runtime.
    pub fn start(self: &Arc<Self>, runtime: &Handle) {
        let mut slot = self.run_loop.lock();
        if slot.is_some() {
            return;
        }
        let me = Arc::clone(self);
        *slot = Some(runtime.spawn(async move {
            let res = std::panic::AssertUnwindSafe(Arc::clone(&me).run())
                .catch_unwind()
                .await;
            if let Err(panic) = res {
                me.fault(&panic_message(panic.as_ref()));
            }
        }));
    }

    /// Returns the job identity.
    pub fn job_id(&self) -> i32 {
        self.job_id
    }

    /// Returns the executor this queue is bound to.
    pub fn executor(&self) -> &ExecutorRef {
        &self.executor
    }

    /// Returns the current state.
    pub fn status(&self) -> QueueStatus {
        self.state.lock().status()
    }

    /// Returns true once the queue is stopped.
    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Number of triggers waiting behind the running one.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Trigger id of the running execution, if any.
    pub fn running_trigger(&self) -> Option<i64> {
        self.state.lock().running
    }

    /// Appends a trigger behind current work (FIFO).
    ///
    /// Fails with `QueueStopped` after [`JobQueue::stop`], or `DuplicateTrigger` if a
    /// trigger with the same id is already pending or running.
    pub fn push(&self, trigger: TriggerRequest) -> Result<(), DispatchError> {
        {
            let mut st = self.state.lock();
            st.admit(self.job_id, &trigger)?;
            st.pending.push_back(trigger);
        }
        self.wake.notify_one();
        Ok(())
    }

    /// Appends a trigger only if nothing is pending or running (`DISCARD_LATER`).
    pub fn push_if_idle(&self, trigger: TriggerRequest) -> Result<(), DispatchError> {
        {
            let mut st = self.state.lock();
            st.admit(self.job_id, &trigger)?;
            if st.is_busy() {
                return Err(DispatchError::BlockedByStrategy {
                    strategy: BlockStrategy::DiscardLater,
                });
            }
            st.pending.push_back(trigger);
        }
        self.wake.notify_one();
        Ok(())
    }

    /// Replaces every still-pending trigger with `trigger` (`COVER_EARLY`).
    ///
    /// The running execution, if any, is preserved. With nothing pending this is a
    /// plain [`push`](JobQueue::push). Returns how many pending triggers were covered;
    /// each of them is reported to the sink as discarded.
    pub fn replace(&self, trigger: TriggerRequest) -> Result<usize, DispatchError> {
        let covered: Vec<TriggerRequest> = {
            let mut st = self.state.lock();
            st.admit(self.job_id, &trigger)?;
            let covered = st.pending.drain(..).collect();
            st.pending.push_back(trigger);
            covered
        };
        self.wake.notify_one();

        let reason = format!("block strategy effect: {}", BlockStrategy::CoverEarly);
        for t in &covered {
            self.discard(t, &reason);
        }
        Ok(covered.len())
    }

    /// Stops the queue: no more triggers are accepted, pending ones are discarded.
    ///
    /// The running execution sees its token cancelled but is allowed to finish; its
    /// result is still delivered. Returns `false` if the queue was already stopped.
    pub fn stop(&self, reason: &str) -> bool {
        let Some(abandoned) = self.close() else {
            return false;
        };
        for t in &abandoned {
            self.discard(t, reason);
        }
        self.bus.publish(
            Event::new(EventKind::QueueStopped)
                .with_job(self.job_id)
                .with_reason(reason),
        );
        true
    }

    /// Waits until the run loop has exited.
    pub async fn join(&self) {
        let handle = self.run_loop.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub(crate) fn take_run_loop(&self) -> Option<JoinHandle<()>> {
        self.run_loop.lock().take()
    }

    /// Marks stopped, cancels the token and returns the abandoned triggers.
    fn close(&self) -> Option<Vec<TriggerRequest>> {
        let abandoned = {
            let mut st = self.state.lock();
            if st.stopped {
                return None;
            }
            st.stopped = true;
            st.pending.drain(..).collect()
        };
        self.token.cancel();
        self.wake.notify_one();
        Some(abandoned)
    }

    /// The run loop: promote, execute, report, repeat.
    ///
    /// Exits on `stop` or when the parent token is cancelled; in the latter case
    /// the queue stops itself so nothing left behind is silently lost.
    async fn run(self: Arc<Self>) {
        loop {
            if self.token.is_cancelled() {
                break;
            }
            let next = {
                let mut st = self.state.lock();
                if st.stopped {
                    break;
                }
                let next = st.pending.pop_front();
                st.running = next.as_ref().map(TriggerRequest::trigger_id);
                next
            };

            let Some(trigger) = next else {
                let cancelled = tokio::select! {
                    _ = self.wake.notified() => false,
                    _ = self.token.cancelled() => true,
                };
                if cancelled {
                    break;
                }
                continue;
            };

            self.bus.publish(
                Event::new(EventKind::ExecutionStarting)
                    .with_job(self.job_id)
                    .with_trigger(trigger.trigger_id())
                    .with_executor(self.executor.name()),
            );
            let record =
                execute_once(&self.executor, &trigger, self.token.child_token(), &self.bus).await;

            self.state.lock().running = None;
            self.sink.submit(record);
        }
        self.stop("job queue cancelled: dispatcher stopped");
    }

    /// Run loop died outside executor code: stop and report everything it held.
    fn fault(&self, info: &str) {
        let reason = format!("job queue faulted: {info}");
        tracing::error!(job_id = self.job_id, %reason, "job queue run loop died");

        let running = self.state.lock().running.take();
        let abandoned = self.close().unwrap_or_default();

        if let Some(trigger_id) = running {
            self.hand_off_guarded(ResultRecord::new(
                self.job_id,
                trigger_id,
                Outcome::Failed,
                reason.as_str(),
            ));
        }
        for t in &abandoned {
            self.discard(t, &reason);
        }
        self.bus.publish(
            Event::new(EventKind::QueueFaulted)
                .with_job(self.job_id)
                .with_reason(reason),
        );
    }

    fn discard(&self, trigger: &TriggerRequest, reason: &str) {
        self.bus.publish(self.discarded_event(trigger, reason));
        self.hand_off_guarded(ResultRecord::new(
            self.job_id,
            trigger.trigger_id(),
            Outcome::Discarded,
            reason,
        ));
    }

    fn discarded_event(&self, trigger: &TriggerRequest, reason: &str) -> Event {
        Event::new(EventKind::TriggerDiscarded)
            .with_job(self.job_id)
            .with_trigger(trigger.trigger_id())
            .with_reason(reason)
    }

    /// Sink submission that survives a panicking sink.
    fn hand_off_guarded(&self, record: ResultRecord) {
        let trigger_id = record.trigger_id;
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.sink.submit(record);
        }));
        if res.is_err() {
            tracing::error!(job_id = self.job_id, trigger_id, "result sink panicked");
        }
    }
}
