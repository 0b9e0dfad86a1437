//! # Dispatcher: routes triggers to per-job queues.
//!
//! The [`Dispatcher`] is the entry point of the core. It resolves the executor for a
//! trigger, consults the [`DispatchRegistry`], and applies the trigger's
//! [`BlockStrategy`] against the job's queue.
//!
//! ## Routing
//! ```text
//! dispatch(trigger)
//!   ├─► resolve(logic_kind) ── none ──► Err(UnsupportedLogicKind)
//!   └─► loop (≤ route_attempts):
//!         registry.get(job_id)
//!           ├─ absent            ─► new queue ─► insert_if_absent ─┬─ won  ─► push        → Created
//!           │                                                      └─ lost ─► retry (route to winner)
//!           ├─ executor changed  ─► new queue ─► replace_if_matches ┬─ won  ─► stop old, push → Replaced
//!           │                                                      └─ lost ─► retry
//!           └─ same executor     ─► block strategy:
//!                 DISCARD_LATER ─► push_if_idle   (busy → Err(BlockedByStrategy))
//!                 COVER_EARLY   ─► replace        → Covered / Enqueued
//!                 SERIAL        ─► push           → Enqueued
//!         a queue that turns out stopped is evicted (if still registered) and the trigger retried
//!   └─► attempts exhausted ─► Err(RegistrationConflict)
//! ```
//!
//! ## Rules
//! - A rejected trigger leaves every live queue untouched.
//! - A lost create/replace race re-routes the trigger to the winning queue; it is never dropped.
//! - The replaced queue is stopped: its pending triggers are reported as discarded,
//!   its running execution finishes.
//! - Side effects are limited to registry mutation and queue state transitions.

use std::sync::{Arc, Weak};

use tokio::{runtime::Handle, sync::broadcast};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{DispatchError, RuntimeError},
    events::{Bus, Event, EventKind},
    executors::{ExecutorRef, ExecutorResolver, same_executor},
    results::{CallbackQueue, ResultSink},
    subscribers::SubscriberSet,
    trigger::{BlockStrategy, TriggerRequest},
};

use super::{config::DispatcherConfig, queue::JobQueue, registry::DispatchRegistry};

/// Reason reported by [`Dispatcher::idle_beat`] for registered jobs.
const BUSY_REASON: &str = "job thread is running or has trigger queue.";

/// How an accepted trigger was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// First trigger for the job: a new queue was created.
    Created,
    /// Appended to the existing queue.
    Enqueued,
    /// Replaced `covered` pending triggers of the existing queue.
    Covered {
        /// How many pending triggers were discarded.
        covered: usize,
    },
    /// The job's executor changed: its queue was swapped for a new one.
    Replaced,
}

impl Route {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            Route::Created => "created",
            Route::Enqueued => "enqueued",
            Route::Covered { .. } => "covered",
            Route::Replaced => "replaced",
        }
    }
}

/// Successful dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    /// Job identity.
    pub job_id: i32,
    /// Accepted trigger.
    pub trigger_id: i64,
    /// Route taken.
    pub route: Route,
}

/// Answer to an idle beat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleBeat {
    /// No queue is registered for the job.
    Idle,
    /// A queue is registered (running or merely holding triggers).
    Busy {
        /// Human-readable reason.
        reason: String,
    },
}

impl IdleBeat {
    /// Returns true for [`IdleBeat::Idle`].
    pub fn is_idle(&self) -> bool {
        matches!(self, IdleBeat::Idle)
    }
}

/// Outcome of one routing attempt: `Ok(None)` means "retry against the current entry".
type Step = Result<Option<Route>, DispatchError>;

/// Routes triggers to per-job single-flight queues.
pub struct Dispatcher {
    cfg: DispatcherConfig,
    resolver: Arc<dyn ExecutorResolver>,
    sink: Arc<dyn ResultSink>,
    callbacks: Option<Arc<CallbackQueue>>,
    registry: Arc<DispatchRegistry>,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    runtime: Handle,
    runtime_token: CancellationToken,
}

impl Dispatcher {
    /// Creates a builder with the given configuration.
    pub fn builder(cfg: DispatcherConfig) -> super::builder::DispatcherBuilder {
        super::builder::DispatcherBuilder::new(cfg)
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn new_internal(
        cfg: DispatcherConfig,
        resolver: Arc<dyn ExecutorResolver>,
        sink: Arc<dyn ResultSink>,
        callbacks: Option<Arc<CallbackQueue>>,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        runtime: Handle,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            resolver,
            sink,
            callbacks,
            registry: Arc::new(DispatchRegistry::new()),
            bus,
            subs,
            runtime,
            runtime_token,
        }
    }

    /// Routes one trigger. Never blocks.
    ///
    /// May be called from any thread: job queues are spawned on the runtime the
    /// dispatcher was built in.
    ///
    /// Every rejection carries a human-readable reason in its `Display` text.
    pub fn dispatch(&self, trigger: TriggerRequest) -> Result<Accepted, DispatchError> {
        let (job_id, trigger_id) = (trigger.job_id(), trigger.trigger_id());
        let res = self.route(trigger);

        let (kind, reason) = match &res {
            Ok(accepted) => (EventKind::TriggerAccepted, accepted.route.as_label().to_string()),
            Err(e) => {
                tracing::debug!(job_id, trigger_id, reason = %e, "trigger rejected");
                (EventKind::TriggerRejected, e.to_string())
            }
        };
        self.bus.publish(
            Event::new(kind)
                .with_job(job_id)
                .with_trigger(trigger_id)
                .with_reason(reason),
        );
        res
    }

    /// Stops and unregisters the job's queue. Returns `false` if none was registered.
    ///
    /// Pending triggers are discarded; an execution already inside the executor is
    /// signalled through its token but not interrupted.
    pub fn remove_job(&self, job_id: i32) -> bool {
        let Some(queue) = self.registry.remove(job_id) else {
            return false;
        };
        queue.stop("job removed by scheduler");
        true
    }

    /// Reports whether the job has a registered queue.
    ///
    /// `Busy` does not mean an execution is running: a registered queue may be idle.
    pub fn idle_beat(&self, job_id: i32) -> IdleBeat {
        match self.registry.get(job_id) {
            Some(queue) if !queue.is_stopped() => IdleBeat::Busy {
                reason: BUSY_REASON.to_string(),
            },
            _ => IdleBeat::Idle,
        }
    }

    /// Returns sorted list of registered job ids.
    pub fn jobs(&self) -> Vec<i32> {
        self.registry.job_ids()
    }

    /// Returns the queue registered for `job_id`.
    pub fn queue(&self, job_id: i32) -> Option<Arc<JobQueue>> {
        self.registry.get(job_id)
    }

    /// Creates a receiver of runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops every queue and waits up to `grace` for running executions.
    ///
    /// New triggers are rejected with `ShuttingDown` from the moment this is called.
    /// The built-in callback queue is flushed and closed once all queues finished.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.runtime_token.cancel();

        let queues = self.registry.drain();
        for queue in &queues {
            queue.stop("dispatcher shutting down");
        }

        let grace = self.cfg.grace;
        let deadline = tokio::time::Instant::now() + grace;
        let mut stuck = Vec::new();
        for queue in &queues {
            let Some(run_loop) = queue.take_run_loop() else {
                continue;
            };
            if tokio::time::timeout_at(deadline, run_loop).await.is_err() {
                stuck.push(queue.job_id());
            }
        }

        if !stuck.is_empty() {
            stuck.sort_unstable();
            tracing::warn!(?stuck, ?grace, "job queues did not stop within grace");
            self.bus.publish(Event::new(EventKind::GraceExceeded));
            return Err(RuntimeError::GraceExceeded { grace, stuck });
        }

        if let Some(callbacks) = &self.callbacks {
            callbacks.close().await;
        }
        self.bus.publish(Event::new(EventKind::AllStoppedWithin));
        Ok(())
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    pub(super) fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        self.runtime.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Evicts faulted queues from the registry.
    pub(super) fn eviction_listener(&self) {
        let mut rx = self.bus.subscribe();
        let registry: Weak<DispatchRegistry> = Arc::downgrade(&self.registry);
        let rt = self.runtime_token.clone();

        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = rt.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) if ev.kind == EventKind::QueueFaulted => {
                            let Some(job_id) = ev.job_id else {
                                continue;
                            };
                            let Some(registry) = registry.upgrade() else {
                                break;
                            };
                            if registry.remove_if_stopped(job_id).is_some() {
                                tracing::warn!(job_id, "faulted job queue evicted");
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "eviction listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    fn route(&self, trigger: TriggerRequest) -> Result<Accepted, DispatchError> {
        if self.runtime_token.is_cancelled() {
            return Err(DispatchError::ShuttingDown);
        }
        let executor = self.resolver.resolve(trigger.logic_kind()).ok_or_else(|| {
            DispatchError::UnsupportedLogicKind {
                kind: trigger.logic_kind().to_string(),
            }
        })?;

        let (job_id, trigger_id) = (trigger.job_id(), trigger.trigger_id());
        let attempts = self.cfg.route_attempts_clamped();
        for _ in 0..attempts {
            let step = match self.registry.get(job_id) {
                None => self.create(&trigger, &executor),
                Some(current) if !same_executor(current.executor(), &executor) => {
                    self.swap(&trigger, &executor, &current)
                }
                Some(current) => self.admit(&trigger, &current),
            };
            if let Some(route) = step? {
                return Ok(Accepted {
                    job_id,
                    trigger_id,
                    route,
                });
            }
        }
        Err(DispatchError::RegistrationConflict { job_id, attempts })
    }

    /// First trigger for the job.
    fn create(&self, trigger: &TriggerRequest, executor: &ExecutorRef) -> Step {
        let job_id = trigger.job_id();
        let queue = self.new_queue(job_id, executor);
        if self.registry.insert_if_absent(job_id, Arc::clone(&queue)).is_err() {
            return Ok(None);
        }
        self.activate(&queue)?;

        self.bus.publish(
            Event::new(EventKind::QueueCreated)
                .with_job(job_id)
                .with_executor(executor.name()),
        );
        self.settle(&queue, queue.push(trigger.clone()).map(|()| Route::Created))
    }

    /// The job's executor changed: swap in a queue bound to the new one.
    fn swap(
        &self,
        trigger: &TriggerRequest,
        executor: &ExecutorRef,
        current: &Arc<JobQueue>,
    ) -> Step {
        let job_id = trigger.job_id();
        let queue = self.new_queue(job_id, executor);
        let Ok(old) = self
            .registry
            .replace_if_matches(job_id, current, Arc::clone(&queue))
        else {
            return Ok(None);
        };
        old.stop("executor changed, old job queue stopped");
        self.activate(&queue)?;

        tracing::info!(
            job_id,
            from = old.executor().name(),
            to = executor.name(),
            "job queue replaced"
        );
        self.bus.publish(
            Event::new(EventKind::QueueReplaced)
                .with_job(job_id)
                .with_executor(executor.name()),
        );
        self.settle(&queue, queue.push(trigger.clone()).map(|()| Route::Replaced))
    }

    /// Same executor: apply the block strategy against the live queue.
    fn admit(&self, trigger: &TriggerRequest, current: &Arc<JobQueue>) -> Step {
        let res = match trigger.block_strategy() {
            BlockStrategy::DiscardLater => current
                .push_if_idle(trigger.clone())
                .map(|()| Route::Enqueued),
            BlockStrategy::CoverEarly => current.replace(trigger.clone()).map(|covered| {
                if covered == 0 {
                    Route::Enqueued
                } else {
                    Route::Covered { covered }
                }
            }),
            BlockStrategy::Serial => current.push(trigger.clone()).map(|()| Route::Enqueued),
        };
        self.settle(current, res)
    }

    /// A stopped queue means the registry moved on (or must): evict and retry.
    fn settle(&self, queue: &Arc<JobQueue>, res: Result<Route, DispatchError>) -> Step {
        match res {
            Ok(route) => Ok(Some(route)),
            Err(DispatchError::QueueStopped { job_id }) => {
                self.registry.remove_if_matches(job_id, queue);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Starts a freshly registered queue unless shutdown began meanwhile.
    fn activate(&self, queue: &Arc<JobQueue>) -> Result<(), DispatchError> {
        if self.runtime_token.is_cancelled() {
            self.registry.remove_if_matches(queue.job_id(), queue);
            queue.stop("dispatcher shutting down");
            return Err(DispatchError::ShuttingDown);
        }
        queue.start(&self.runtime);
        Ok(())
    }

    fn new_queue(&self, job_id: i32, executor: &ExecutorRef) -> Arc<JobQueue> {
        JobQueue::new(
            job_id,
            Arc::clone(executor),
            Arc::clone(&self.sink),
            self.bus.clone(),
            &self.runtime_token,
        )
    }
}

impl Drop for Dispatcher {
    /// Dropping the dispatcher cancels its listeners and stops every queue.
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::testkit::{CollectSink, Gate};
    use crate::executors::ExecutorRegistry;
    use crate::results::Outcome;

    struct Fixture {
        dispatcher: Arc<Dispatcher>,
        a: Arc<Gate>,
        b: Arc<Gate>,
        sink: Arc<CollectSink>,
    }

    fn fixture(cfg: DispatcherConfig) -> Fixture {
        let (a, b, sink) = (Gate::new(), Gate::new(), CollectSink::new());
        let executors = ExecutorRegistry::new()
            .with_executor("A", a.executor("a"))
            .with_executor("B", b.executor("b"));
        let dispatcher = Dispatcher::builder(cfg)
            .with_executors(executors)
            .with_sink(sink.clone())
            .build();
        Fixture {
            dispatcher,
            a,
            b,
            sink,
        }
    }

    fn trigger(trigger_id: i64, kind: &str, strategy: BlockStrategy) -> TriggerRequest {
        TriggerRequest::new(1, trigger_id, kind, strategy, "")
    }

    #[tokio::test]
    async fn first_trigger_creates_then_serial_enqueues() {
        let f = fixture(DispatcherConfig::default());

        let first = f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        assert_eq!(first.route, Route::Created);
        let second = f.dispatcher.dispatch(trigger(2, "A", BlockStrategy::Serial)).unwrap();
        assert_eq!(second.route, Route::Enqueued);
        assert_eq!(f.dispatcher.jobs(), vec![1]);

        f.a.release(2);
        let records = f.sink.wait_for(2).await;
        assert!(records.iter().all(|r| r.outcome == Outcome::Succeeded));
        assert_eq!(f.a.started(), vec![1, 2]);
        assert_eq!(f.a.max_active(), 1);
    }

    #[tokio::test]
    async fn unsupported_kind_is_rejected_without_side_effects() {
        let f = fixture(DispatcherConfig::default());
        let mut rx = f.dispatcher.subscribe();

        let err = f
            .dispatcher
            .dispatch(trigger(1, "GLUE_SHELL", BlockStrategy::Serial))
            .unwrap_err();
        assert_eq!(err.to_string(), "logic kind [GLUE_SHELL] is not supported");
        assert!(f.dispatcher.jobs().is_empty());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TriggerRejected);
        assert_eq!(ev.trigger_id, Some(1));
    }

    #[tokio::test]
    async fn discard_later_rejects_while_busy() {
        let f = fixture(DispatcherConfig::default());

        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::DiscardLater)).unwrap();
        let err = f
            .dispatcher
            .dispatch(trigger(2, "A", BlockStrategy::DiscardLater))
            .unwrap_err();
        assert_eq!(err.to_string(), "block strategy effect: DISCARD_LATER");

        f.a.release(1);
        f.sink.wait_for(1).await;
        let accepted = f.dispatcher.dispatch(trigger(3, "A", BlockStrategy::DiscardLater)).unwrap();
        assert_eq!(accepted.route, Route::Enqueued);
    }

    #[tokio::test]
    async fn cover_early_discards_pending_only() {
        let f = fixture(DispatcherConfig::default());

        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        f.a.wait_started(1).await;
        f.dispatcher.dispatch(trigger(2, "A", BlockStrategy::Serial)).unwrap();

        let covered = f.dispatcher.dispatch(trigger(3, "A", BlockStrategy::CoverEarly)).unwrap();
        assert_eq!(covered.route, Route::Covered { covered: 1 });

        f.a.release(2);
        let records = f.sink.wait_for(3).await;
        let discarded: Vec<i64> = records
            .iter()
            .filter(|r| r.outcome == Outcome::Discarded)
            .map(|r| r.trigger_id)
            .collect();
        assert_eq!(discarded, vec![2]);
        assert_eq!(f.a.started(), vec![1, 3]);
    }

    #[tokio::test]
    async fn executor_change_swaps_the_queue() {
        let f = fixture(DispatcherConfig::default());

        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        f.a.wait_started(1).await;
        f.dispatcher.dispatch(trigger(2, "A", BlockStrategy::Serial)).unwrap();
        let old = f.dispatcher.queue(1).unwrap();

        // Block strategy does not matter for an executor change.
        let swapped = f.dispatcher.dispatch(trigger(3, "B", BlockStrategy::DiscardLater)).unwrap();
        assert_eq!(swapped.route, Route::Replaced);
        assert!(old.is_stopped());
        assert!(!Arc::ptr_eq(&old, &f.dispatcher.queue(1).unwrap()));

        f.a.release(1);
        f.b.release(1);
        let records = f.sink.wait_for(3).await;
        let pending_of_old = records.iter().find(|r| r.trigger_id == 2).unwrap();
        assert_eq!(pending_of_old.outcome, Outcome::Discarded);
        assert_eq!(pending_of_old.detail, "executor changed, old job queue stopped");
        assert_eq!(f.a.started(), vec![1]);
        assert_eq!(f.b.started(), vec![3]);
    }

    #[tokio::test]
    async fn idle_beat_and_remove_job() {
        let f = fixture(DispatcherConfig::default());
        assert!(f.dispatcher.idle_beat(1).is_idle());
        assert!(!f.dispatcher.remove_job(1));

        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        f.a.release(1);
        f.sink.wait_for(1).await;

        // Registered but idle still answers busy.
        assert_eq!(
            f.dispatcher.idle_beat(1),
            IdleBeat::Busy {
                reason: BUSY_REASON.to_string()
            }
        );
        assert!(f.dispatcher.remove_job(1));
        assert!(f.dispatcher.idle_beat(1).is_idle());
        assert!(f.dispatcher.jobs().is_empty());
    }

    #[tokio::test]
    async fn shutdown_rejects_new_triggers() {
        let f = fixture(DispatcherConfig::default());
        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        f.a.wait_started(1).await;
        f.dispatcher.dispatch(trigger(2, "A", BlockStrategy::Serial)).unwrap();

        f.a.release(1);
        f.dispatcher.shutdown().await.unwrap();

        let records = f.sink.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.trigger_id == 1 && r.is_success()));
        assert!(records.iter().any(|r| r.trigger_id == 2 && r.outcome == Outcome::Discarded));
        assert_eq!(
            f.dispatcher.dispatch(trigger(3, "A", BlockStrategy::Serial)),
            Err(DispatchError::ShuttingDown)
        );
    }

    #[tokio::test]
    async fn shutdown_reports_stuck_jobs() {
        let cfg = DispatcherConfig {
            grace: Duration::from_millis(20),
            ..DispatcherConfig::default()
        };
        let f = fixture(cfg);
        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        f.a.wait_started(1).await;

        match f.dispatcher.shutdown().await {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, vec![1]),
            other => panic!("expected GraceExceeded, got {other:?}"),
        }
        f.a.release(1);
    }

    #[tokio::test]
    async fn stopped_but_registered_queue_is_evicted_and_rebuilt() {
        let f = fixture(DispatcherConfig::default());
        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        let stale = f.dispatcher.queue(1).unwrap();
        assert!(stale.stop("stopped outside the dispatcher"));

        let accepted = f.dispatcher.dispatch(trigger(2, "A", BlockStrategy::Serial)).unwrap();
        assert_eq!(accepted.route, Route::Created);
        let fresh = f.dispatcher.queue(1).unwrap();
        assert!(!Arc::ptr_eq(&stale, &fresh));
        assert!(!fresh.is_stopped());

        f.a.release(1);
        let records = f.sink.wait_for(2).await;
        assert!(records.iter().any(|r| r.trigger_id == 1 && r.outcome == Outcome::Discarded));
        assert!(records.iter().any(|r| r.trigger_id == 2 && r.is_success()));
    }

    #[tokio::test]
    async fn attempts_exhausted_is_a_registration_conflict() {
        let cfg = DispatcherConfig {
            route_attempts: 1,
            ..DispatcherConfig::default()
        };
        let f = fixture(cfg);
        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        f.dispatcher.queue(1).unwrap().stop("stopped outside the dispatcher");

        // The only attempt lands on the stopped queue and evicts it.
        assert_eq!(
            f.dispatcher.dispatch(trigger(2, "A", BlockStrategy::Serial)),
            Err(DispatchError::RegistrationConflict {
                job_id: 1,
                attempts: 1
            })
        );
        assert!(f.dispatcher.jobs().is_empty());

        let accepted = f.dispatcher.dispatch(trigger(2, "A", BlockStrategy::Serial)).unwrap();
        assert_eq!(accepted.route, Route::Created);
    }

    #[tokio::test]
    async fn lost_create_race_routes_to_the_winner() {
        let f = fixture(DispatcherConfig::default());
        let executor = f.dispatcher.resolver.resolve("A").unwrap();

        // Another caller registered the job between our lookup and our insert.
        let winner = f.dispatcher.new_queue(1, &executor);
        f.dispatcher
            .registry
            .insert_if_absent(1, Arc::clone(&winner))
            .unwrap();
        winner.start(&f.dispatcher.runtime);

        let t = trigger(1, "A", BlockStrategy::Serial);
        assert_eq!(f.dispatcher.create(&t, &executor), Ok(None));
        assert_eq!(winner.pending_len(), 0);

        let accepted = f.dispatcher.dispatch(t).unwrap();
        assert_eq!(accepted.route, Route::Enqueued);
        assert!(Arc::ptr_eq(&f.dispatcher.queue(1).unwrap(), &winner));

        f.a.release(1);
        f.sink.wait_for(1).await;
        assert_eq!(f.a.started(), vec![1]);
    }

    #[tokio::test]
    async fn lost_swap_race_routes_to_the_winner() {
        let f = fixture(DispatcherConfig::default());
        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        let stale = f.dispatcher.queue(1).unwrap();
        let b = f.dispatcher.resolver.resolve("B").unwrap();

        // Someone else already swapped the job over to `B`.
        f.dispatcher.dispatch(trigger(2, "B", BlockStrategy::Serial)).unwrap();
        let winner = f.dispatcher.queue(1).unwrap();

        let t = trigger(3, "B", BlockStrategy::Serial);
        assert_eq!(f.dispatcher.swap(&t, &b, &stale), Ok(None));
        assert!(Arc::ptr_eq(&f.dispatcher.queue(1).unwrap(), &winner));

        let accepted = f.dispatcher.dispatch(t).unwrap();
        assert_eq!(accepted.route, Route::Enqueued);

        f.b.release(2);
        f.sink.wait_for(3).await;
        assert_eq!(f.b.started(), vec![2, 3]);
    }

    #[tokio::test]
    async fn dropping_the_dispatcher_stops_its_queues() {
        let f = fixture(DispatcherConfig::default());
        f.dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        f.a.wait_started(1).await;
        f.dispatcher.dispatch(trigger(2, "A", BlockStrategy::Serial)).unwrap();
        let queue = f.dispatcher.queue(1).unwrap();

        drop(f.dispatcher);
        f.a.release(1);
        queue.join().await;

        assert_eq!(queue.status(), crate::QueueStatus::Stopped);
        assert_eq!(
            queue.push(trigger(3, "A", BlockStrategy::Serial)),
            Err(DispatchError::QueueStopped { job_id: 1 })
        );
        let records = f.sink.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.trigger_id == 1 && r.is_success()));
        assert!(records.iter().any(|r| r.trigger_id == 2 && r.outcome == Outcome::Discarded));
    }

    #[tokio::test]
    async fn faulted_queue_is_evicted() {
        struct Explode;
        impl ResultSink for Explode {
            fn submit(&self, _record: crate::ResultRecord) {
                panic!("sink exploded");
            }
        }

        let gate = Gate::new();
        let dispatcher = Dispatcher::builder(DispatcherConfig::default())
            .with_executors(ExecutorRegistry::new().with_executor("A", gate.executor("a")))
            .with_sink(Arc::new(Explode))
            .build();

        dispatcher.dispatch(trigger(1, "A", BlockStrategy::Serial)).unwrap();
        gate.release(1);

        tokio::time::timeout(Duration::from_secs(5), async {
            while !dispatcher.jobs().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(dispatcher.idle_beat(1).is_idle());

        // The next trigger builds a fresh queue.
        let again = dispatcher.dispatch(trigger(2, "A", BlockStrategy::Serial)).unwrap();
        assert_eq!(again.route, Route::Created);
    }
}
