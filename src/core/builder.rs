use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::{
    events::Bus,
    executors::{ExecutorRegistry, ExecutorResolver},
    results::{CallbackConfig, CallbackQueue, Report, ResultRecord, ResultSink},
    subscribers::{Subscribe, SubscriberSet},
};

use super::{config::DispatcherConfig, dispatcher::Dispatcher};

/// Where finished records go.
enum SinkChoice {
    Null,
    Custom(Arc<dyn ResultSink>),
    Callback(CallbackConfig, Arc<dyn Report>),
}

/// Builder for constructing a Dispatcher with optional features.
pub struct DispatcherBuilder {
    cfg: DispatcherConfig,
    resolver: Arc<dyn ExecutorResolver>,
    sink: SinkChoice,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the given configuration.
    ///
    /// Without further calls the dispatcher resolves no logic kind and only logs results.
    pub fn new(cfg: DispatcherConfig) -> Self {
        Self {
            cfg,
            resolver: Arc::new(ExecutorRegistry::new()),
            sink: SinkChoice::Null,
            subscribers: Vec::new(),
        }
    }

    /// Sets the logic kind → executor resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn ExecutorResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Shorthand for [`with_resolver`](Self::with_resolver) with a static registry.
    pub fn with_executors(self, executors: ExecutorRegistry) -> Self {
        self.with_resolver(Arc::new(executors))
    }

    /// Hands finished records to `sink`. Replaces any callback set earlier.
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = SinkChoice::Custom(sink);
        self
    }

    /// Buffers finished records in a [`CallbackQueue`] delivering to `reporter`.
    ///
    /// Replaces any sink set earlier. The queue is flushed by [`Dispatcher::shutdown`].
    pub fn with_callback(mut self, cfg: CallbackConfig, reporter: Arc<dyn Report>) -> Self {
        self.sink = SinkChoice::Callback(cfg, reporter);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (admission, execution, queue lifecycle)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the dispatcher and spawns its background listeners.
    ///
    /// Must be called inside a Tokio runtime; that runtime hosts every job queue,
    /// so [`Dispatcher::dispatch`] itself may then be called from any thread.
    pub fn build(self) -> Arc<Dispatcher> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let runtime_token = CancellationToken::new();

        let (sink, callbacks): (Arc<dyn ResultSink>, _) = match self.sink {
            SinkChoice::Null => (Arc::new(NullSink), None),
            SinkChoice::Custom(sink) => (sink, None),
            SinkChoice::Callback(cfg, reporter) => {
                let queue = CallbackQueue::spawn(cfg, reporter, bus.clone());
                (Arc::clone(&queue) as Arc<dyn ResultSink>, Some(queue))
            }
        };

        let dispatcher = Arc::new(Dispatcher::new_internal(
            self.cfg,
            self.resolver,
            sink,
            callbacks,
            bus,
            subs,
            Handle::current(),
            runtime_token,
        ));
        dispatcher.subscriber_listener();
        dispatcher.eviction_listener();
        dispatcher
    }
}

/// Fallback sink: results are only logged.
struct NullSink;

impl ResultSink for NullSink {
    fn submit(&self, record: ResultRecord) {
        tracing::debug!(
            job_id = record.job_id,
            trigger_id = record.trigger_id,
            outcome = %record.outcome,
            "result not delivered: no sink configured"
        );
    }
}
