//! # Non-blocking event fan-out to multiple subscribers.
//!
//! [`SubscriberSet`] distributes events to every subscriber without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! Overflow and panic events about subscribers are never re-reported when they
//! themselves overflow, so a stuck subscriber cannot flood the bus.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::core::panic_message;
use crate::events::{Bus, Event, EventKind};

use super::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(panic.as_ref());
                        tracing::error!(subscriber = name, %info, "subscriber panicked");
                        worker_bus.publish(Event::subscriber_panicked(name, info));
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Emits an event to all subscribers (non-blocking).
    pub fn emit(&self, event: &Event) {
        if self.channels.is_empty() {
            return;
        }
        let about_subscriber = matches!(
            event.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        );
        let event = Arc::new(event.clone());

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !about_subscriber {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes all queues and waits for workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
