//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging event handlers (logs, metrics,
//! audit trails) into the dispatcher.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ## Architecture
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Overflow behavior
//! 1) The new event is **dropped** for this subscriber only.
//! 2) The runtime publishes `EventKind::SubscriberOverflow`.
//! 3) Other subscribers are unaffected.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use jobvisor::{Event, EventKind, Subscribe};
//!
//! struct Rejections;
//!
//! #[async_trait]
//! impl Subscribe for Rejections {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::TriggerRejected) {
//!             // export a metric, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "rejections" }
//!     fn queue_capacity(&self) -> usize { 2048 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing affects only this subscriber's queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    /// Events are delivered in FIFO order per subscriber.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (clamped to at least 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
