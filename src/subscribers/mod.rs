//! # Event subscribers for the dispatcher.
//!
//! ## Architecture
//! ```text
//!   Dispatcher / JobQueue ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                            │
//!                                                            ▼
//!                                                      SubscriberSet::emit
//!                                                  ┌─────────┼─────────┐
//!                                                  ▼         ▼         ▼
//!                                              LogWriter  Metrics   Custom
//! ```
//!
//! - [`Subscribe`] extension trait for custom handlers.
//! - [`SubscriberSet`] fan-out with per-subscriber bounded queues.
//! - `LogWriter` (feature `logging`) writes events through `tracing`.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
