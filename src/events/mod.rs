//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the dispatcher, job queues,
//! the callback queue and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Dispatcher`, `JobQueue` run loops, `runner::execute_once`,
//!   `CallbackQueue` (overflow / report failures), `SubscriberSet` workers.
//! - **Consumers**: the dispatcher's subscriber listener (fans out to `SubscriberSet`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
