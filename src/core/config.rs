//! # Dispatcher configuration.
//!
//! Provides [`DispatcherConfig`] centralized settings for the dispatch runtime.
//!
//! ## Sentinel values
//! - `route_attempts = 0` → treated as 1 (a trigger is always routed at least once)
//! - `grace = 0s` → shutdown does not wait for running executions

use std::time::Duration;

/// Global configuration for the dispatcher.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `route_attempts`: How many times a trigger is re-routed after losing a registry race
/// - `grace`: Maximum wait for running executions during shutdown
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Maximum routing attempts per trigger.
    ///
    /// A trigger that loses the create/replace race for its job, or lands on a queue
    /// that was stopped concurrently, is re-routed against the current registry entry.
    /// After this many attempts the dispatcher rejects it with `RegistrationConflict`.
    pub route_attempts: usize,

    /// Maximum time to wait for job queues to finish during shutdown.
    ///
    /// Running executions are signalled (cancellation token) but never aborted;
    /// if they outlive `grace`, shutdown returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,
}

impl DispatcherConfig {
    /// Returns routing attempts clamped to a minimum of 1.
    #[inline]
    pub fn route_attempts_clamped(&self) -> usize {
        self.route_attempts.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for DispatcherConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `route_attempts = 8`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            route_attempts: 8,
            grace: Duration::from_secs(30),
        }
    }
}
