//! # Block strategies.
//!
//! A job identity is a **single-flight** slot: at most one execution runs per job.
//! When a new trigger arrives while a previous one for the same job is still
//! pending or running, the trigger's [`BlockStrategy`] decides what happens.
//!
//! ## Variants
//! - `DiscardLater`: the queue is busy, **reject** the new trigger.
//! - `CoverEarly`: **replace** the not-yet-started triggers; running work is preserved.
//! - `Serial`: **enqueue** behind current work (FIFO, default).
//!
//! ## Wire names
//! `DISCARD_LATER`, `COVER_EARLY`, `SERIAL_EXECUTION` (also `SERIAL`).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Policy controlling how a trigger is handled when its job queue is busy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlockStrategy {
    /// Reject the new trigger while a previous one is pending or running.
    ///
    /// Use when:
    /// - Redundant work should be avoided
    /// - Example: periodic sync that must not pile up
    DiscardLater,

    /// Replace the pending trigger with the new one.
    ///
    /// Use when:
    /// - Only the latest parameters matter
    /// - The running execution must still complete
    CoverEarly,

    /// Queue the trigger behind current work (FIFO order).
    #[default]
    Serial,
}

impl BlockStrategy {
    /// Returns the scheduler-facing name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStrategy::DiscardLater => "DISCARD_LATER",
            BlockStrategy::CoverEarly => "COVER_EARLY",
            BlockStrategy::Serial => "SERIAL_EXECUTION",
        }
    }

    /// Parses a strategy name, falling back to [`BlockStrategy::Serial`] for unknown names.
    ///
    /// # Example
    /// ```
    /// use jobvisor::BlockStrategy;
    ///
    /// assert_eq!(BlockStrategy::parse_or_default("COVER_EARLY"), BlockStrategy::CoverEarly);
    /// assert_eq!(BlockStrategy::parse_or_default("whatever"), BlockStrategy::Serial);
    /// ```
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for BlockStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown block strategy name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown block strategy: {0}")]
pub struct ParseBlockStrategyError(pub String);

impl FromStr for BlockStrategy {
    type Err = ParseBlockStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DISCARD_LATER" => Ok(BlockStrategy::DiscardLater),
            "COVER_EARLY" => Ok(BlockStrategy::CoverEarly),
            "SERIAL_EXECUTION" | "SERIAL" => Ok(BlockStrategy::Serial),
            _ => Err(ParseBlockStrategyError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("DISCARD_LATER".parse(), Ok(BlockStrategy::DiscardLater));
        assert_eq!("cover_early".parse(), Ok(BlockStrategy::CoverEarly));
        assert_eq!("SERIAL_EXECUTION".parse(), Ok(BlockStrategy::Serial));
        assert_eq!(" SERIAL ".parse(), Ok(BlockStrategy::Serial));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = "FIRE_AND_FORGET".parse::<BlockStrategy>().unwrap_err();
        assert_eq!(err.to_string(), "unknown block strategy: FIRE_AND_FORGET");
    }

    #[test]
    fn display_round_trips_through_parse() {
        for s in [
            BlockStrategy::DiscardLater,
            BlockStrategy::CoverEarly,
            BlockStrategy::Serial,
        ] {
            assert_eq!(s.to_string().parse::<BlockStrategy>(), Ok(s));
        }
    }
}
