//! # Trigger requests and block strategies.
//!
//! This module provides the inbound data model:
//! - [`TriggerRequest`] - one trigger instance sent by the scheduler
//! - [`BlockStrategy`] - what to do when the job is already pending or running
//! - [`TriggerRequestBuilder`] - fluent construction

mod builder;
mod request;
mod strategy;

pub use builder::TriggerRequestBuilder;
pub use request::TriggerRequest;
pub use strategy::{BlockStrategy, ParseBlockStrategyError};
