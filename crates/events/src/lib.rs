//! Generation lifecycle events.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`GenerationEvent`]: the event envelope published by the orchestrator.
//! - [`names`]: the fixed set of event names.
//! - [`EventLog`]: background subscriber that writes every event to the
//!   tracing log.

pub mod bus;
pub mod log;
pub mod names;

pub use bus::{EventBus, GenerationEvent};
pub use log::EventLog;
