//! Notification seam for the booking engine.
//!
//! A successful commit is a *signal* for downstream consumers (email
//! dispatch, dashboards); the engine only publishes the fact. This crate
//! provides the small pub/sub vocabulary for that signal: the [`Event`]
//! trait, the [`EventBus`] abstraction, and an in-memory bus for
//! single-process deployments and tests.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
