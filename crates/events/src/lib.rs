//! Domain event vocabulary and in-process distribution.
//!
//! - [`Event`]: what every domain event payload exposes (type tag, schema version, time).
//! - [`EventEnvelope`]: the immutable envelope handed to publishers.
//! - [`EventBus`] / [`InMemoryEventBus`]: fan-out to in-process subscribers.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
