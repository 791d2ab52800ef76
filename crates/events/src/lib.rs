//! `pizzapos-events`: in-process publish/subscribe fabric.
//!
//! Services emit typed domain events wrapped in an [`EventEnvelope`]; the
//! [`EventBus`] fans each envelope out to every handler registered under the
//! envelope's topic.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;
pub mod topics;

pub use bus::{EmitReport, EventBus, publish};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::{Handler, HandlerFuture, HandlerId, async_handler, handler_fn};
pub use in_memory_bus::InMemoryEventBus;
