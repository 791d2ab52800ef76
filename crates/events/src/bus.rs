//! Topic-keyed publish/subscribe contract.
//!
//! - Many handlers per topic; each `subscribe` returns a fresh [`HandlerId`].
//! - `emit` runs every handler for the topic concurrently and resolves once
//!   all of them have settled.
//! - Handler failures are isolated: an error or panic in one handler is logged
//!   and counted, never propagated to the emitter or to sibling handlers.
//! - No ordering between handlers of a single emit.

use std::sync::Arc;

use tracing::error;

use crate::{Event, EventEnvelope, Handler, HandlerId};

/// Outcome of a single `emit`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct EmitReport {
    /// Handlers that completed successfully.
    pub handled: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

impl EmitReport {
    pub fn total(&self) -> usize {
        self.handled + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Event bus abstraction.
///
/// The bus is constructed explicitly and injected into services; there is no
/// process-global instance.
#[async_trait::async_trait]
pub trait EventBus<M = EventEnvelope>: Send + Sync
where
    M: Clone + Send + 'static,
{
    fn subscribe(&self, event_type: &str, handler: Handler<M>) -> HandlerId;

    /// Returns whether the handler was registered under `event_type`.
    fn unsubscribe(&self, event_type: &str, handler_id: HandlerId) -> bool;

    async fn emit(&self, event_type: &str, message: M) -> EmitReport;

    fn has_subscribers(&self, event_type: &str) -> bool;

    /// Drop every handler of one topic.
    fn clear_event(&self, event_type: &str);

    /// Drop every handler of every topic (teardown).
    fn clear_all(&self);
}

#[async_trait::async_trait]
impl<M, B> EventBus<M> for Arc<B>
where
    M: Clone + Send + 'static,
    B: EventBus<M> + ?Sized,
{
    fn subscribe(&self, event_type: &str, handler: Handler<M>) -> HandlerId {
        (**self).subscribe(event_type, handler)
    }

    fn unsubscribe(&self, event_type: &str, handler_id: HandlerId) -> bool {
        (**self).unsubscribe(event_type, handler_id)
    }

    async fn emit(&self, event_type: &str, message: M) -> EmitReport {
        (**self).emit(event_type, message).await
    }

    fn has_subscribers(&self, event_type: &str) -> bool {
        (**self).has_subscribers(event_type)
    }

    fn clear_event(&self, event_type: &str) {
        (**self).clear_event(event_type)
    }

    fn clear_all(&self) {
        (**self).clear_all()
    }
}

/// Wrap a typed event in an envelope and emit it under its own topic.
///
/// An event that cannot be encoded is logged and dropped; the change it
/// describes has already been persisted.
pub async fn publish<B, E>(bus: &B, event: &E, occurred_at: i64) -> EmitReport
where
    B: EventBus<EventEnvelope> + ?Sized,
    E: Event,
{
    match EventEnvelope::from_event(event, occurred_at) {
        Ok(envelope) => bus.emit(event.event_type(), envelope).await,
        Err(err) => {
            error!(event_type = event.event_type(), error = %err, "failed to encode event");
            EmitReport::default()
        }
    }
}
