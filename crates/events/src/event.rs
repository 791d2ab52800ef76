use serde::Serialize;

/// A domain event.
///
/// Events are facts: they are built after the change they describe has been
/// persisted and are never mutated afterwards. The serialized form is the
/// payload handlers receive.
pub trait Event: Serialize + Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Topic the event is published under (e.g. `"order:created"`).
    fn event_type(&self) -> &'static str;
}
