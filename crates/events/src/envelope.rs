use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::Event;

/// Envelope for a published event.
///
/// Notes:
/// - `event_type` is the topic the envelope was emitted under.
/// - `occurred_at` is the emission instant in epoch milliseconds.
/// - `payload` defaults to the JSON form of the typed event, so handlers in
///   other crates can decode only the fields they care about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<E = JsonValue> {
    event_id: Uuid,
    event_type: String,
    occurred_at: i64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_type: impl Into<String>, occurred_at: i64, payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event_type.into(),
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn occurred_at(&self) -> i64 {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl EventEnvelope<JsonValue> {
    /// Wrap a typed event, serializing it into the JSON payload.
    pub fn from_event<T: Event>(event: &T, occurred_at: i64) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event.event_type(), occurred_at, serde_json::to_value(event)?))
    }

    /// Decode the payload (or a subset of it) into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
