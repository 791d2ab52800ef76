//! In-memory event bus.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::bus::{EmitReport, EventBus};
use crate::{Handler, HandlerId};

/// In-process pub/sub bus.
///
/// - Handlers are kept per topic in registration order.
/// - `emit` snapshots the topic's handlers, then spawns each one on a
///   [`JoinSet`]; handlers subscribed or removed during an emit only affect
///   later emits.
/// - Requires a tokio runtime when emitting.
pub struct InMemoryEventBus<M> {
    handlers: Mutex<HashMap<String, BTreeMap<HandlerId, Handler<M>>>>,
    next_id: AtomicU64,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, event_type: &str) -> Vec<(HandlerId, Handler<M>)> {
        match self.handlers.lock() {
            Ok(map) => map
                .get(event_type)
                .map(|hs| hs.iter().map(|(id, h)| (*id, Arc::clone(h))).collect())
                .unwrap_or_default(),
            Err(_) => {
                error!(event_type, "event bus lock poisoned; dropping emit");
                Vec::new()
            }
        }
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<M> core::fmt::Debug for InMemoryEventBus<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let topics: Vec<(String, usize)> = self
            .handlers
            .lock()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.len())).collect())
            .unwrap_or_default();
        f.debug_struct("InMemoryEventBus").field("topics", &topics).finish()
    }
}

#[async_trait::async_trait]
impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    fn subscribe(&self, event_type: &str, handler: Handler<M>) -> HandlerId {
        let id = HandlerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        // A poisoned lock still hands out an id; the handler just never fires.
        if let Ok(mut map) = self.handlers.lock() {
            map.entry(event_type.to_string()).or_default().insert(id, handler);
        }
        debug!(event_type, handler_id = %id, "handler subscribed");
        id
    }

    fn unsubscribe(&self, event_type: &str, handler_id: HandlerId) -> bool {
        let Ok(mut map) = self.handlers.lock() else {
            return false;
        };
        let Some(topic) = map.get_mut(event_type) else {
            return false;
        };
        let removed = topic.remove(&handler_id).is_some();
        if topic.is_empty() {
            map.remove(event_type);
        }
        removed
    }

    async fn emit(&self, event_type: &str, message: M) -> EmitReport {
        let handlers = self.snapshot(event_type);
        if handlers.is_empty() {
            return EmitReport::default();
        }

        let mut tasks = JoinSet::new();
        for (id, handler) in handlers {
            let message = message.clone();
            tasks.spawn(async move { (id, handler(message).await) });
        }

        let mut report = EmitReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.handled += 1,
                Ok((id, Err(err))) => {
                    warn!(event_type, handler_id = %id, error = %err, "event handler failed");
                    report.failed += 1;
                }
                Err(join_err) => {
                    error!(event_type, error = %join_err, "event handler panicked");
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn has_subscribers(&self, event_type: &str) -> bool {
        self.handlers
            .lock()
            .map(|m| m.get(event_type).is_some_and(|hs| !hs.is_empty()))
            .unwrap_or(false)
    }

    fn clear_event(&self, event_type: &str) {
        if let Ok(mut map) = self.handlers.lock() {
            map.remove(event_type);
        }
    }

    fn clear_all(&self) {
        if let Ok(mut map) = self.handlers.lock() {
            map.clear();
        }
    }
}
