//! Inventory service: stock mutations, stock alerts, and deduction of dough
//! for pizzas as orders come in.

use std::sync::{Arc, RwLock};

use serde::Deserialize;
use tracing::{debug, info};

use pizzapos_core::{Clock, DomainError, DomainResult, StorageError, SystemClock};
use pizzapos_events::{EventBus, EventEnvelope, HandlerId, async_handler, publish, topics};
use pizzapos_orders::OrderItem;

use crate::events::{DoughAdjusted, DoughCountSet, DoughDeducted, InventoryEvent, StockLevel, TrackingChanged};
use crate::{Inventory, InventoryRepository, StockStatus};

/// Number of items classified as pizza.
pub fn count_pizzas_in_items(items: &[OrderItem]) -> usize {
    items.iter().filter(|i| i.is_pizza()).count()
}

/// Parse a count typed by staff: surrounding whitespace is ignored, anything
/// but an integer is rejected.
pub fn parse_count_input(raw: &str) -> DomainResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| DomainError::validation(format!("invalid count: {raw:?} is not an integer")))
}

pub struct InventoryService<R, B> {
    repository: R,
    bus: B,
    clock: Arc<dyn Clock>,
    inventory: RwLock<Inventory>,
}

impl<R, B> InventoryService<R, B>
where
    R: InventoryRepository,
    B: EventBus<EventEnvelope>,
{
    /// Loads the current record from the repository.
    pub fn new(repository: R, bus: B) -> Self {
        let inventory = repository.load();
        Self {
            repository,
            bus,
            clock: Arc::new(SystemClock),
            inventory: RwLock::new(inventory),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Snapshot of the current record.
    pub fn inventory(&self) -> Inventory {
        self.inventory.read().map(|i| *i).unwrap_or_default()
    }

    pub fn stock_status(&self) -> StockStatus {
        self.inventory().stock_status()
    }

    pub fn status_message(&self) -> &'static str {
        self.inventory().status_message()
    }

    /// Assign the count outright and stamp `last_set`.
    pub async fn set_dough_count(&self, count: i64) -> DomainResult<Inventory> {
        let count = u64::try_from(count)
            .map_err(|_| DomainError::validation("invalid count: must be a non-negative integer"))?;
        let now = self.clock.now_millis();
        let (inventory, ()) = self.update(|inv| inv.set_count(count, now))?;

        info!(count, "dough count set");
        self.emit(InventoryEvent::DoughCountSet(DoughCountSet { count, timestamp: now }))
            .await;
        self.check_stock_levels(&inventory).await;
        Ok(inventory)
    }

    /// Add a signed delta; the count never drops below zero.
    pub async fn adjust_dough_count(&self, amount: i64) -> DomainResult<Inventory> {
        let (inventory, (old_count, new_count)) = self.update(|inv| inv.adjust(amount))?;

        debug!(old_count, new_count, amount, "dough adjusted");
        self.emit(InventoryEvent::DoughAdjusted(DoughAdjusted {
            old_count,
            new_count,
            amount,
            timestamp: self.clock.now_millis(),
        }))
        .await;
        self.check_stock_levels(&inventory).await;
        Ok(inventory)
    }

    /// Take one dough ball per pizza.
    ///
    /// No-op (returns `false`) while tracking is disabled or for a
    /// non-positive count.
    pub async fn deduct_dough_for_pizzas(&self, pizzas: i64) -> DomainResult<bool> {
        if pizzas <= 0 || !self.inventory().is_tracking_enabled() {
            return Ok(false);
        }
        let deducted = pizzas.unsigned_abs();
        let (inventory, (old_count, new_count)) = self.update(|inv| inv.adjust(-pizzas))?;

        debug!(old_count, new_count, deducted, "dough deducted");
        self.emit(InventoryEvent::DoughDeducted(DoughDeducted {
            old_count,
            new_count,
            deducted,
            timestamp: self.clock.now_millis(),
        }))
        .await;
        self.check_stock_levels(&inventory).await;
        Ok(true)
    }

    pub async fn enable_tracking(&self) -> DomainResult<Inventory> {
        self.set_tracking(true).await
    }

    pub async fn disable_tracking(&self) -> DomainResult<Inventory> {
        self.set_tracking(false).await
    }

    async fn set_tracking(&self, enabled: bool) -> DomainResult<Inventory> {
        let (inventory, ()) = self.update(|inv| inv.set_tracking(enabled))?;

        info!(enabled, "dough tracking toggled");
        let payload = TrackingChanged {
            timestamp: self.clock.now_millis(),
        };
        let event = if enabled {
            InventoryEvent::TrackingEnabled(payload)
        } else {
            InventoryEvent::TrackingDisabled(payload)
        };
        self.emit(event).await;
        self.check_stock_levels(&inventory).await;
        Ok(inventory)
    }

    /// Apply `change` to a copy, persist it, then commit it in memory.
    fn update<T>(&self, change: impl FnOnce(&mut Inventory) -> T) -> DomainResult<(Inventory, T)> {
        let mut guard = self
            .inventory
            .write()
            .map_err(|_| StorageError::backend("inventory lock poisoned"))?;
        let mut next = *guard;
        let out = change(&mut next);
        self.repository.save(&next)?;
        *guard = next;
        Ok((next, out))
    }

    async fn check_stock_levels(&self, inventory: &Inventory) {
        let level = StockLevel {
            count: inventory.dough_count(),
            timestamp: self.clock.now_millis(),
        };
        if let Some(alert) = InventoryEvent::stock_alert(inventory.stock_status(), level) {
            self.emit(alert).await;
        }
    }

    async fn emit(&self, event: InventoryEvent) {
        publish(&self.bus, &event, self.clock.now_millis()).await;
    }
}

#[derive(Deserialize)]
struct CreatedPayload {
    order: ItemsPayload,
}

#[derive(Deserialize)]
struct ItemsPayload {
    #[serde(default)]
    items: Vec<OrderItem>,
}

impl<R, B> InventoryService<R, B>
where
    R: InventoryRepository + 'static,
    B: EventBus<EventEnvelope> + 'static,
{
    /// Deduct dough whenever pizzas are ordered: for the items of a created
    /// order, and for items added to an existing one.
    pub fn attach_order_listener<L>(self: &Arc<Self>, bus: &L) -> Vec<HandlerId>
    where
        L: EventBus<EventEnvelope> + ?Sized,
    {
        let on_created = {
            let service = Arc::clone(self);
            async_handler(move |env: EventEnvelope| {
                let service = Arc::clone(&service);
                async move {
                    let payload: CreatedPayload = env.decode()?;
                    service.deduct_for(&payload.order.items).await
                }
            })
        };
        let on_items_added = {
            let service = Arc::clone(self);
            async_handler(move |env: EventEnvelope| {
                let service = Arc::clone(&service);
                async move {
                    let payload: ItemsPayload = env.decode()?;
                    service.deduct_for(&payload.items).await
                }
            })
        };

        vec![
            bus.subscribe(topics::ORDER_CREATED, on_created),
            bus.subscribe(topics::ORDER_ITEMS_ADDED, on_items_added),
        ]
    }

    async fn deduct_for(&self, items: &[OrderItem]) -> anyhow::Result<()> {
        let pizzas = count_pizzas_in_items(items);
        if pizzas > 0 {
            self.deduct_dough_for_pizzas(i64::try_from(pizzas)?).await?;
        }
        Ok(())
    }
}
