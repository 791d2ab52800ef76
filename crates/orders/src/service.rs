//! Order service: business rules over the repository plus event emission.
//!
//! Every mutator persists through the repository first and only then emits.
//! An order or item index that does not exist is not an error: the mutator
//! returns `None`/`false` and emits nothing.

use std::sync::Arc;

use chrono::{FixedOffset, TimeZone};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use pizzapos_core::{Clock, DomainError, DomainResult, Entity, OrderId, ShopZone, SystemClock};
use pizzapos_events::{Event, EventBus, EventEnvelope, publish};

use crate::events::{
    ItemChanged, ItemsAdded, OrderChanged, OrderEvent, OrderUpdated, OrdersCleared, OrdersImported,
};
use crate::{DisplayTag, EatType, NewOrder, Order, OrderItem, OrderRepository, OrdersDocument, PaymentType};

pub struct OrderService<R, B> {
    repository: R,
    bus: B,
    clock: Arc<dyn Clock>,
    zone: ShopZone,
}

impl<R, B> OrderService<R, B>
where
    R: OrderRepository,
    B: EventBus<EventEnvelope>,
{
    pub fn new(repository: R, bus: B) -> Self {
        Self {
            repository,
            bus,
            clock: Arc::new(SystemClock),
            zone: ShopZone::Local,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Zone used for the `time` label stamped on new orders.
    pub fn with_zone(mut self, zone: ShopZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_utc_offset(self, offset: FixedOffset) -> Self {
        self.with_zone(ShopZone::Fixed(offset))
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    async fn emit(&self, event: OrderEvent) {
        let report = publish(&self.bus, &event, self.clock.now_millis()).await;
        if !report.is_clean() {
            debug!(event_type = event.event_type(), failed = report.failed, "order event had failing handlers");
        }
    }

    fn time_label(&self, at_ms: i64) -> String {
        self.zone
            .timestamp_millis_opt(at_ms)
            .single()
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_default()
    }

    /// Create, persist and announce a new order.
    ///
    /// The display number comes from the repository counter, which is bumped
    /// (and persisted) before the order itself is written.
    pub async fn add_order(&self, data: NewOrder) -> DomainResult<Order> {
        if data.items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }

        let order_no = self.repository.increment_order_counter()?;
        let now = self.clock.now_millis();
        let id = OrderId::allocate(now, self.repository.newest_id());
        let order = Order::create(data, id, order_no, now, self.time_label(now))?;
        let order = self.repository.save(order)?;

        info!(order_id = %order.id(), order_no, price = order.price(), "order created");
        self.emit(OrderEvent::Created(OrderChanged::of(&order))).await;
        Ok(order)
    }

    /// Re-stamps `served_at` even when the order was already served.
    pub async fn mark_as_served(&self, id: OrderId) -> DomainResult<Option<Order>> {
        let now = self.clock.now_millis();
        let Some(order) = self.mutate(id, |o| o.mark_served(now))? else {
            return Ok(None);
        };
        self.emit(OrderEvent::Served(OrderChanged::of(&order))).await;
        self.emit_if_completed(&order).await;
        Ok(Some(order))
    }

    pub async fn mark_as_unserved(&self, id: OrderId) -> DomainResult<Option<Order>> {
        let Some(order) = self.mutate(id, Order::mark_unserved)? else {
            return Ok(None);
        };
        self.emit(OrderEvent::Unserved(OrderChanged::of(&order))).await;
        Ok(Some(order))
    }

    pub async fn mark_as_paid(
        &self,
        id: OrderId,
        payment_type: Option<PaymentType>,
    ) -> DomainResult<Option<Order>> {
        let now = self.clock.now_millis();
        let Some(order) = self.mutate(id, |o| o.mark_paid(now, payment_type))? else {
            return Ok(None);
        };
        self.emit(OrderEvent::Paid(OrderChanged::of(&order))).await;
        self.emit_if_completed(&order).await;
        Ok(Some(order))
    }

    pub async fn mark_as_unpaid(&self, id: OrderId) -> DomainResult<Option<Order>> {
        let Some(order) = self.mutate(id, Order::mark_unpaid)? else {
            return Ok(None);
        };
        self.emit(OrderEvent::Unpaid(OrderChanged::of(&order))).await;
        Ok(Some(order))
    }

    /// Move an order (typically from history) back to active work.
    pub async fn restore_to_ongoing(&self, id: OrderId) -> DomainResult<Option<Order>> {
        let Some(order) = self.mutate(id, Order::restore_to_ongoing)? else {
            return Ok(None);
        };
        self.emit(OrderEvent::Restored(OrderChanged::of(&order))).await;
        Ok(Some(order))
    }

    /// Returns whether the order existed.
    pub async fn remove_order(&self, id: OrderId) -> DomainResult<bool> {
        let Some(order) = self.repository.find_by_id(id) else {
            return Ok(false);
        };
        if !self.repository.delete(id)? {
            return Ok(false);
        }
        info!(order_id = %id, "order removed");
        self.emit(OrderEvent::Deleted(OrderChanged::of(&order))).await;
        Ok(true)
    }

    pub async fn update_eat_type(&self, id: OrderId, eat_type: EatType) -> DomainResult<Option<Order>> {
        self.update_field(id, "eatType", |o| (o.set_eat_type(eat_type), eat_type))
            .await
    }

    pub async fn update_table_number(
        &self,
        id: OrderId,
        table_number: Option<DisplayTag>,
    ) -> DomainResult<Option<Order>> {
        self.update_field(id, "tableNumber", move |o| {
            (o.set_table_number(table_number.clone()), table_number)
        })
        .await
    }

    pub async fn update_sound_indicator(
        &self,
        id: OrderId,
        sound_indicator: Option<DisplayTag>,
    ) -> DomainResult<Option<Order>> {
        self.update_field(id, "soundIndicator", move |o| {
            (o.set_sound_indicator(sound_indicator.clone()), sound_indicator)
        })
        .await
    }

    pub async fn update_customer_description(
        &self,
        id: OrderId,
        description: Option<String>,
    ) -> DomainResult<Option<Order>> {
        self.update_field(id, "customerDescription", move |o| {
            (o.set_customer_description(description.clone()), description)
        })
        .await
    }

    /// Remove one item and re-derive the order total.
    ///
    /// `Ok(None)` when the order or index does not exist. Removing the only
    /// item fails with [`DomainError::InvariantViolation`].
    pub async fn remove_item_from_order(
        &self,
        id: OrderId,
        item_index: usize,
    ) -> DomainResult<Option<OrderItem>> {
        let Some(mut order) = self.repository.find_by_id(id) else {
            return Ok(None);
        };
        let Some(removed) = order.remove_item(item_index)? else {
            return Ok(None);
        };
        let order = self.repository.save(order)?;

        debug!(order_id = %id, item_index, price = order.price(), "item removed");
        self.emit(OrderEvent::ItemRemoved(ItemChanged {
            order_id: id,
            item_index,
            item: removed.clone(),
            order,
        }))
        .await;
        Ok(Some(removed))
    }

    /// Append items (as unserved) and re-derive the order total.
    pub async fn add_items_to_order(
        &self,
        id: OrderId,
        items: Vec<OrderItem>,
    ) -> DomainResult<Option<Order>> {
        if items.is_empty() {
            return Err(DomainError::validation("no items to add"));
        }
        let Some(mut order) = self.repository.find_by_id(id) else {
            return Ok(None);
        };
        let first_new = order.items().len();
        order.add_items(items);
        let order = self.repository.save(order)?;

        debug!(order_id = %id, added = order.items().len() - first_new, price = order.price(), "items added");
        self.emit(OrderEvent::ItemsAdded(ItemsAdded {
            order_id: id,
            items: order.items()[first_new..].to_vec(),
            order: order.clone(),
        }))
        .await;
        Ok(Some(order))
    }

    pub async fn mark_item_as_served(&self, id: OrderId, item_index: usize) -> DomainResult<bool> {
        self.set_item_served(id, item_index, true).await
    }

    pub async fn mark_item_as_unserved(&self, id: OrderId, item_index: usize) -> DomainResult<bool> {
        self.set_item_served(id, item_index, false).await
    }

    /// Replace the whole store (restore/import).
    pub async fn import_orders(&self, document: OrdersDocument) -> DomainResult<usize> {
        let count = document.orders.len();
        let order_counter = document.order_counter;
        self.repository.import_orders(document.orders, order_counter)?;

        info!(count, order_counter, "orders imported");
        self.emit(OrderEvent::Imported(OrdersImported { count, order_counter })).await;
        Ok(count)
    }

    pub async fn clear_all(&self) -> DomainResult<()> {
        self.repository.clear_all()?;
        info!("all orders cleared");
        self.emit(OrderEvent::Cleared(OrdersCleared {})).await;
        Ok(())
    }

    pub fn get_order(&self, id: OrderId) -> Option<Order> {
        self.repository.find_by_id(id)
    }

    /// Active work: not served, or served but unpaid.
    pub fn get_orders(&self) -> Vec<Order> {
        self.repository.find_ongoing()
    }

    /// History: served and paid, most recent first.
    pub fn get_served_orders(&self) -> Vec<Order> {
        self.repository.find_completed()
    }

    /// Time since `timestamp` as `M:SS`.
    pub fn elapsed_time(&self, timestamp: i64) -> String {
        format_elapsed(self.clock.now_millis() - timestamp)
    }

    fn mutate(&self, id: OrderId, apply: impl FnOnce(&mut Order)) -> DomainResult<Option<Order>> {
        let Some(mut order) = self.repository.find_by_id(id) else {
            debug!(order_id = %id, "order not found; ignoring");
            return Ok(None);
        };
        apply(&mut order);
        Ok(Some(self.repository.save(order)?))
    }

    async fn emit_if_completed(&self, order: &Order) {
        if order.is_completed() {
            info!(order_id = %order.id(), "order completed");
            self.emit(OrderEvent::Completed(OrderChanged::of(order))).await;
        }
    }

    async fn update_field<T, F>(
        &self,
        id: OrderId,
        field: &'static str,
        apply: F,
    ) -> DomainResult<Option<Order>>
    where
        T: Serialize + Send,
        F: FnOnce(&mut Order) -> (T, T) + Send,
    {
        let mut values = None;
        let Some(order) = self.mutate(id, |o| values = Some(apply(o)))? else {
            return Ok(None);
        };
        let (old_value, new_value) = match values {
            Some((old, new)) => (to_json(&old), to_json(&new)),
            None => (JsonValue::Null, JsonValue::Null),
        };
        self.emit(OrderEvent::Updated(OrderUpdated {
            order_id: id,
            field: field.to_string(),
            old_value,
            new_value,
            order: order.clone(),
        }))
        .await;
        Ok(Some(order))
    }

    async fn set_item_served(&self, id: OrderId, item_index: usize, served: bool) -> DomainResult<bool> {
        let Some(mut order) = self.repository.find_by_id(id) else {
            return Ok(false);
        };
        let Some(item) = order.set_item_served(item_index, served).cloned() else {
            return Ok(false);
        };
        let order = self.repository.save(order)?;

        let payload = ItemChanged {
            order_id: id,
            item_index,
            item,
            order,
        };
        let event = if served {
            OrderEvent::ItemServed(payload)
        } else {
            OrderEvent::ItemUnserved(payload)
        };
        self.emit(event).await;
        Ok(true)
    }
}

fn to_json<T: Serialize>(value: &T) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

/// `M:SS`, minutes unpadded and unbounded. Negative spans read as `0:00`.
pub fn format_elapsed(elapsed_ms: i64) -> String {
    let elapsed = elapsed_ms.max(0);
    let minutes = elapsed / 60_000;
    let seconds = (elapsed % 60_000) / 1_000;
    format!("{minutes}:{seconds:02}")
}
