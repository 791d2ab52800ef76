//! Order domain events.
//!
//! Each event serializes to a flat JSON object: every order event carries
//! `{order, orderId}`, item events add `{itemIndex, item}`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use pizzapos_core::{Entity, OrderId};
use pizzapos_events::{Event, topics};

use crate::{Order, OrderItem};

/// Payload of whole-order lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChanged {
    pub order: Order,
    pub order_id: OrderId,
}

impl OrderChanged {
    pub fn of(order: &Order) -> Self {
        Self {
            order: order.clone(),
            order_id: order.id(),
        }
    }
}

/// Payload of a single-field update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdated {
    pub order: Order,
    pub order_id: OrderId,
    pub field: String,
    pub old_value: JsonValue,
    pub new_value: JsonValue,
}

/// Payload of item-level events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemChanged {
    pub order: Order,
    pub order_id: OrderId,
    pub item_index: usize,
    pub item: OrderItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsAdded {
    pub order: Order,
    pub order_id: OrderId,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersImported {
    pub count: usize,
    pub order_counter: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersCleared {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderEvent {
    Created(OrderChanged),
    Deleted(OrderChanged),
    Restored(OrderChanged),
    Served(OrderChanged),
    Unserved(OrderChanged),
    Paid(OrderChanged),
    Unpaid(OrderChanged),
    Completed(OrderChanged),
    Updated(OrderUpdated),
    ItemServed(ItemChanged),
    ItemUnserved(ItemChanged),
    ItemRemoved(ItemChanged),
    ItemsAdded(ItemsAdded),
    Imported(OrdersImported),
    Cleared(OrdersCleared),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => topics::ORDER_CREATED,
            OrderEvent::Deleted(_) => topics::ORDER_DELETED,
            OrderEvent::Restored(_) => topics::ORDER_RESTORED,
            OrderEvent::Served(_) => topics::ORDER_SERVED,
            OrderEvent::Unserved(_) => topics::ORDER_UNSERVED,
            OrderEvent::Paid(_) => topics::ORDER_PAID,
            OrderEvent::Unpaid(_) => topics::ORDER_UNPAID,
            OrderEvent::Completed(_) => topics::ORDER_COMPLETED,
            OrderEvent::Updated(_) => topics::ORDER_UPDATED,
            OrderEvent::ItemServed(_) => topics::ORDER_ITEM_SERVED,
            OrderEvent::ItemUnserved(_) => topics::ORDER_ITEM_UNSERVED,
            OrderEvent::ItemRemoved(_) => topics::ORDER_ITEM_REMOVED,
            OrderEvent::ItemsAdded(_) => topics::ORDER_ITEMS_ADDED,
            OrderEvent::Imported(_) => topics::ORDERS_IMPORTED,
            OrderEvent::Cleared(_) => topics::ORDERS_CLEARED,
        }
    }
}
