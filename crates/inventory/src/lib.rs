//! `pizzapos-inventory`: dough stock tracking.
//!
//! A single persisted [`Inventory`] record, its repository, and the
//! [`InventoryService`] that mutates it and raises stock alerts.

pub mod events;
pub mod repository;
pub mod service;
pub mod stock;

pub use events::{DoughAdjusted, DoughCountSet, DoughDeducted, InventoryEvent, StockLevel, TrackingChanged};
pub use repository::{INVENTORY_KEY, InventoryRepository, StoreInventoryRepository};
pub use service::{InventoryService, count_pizzas_in_items, parse_count_input};
pub use stock::{CRITICAL_THRESHOLD, DoughStock, Inventory, LOW_THRESHOLD, StockStatus};
