//! `pizzapos-orders`: the order lifecycle.
//!
//! The [`Order`] entity and its invariants, the [`OrderRepository`] contract
//! with a blob-store backed implementation, the [`OrderService`] façade that
//! mutates, persists and announces changes, and the menu catalogue items are
//! built from.

pub mod events;
pub mod menu;
pub mod order;
pub mod repository;
pub mod service;

pub use events::{ItemChanged, ItemsAdded, OrderChanged, OrderEvent, OrderUpdated, OrdersCleared, OrdersImported};
pub use menu::{Menu, MenuCategory, MenuItem, Pricing, Selection, Variant};
pub use order::{DisplayTag, EatType, ItemImage, NewOrder, Order, OrderItem, PaymentType};
pub use repository::{ORDERS_KEY, OrderRepository, OrdersDocument, StoreOrderRepository};
pub use service::{OrderService, format_elapsed};
