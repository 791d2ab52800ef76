//! Topic names.
//!
//! Topics are flat strings scoped by domain. The values are part of the
//! collaborator contract and must not change.

pub const ORDER_CREATED: &str = "order:created";
pub const ORDER_DELETED: &str = "order:deleted";
pub const ORDER_RESTORED: &str = "order:restored";
pub const ORDER_SERVED: &str = "order:served";
pub const ORDER_UNSERVED: &str = "order:unserved";
pub const ORDER_PAID: &str = "order:paid";
pub const ORDER_UNPAID: &str = "order:unpaid";
pub const ORDER_COMPLETED: &str = "order:completed";
pub const ORDER_UPDATED: &str = "order:updated";
pub const ORDER_ITEM_SERVED: &str = "order:item:served";
pub const ORDER_ITEM_UNSERVED: &str = "order:item:unserved";
pub const ORDER_ITEM_REMOVED: &str = "order:item:removed";
pub const ORDER_ITEMS_ADDED: &str = "order:items:added";
pub const ORDERS_IMPORTED: &str = "orders:imported";
pub const ORDERS_CLEARED: &str = "orders:cleared";

pub const DOUGH_COUNT_SET: &str = "inventory:dough:set";
pub const DOUGH_DEDUCTED: &str = "inventory:dough:deducted";
pub const DOUGH_ADJUSTED: &str = "inventory:dough:adjusted";
pub const TRACKING_ENABLED: &str = "inventory:tracking:enabled";
pub const TRACKING_DISABLED: &str = "inventory:tracking:disabled";
pub const STOCK_LOW: &str = "inventory:stock:low";
pub const STOCK_CRITICAL: &str = "inventory:stock:critical";
pub const STOCK_OUT: &str = "inventory:stock:out";
pub const STOCK_NORMAL: &str = "inventory:stock:normal";
