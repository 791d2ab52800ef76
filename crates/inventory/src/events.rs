//! Inventory domain events.

use serde::{Deserialize, Serialize};

use pizzapos_events::{Event, topics};

use crate::StockStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoughCountSet {
    pub count: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoughAdjusted {
    pub old_count: u64,
    pub new_count: u64,
    pub amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoughDeducted {
    pub old_count: u64,
    pub new_count: u64,
    pub deducted: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingChanged {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub count: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InventoryEvent {
    DoughCountSet(DoughCountSet),
    DoughAdjusted(DoughAdjusted),
    DoughDeducted(DoughDeducted),
    TrackingEnabled(TrackingChanged),
    TrackingDisabled(TrackingChanged),
    StockOut(StockLevel),
    StockCritical(StockLevel),
    StockLow(StockLevel),
    StockNormal(StockLevel),
}

impl InventoryEvent {
    /// The stock alert for `status`; none while tracking is disabled.
    pub fn stock_alert(status: StockStatus, level: StockLevel) -> Option<Self> {
        match status {
            StockStatus::Disabled => None,
            StockStatus::Out => Some(InventoryEvent::StockOut(level)),
            StockStatus::Critical => Some(InventoryEvent::StockCritical(level)),
            StockStatus::Low => Some(InventoryEvent::StockLow(level)),
            StockStatus::Normal => Some(InventoryEvent::StockNormal(level)),
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::DoughCountSet(_) => topics::DOUGH_COUNT_SET,
            InventoryEvent::DoughAdjusted(_) => topics::DOUGH_ADJUSTED,
            InventoryEvent::DoughDeducted(_) => topics::DOUGH_DEDUCTED,
            InventoryEvent::TrackingEnabled(_) => topics::TRACKING_ENABLED,
            InventoryEvent::TrackingDisabled(_) => topics::TRACKING_DISABLED,
            InventoryEvent::StockOut(_) => topics::STOCK_OUT,
            InventoryEvent::StockCritical(_) => topics::STOCK_CRITICAL,
            InventoryEvent::StockLow(_) => topics::STOCK_LOW,
            InventoryEvent::StockNormal(_) => topics::STOCK_NORMAL,
        }
    }
}
