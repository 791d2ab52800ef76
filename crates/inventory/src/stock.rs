use serde::{Deserialize, Serialize};

/// At or below this count (and above zero) stock is critical.
pub const CRITICAL_THRESHOLD: u64 = 5;
/// At or below this count (and above critical) stock is low.
pub const LOW_THRESHOLD: u64 = 10;

/// Derived stock level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Disabled,
    Out,
    Critical,
    Low,
    Normal,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Disabled => "disabled",
            StockStatus::Out => "out",
            StockStatus::Critical => "critical",
            StockStatus::Low => "low",
            StockStatus::Normal => "normal",
        }
    }

    /// Short human-readable status line.
    pub fn message(&self) -> &'static str {
        match self {
            StockStatus::Disabled => "Tracking disabled",
            StockStatus::Out => "Out of stock!",
            StockStatus::Critical => "Critical - restock soon",
            StockStatus::Low => "Running low",
            StockStatus::Normal => "Stock is good",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dough stock record, persisted as `{count, trackingEnabled, lastSet}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoughStock {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub tracking_enabled: bool,
    /// Last explicit count assignment; adjustments and deductions leave it.
    #[serde(default)]
    pub last_set: Option<i64>,
}

/// Singleton stock record, persisted as `{dough: {...}}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub dough: DoughStock,
}

impl Inventory {
    pub fn dough_count(&self) -> u64 {
        self.dough.count
    }

    pub fn is_tracking_enabled(&self) -> bool {
        self.dough.tracking_enabled
    }

    /// Precedence: disabled, out, critical, low, normal.
    pub fn stock_status(&self) -> StockStatus {
        let count = self.dough.count;
        if !self.dough.tracking_enabled {
            StockStatus::Disabled
        } else if count == 0 {
            StockStatus::Out
        } else if count <= CRITICAL_THRESHOLD {
            StockStatus::Critical
        } else if count <= LOW_THRESHOLD {
            StockStatus::Low
        } else {
            StockStatus::Normal
        }
    }

    pub fn status_message(&self) -> &'static str {
        self.stock_status().message()
    }

    pub fn set_count(&mut self, count: u64, now: i64) {
        self.dough.count = count;
        self.dough.last_set = Some(now);
    }

    /// Apply a signed delta, flooring at zero. Returns `(old, new)`.
    pub fn adjust(&mut self, delta: i64) -> (u64, u64) {
        let old = self.dough.count;
        let new = if delta.is_negative() {
            old.saturating_sub(delta.unsigned_abs())
        } else {
            old.saturating_add(delta.unsigned_abs())
        };
        self.dough.count = new;
        (old, new)
    }

    pub fn set_tracking(&mut self, enabled: bool) {
        self.dough.tracking_enabled = enabled;
    }
}
