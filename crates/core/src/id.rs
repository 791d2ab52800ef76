//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an order.
///
/// The value is the creation instant in epoch milliseconds, which keeps the
/// persisted format identical to existing data. Uniqueness is guaranteed by
/// [`OrderId::allocate`] under the single-writer assumption.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Allocate an id for an order created at `now_ms`.
    ///
    /// Falls back to `newest + 1` when the clock has not moved past the newest
    /// existing id (same millisecond, or a clock stepped backwards).
    pub fn allocate(now_ms: i64, newest: Option<OrderId>) -> Self {
        match newest {
            Some(OrderId(last)) if last >= now_ms => Self(last + 1),
            _ => Self(now_ms),
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<OrderId> for i64 {
    fn from(value: OrderId) -> Self {
        value.0
    }
}

impl FromStr for OrderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|e| DomainError::invalid_id(format!("OrderId: {e}")))?;
        Ok(Self(value))
    }
}
