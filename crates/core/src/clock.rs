//! Time source abstraction.
//!
//! Services read the current instant through a [`Clock`] so tests can pin
//! time instead of sleeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Source of the current instant, in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;

    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_millis())
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Zone used for calendar days, hour buckets and time labels.
///
/// `Local` resolves the host offset for each instant, so a DST change is
/// picked up without a restart. `Fixed` pins one offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShopZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl ShopZone {
    /// `Fixed` for a valid offset in minutes east of UTC, else `Local`.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        minutes
            .and_then(|m| FixedOffset::east_opt(m.checked_mul(60)?))
            .map_or(ShopZone::Local, ShopZone::Fixed)
    }
}

impl TimeZone for ShopZone {
    type Offset = FixedOffset;

    fn from_offset(offset: &FixedOffset) -> Self {
        ShopZone::Fixed(*offset)
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
        self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
        match self {
            ShopZone::Local => Local.offset_from_local_datetime(local),
            ShopZone::Fixed(offset) => LocalResult::Single(*offset),
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
        match self {
            ShopZone::Local => Local.offset_from_utc_datetime(utc),
            ShopZone::Fixed(offset) => *offset,
        }
    }
}

/// Wall clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and replays.
///
/// Clones share the same underlying instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    pub fn starting_at(instant: DateTime<Utc>) -> Self {
        Self::new(instant.timestamp_millis())
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
