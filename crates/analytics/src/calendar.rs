//! Local-calendar arithmetic over epoch-millisecond timestamps.
//!
//! Weeks run Sunday through Saturday. Day boundaries are resolved in the
//! caller's time zone; a midnight skipped by a DST jump resolves to the
//! first instant after the gap.

use core::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Inclusive span of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Sunday-to-Saturday week starting at `start`.
    pub fn week(start: NaiveDate) -> Self {
        Self::new(start, start + Duration::days(6))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// A span that contains `today` is cut short at `today`.
    pub fn until(self, today: NaiveDate) -> Self {
        if self.contains(today) {
            Self::new(self.start, today)
        } else {
            self
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    /// Epoch-millisecond bounds: first day from 00:00:00.000, last day
    /// through 23:59:59.999.
    pub fn millis_bounds<Tz: TimeZone>(&self, tz: &Tz) -> (i64, i64) {
        (start_of_day_millis(tz, self.start), end_of_day_millis(tz, self.end))
    }
}

/// Calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based.
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn previous(&self) -> Self {
        if self.month <= 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    pub fn next(&self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Every day of the month; `None` for an invalid month.
    pub fn span(&self) -> Option<DateSpan> {
        let first = self.first_day()?;
        let last = self.next().first_day()?.pred_opt()?;
        Some(DateSpan::new(first, last))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub fn local_datetime<Tz: TimeZone>(tz: &Tz, millis: i64) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(tz))
}

pub fn local_date<Tz: TimeZone>(tz: &Tz, millis: i64) -> Option<NaiveDate> {
    local_datetime(tz, millis).map(|dt| dt.date_naive())
}

pub fn local_hour<Tz: TimeZone>(tz: &Tz, millis: i64) -> Option<u32> {
    local_datetime(tz, millis).map(|dt| dt.hour())
}

pub fn start_of_day_millis<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    resolve(tz, date.and_time(NaiveTime::MIN), true)
}

pub fn end_of_day_millis<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    resolve(tz, date.and_time(NaiveTime::MIN) + Duration::milliseconds(86_399_999), false)
}

fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime, earliest: bool) -> i64 {
    let mapped = tz.from_local_datetime(&naive);
    let picked = if earliest { mapped.earliest() } else { mapped.latest() };
    match picked {
        Some(dt) => dt.timestamp_millis(),
        None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.timestamp_millis())
            .unwrap_or_else(|| naive.and_utc().timestamp_millis()),
    }
}
