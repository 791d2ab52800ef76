//! Period queries over completed orders.
//!
//! Every call re-reads the repository; nothing is cached between calls.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use pizzapos_core::{Clock, SystemClock};
use pizzapos_orders::{Order, OrderRepository};

use crate::calendar::{DateSpan, YearMonth, local_date, local_hour, week_start};
use crate::history::{DayHistory, history_by_day};
use crate::stats::{Comparison, Stats, calculate_stats};

/// Number of hours [`Analytics::peak_hours`] reports.
pub const PEAK_HOURS: usize = 3;

/// One chart row: a day or hour with its order count and revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub label: String,
    pub orders: usize,
    pub revenue: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourSlot {
    pub hour: u32,
    pub orders: usize,
    pub revenue: i64,
}

/// Orders considered by [`Analytics::peak_hours`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakScope {
    Day(NaiveDate),
    /// Week starting on the given Sunday.
    Week(NaiveDate),
    Month(YearMonth),
    Overall,
}

pub struct Analytics<R, Tz: TimeZone = Local> {
    repository: R,
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl<R: OrderRepository> Analytics<R, Local> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
            tz: Local,
        }
    }
}

impl<R: OrderRepository, Tz: TimeZone> Analytics<R, Tz> {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Evaluate calendar days and hours in `tz`.
    pub fn with_timezone<T: TimeZone>(self, tz: T) -> Analytics<R, T> {
        Analytics {
            repository: self.repository,
            clock: self.clock,
            tz,
        }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now_utc().with_timezone(&self.tz).date_naive()
    }

    /// Served and paid orders, in creation order.
    pub fn completed_orders(&self) -> Vec<Order> {
        self.repository
            .find_all()
            .into_iter()
            .filter(Order::is_completed)
            .collect()
    }

    /// Completed orders from the start of `start` through the end of `end`.
    pub fn orders_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Order> {
        self.orders_in(DateSpan::new(start, end))
    }

    pub fn orders_in(&self, span: DateSpan) -> Vec<Order> {
        let (from, to) = span.millis_bounds(&self.tz);
        self.completed_orders()
            .into_iter()
            .filter(|o| o.timestamp() >= from && o.timestamp() <= to)
            .collect()
    }

    pub fn day_orders(&self, date: NaiveDate) -> Vec<Order> {
        self.orders_in(DateSpan::day(date))
    }

    pub fn today_orders(&self) -> Vec<Order> {
        self.day_orders(self.today())
    }

    pub fn yesterday_orders(&self) -> Vec<Order> {
        self.day_orders(self.today() - Duration::days(1))
    }

    /// Sunday of the current week through today.
    pub fn week_orders(&self) -> Vec<Order> {
        let today = self.today();
        self.orders_in_range(week_start(today), today)
    }

    /// The full week starting at `start`.
    pub fn week_orders_from(&self, start: NaiveDate) -> Vec<Order> {
        self.orders_in(DateSpan::week(start))
    }

    pub fn last_week_orders(&self) -> Vec<Order> {
        self.week_orders_from(week_start(self.today()) - Duration::days(7))
    }

    /// First of the current month through today.
    pub fn month_orders(&self) -> Vec<Order> {
        let today = self.today();
        self.orders_in_range(today.with_day(1).unwrap_or(today), today)
    }

    pub fn month_orders_of(&self, month: YearMonth) -> Vec<Order> {
        month.span().map(|span| self.orders_in(span)).unwrap_or_default()
    }

    pub fn last_month_orders(&self) -> Vec<Order> {
        self.month_orders_of(YearMonth::of(self.today()).previous())
    }

    pub fn calculate_stats(&self, orders: &[Order]) -> Stats {
        calculate_stats(orders, &self.tz)
    }

    pub fn daily_stats(&self) -> Stats {
        self.calculate_stats(&self.today_orders())
    }

    pub fn weekly_stats(&self) -> Stats {
        self.calculate_stats(&self.week_orders())
    }

    pub fn monthly_stats(&self) -> Stats {
        self.calculate_stats(&self.month_orders())
    }

    pub fn comparison(&self, current: &[Order], previous: &[Order]) -> Comparison {
        Comparison::between(&self.calculate_stats(current), &self.calculate_stats(previous))
    }

    /// Today against yesterday.
    pub fn daily_comparison(&self) -> Comparison {
        self.comparison(&self.today_orders(), &self.yesterday_orders())
    }

    /// This week so far against the whole of last week.
    pub fn weekly_comparison(&self) -> Comparison {
        self.comparison(&self.week_orders(), &self.last_week_orders())
    }

    /// This month so far against the whole of last month.
    pub fn monthly_comparison(&self) -> Comparison {
        self.comparison(&self.month_orders(), &self.last_month_orders())
    }

    /// One row per day (`"Sun"`..`"Sat"`) of the week starting at `start`,
    /// ending at today for the current week.
    pub fn week_breakdown(&self, start: NaiveDate) -> Vec<BreakdownRow> {
        self.daily_rows(DateSpan::week(start), |d| d.format("%a").to_string())
    }

    pub fn current_week_breakdown(&self) -> Vec<BreakdownRow> {
        self.week_breakdown(week_start(self.today()))
    }

    /// One row per day of `month` labelled by day number, ending at today
    /// for the current month.
    pub fn month_breakdown(&self, month: YearMonth) -> Vec<BreakdownRow> {
        match month.span() {
            Some(span) => self.daily_rows(span, |d| d.day().to_string()),
            None => Vec::new(),
        }
    }

    /// Twenty-four rows (`"0:00"`..`"23:00"`) for `date`.
    pub fn hourly_breakdown(&self, date: NaiveDate) -> Vec<BreakdownRow> {
        self.hour_slots(&self.day_orders(date))
            .into_iter()
            .map(|slot| BreakdownRow {
                label: format!("{}:00", slot.hour),
                orders: slot.orders,
                revenue: slot.revenue,
            })
            .collect()
    }

    /// The [`PEAK_HOURS`] busiest hours by order count, earlier hour first
    /// on ties. Quiet periods are padded with empty hours.
    pub fn peak_hours(&self, scope: PeakScope) -> Vec<HourSlot> {
        let orders = match scope {
            PeakScope::Day(date) => self.day_orders(date),
            PeakScope::Week(start) => self.week_orders_from(start),
            PeakScope::Month(month) => self.month_orders_of(month),
            PeakScope::Overall => self.completed_orders(),
        };
        let mut slots = self.hour_slots(&orders);
        slots.sort_by(|a, b| b.orders.cmp(&a.orders));
        slots.truncate(PEAK_HOURS);
        slots
    }

    /// Distinct local days with completed orders, most recent first.
    pub fn days_with_data(&self) -> Vec<NaiveDate> {
        self.distinct_dates(|d| d)
    }

    /// Distinct week starts (Sundays) with completed orders, most recent first.
    pub fn weeks_with_data(&self) -> Vec<NaiveDate> {
        self.distinct_dates(week_start)
    }

    /// Distinct months with completed orders, most recent first.
    pub fn months_with_data(&self) -> Vec<YearMonth> {
        let months: BTreeSet<YearMonth> = self
            .completed_dates()
            .into_iter()
            .map(YearMonth::of)
            .collect();
        months.into_iter().rev().collect()
    }

    /// Completed orders grouped by day, newest day first.
    pub fn history(&self) -> Vec<DayHistory> {
        history_by_day(&self.repository.find_completed(), &self.tz)
    }

    fn completed_dates(&self) -> Vec<NaiveDate> {
        self.completed_orders()
            .iter()
            .filter_map(|o| local_date(&self.tz, o.timestamp()))
            .collect()
    }

    fn distinct_dates(&self, key: impl Fn(NaiveDate) -> NaiveDate) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self.completed_dates().into_iter().map(key).collect();
        dates.into_iter().rev().collect()
    }

    fn daily_rows(&self, span: DateSpan, label: impl Fn(NaiveDate) -> String) -> Vec<BreakdownRow> {
        let span = span.until(self.today());
        let orders = self.orders_in(span);
        span.days()
            .map(|day| {
                let mut row = BreakdownRow {
                    label: label(day),
                    orders: 0,
                    revenue: 0,
                };
                for order in orders
                    .iter()
                    .filter(|o| local_date(&self.tz, o.timestamp()) == Some(day))
                {
                    row.orders += 1;
                    row.revenue += order.price();
                }
                row
            })
            .collect()
    }

    fn hour_slots(&self, orders: &[Order]) -> Vec<HourSlot> {
        let mut slots: Vec<HourSlot> = (0..24)
            .map(|hour| HourSlot {
                hour,
                orders: 0,
                revenue: 0,
            })
            .collect();
        for order in orders {
            if let Some(slot) = local_hour(&self.tz, order.timestamp()).and_then(|h| slots.get_mut(h as usize)) {
                slot.orders += 1;
                slot.revenue += order.price();
            }
        }
        slots
    }
}
