//! Completed orders grouped by local calendar day.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use pizzapos_orders::Order;

use crate::calendar::local_date;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHistory {
    pub date: NaiveDate,
    /// Sum of order prices for the day.
    pub total: i64,
    pub orders: Vec<Order>,
}

impl DayHistory {
    /// `"March 5, 2024"`.
    pub fn label(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }

    /// Like [`label`](Self::label), prefixed with `Today` for the current day.
    pub fn display_label(&self, today: NaiveDate) -> String {
        if self.date == today {
            format!("Today ({})", self.label())
        } else {
            self.label()
        }
    }
}

/// Group `orders` by local day: days most recent first, orders within a day
/// in input order.
pub fn history_by_day<Tz: TimeZone>(orders: &[Order], tz: &Tz) -> Vec<DayHistory> {
    let mut days: BTreeMap<NaiveDate, DayHistory> = BTreeMap::new();
    for order in orders {
        let Some(date) = local_date(tz, order.timestamp()) else {
            continue;
        };
        let day = days.entry(date).or_insert_with(|| DayHistory {
            date,
            total: 0,
            orders: Vec::new(),
        });
        day.total += order.price();
        day.orders.push(order.clone());
    }
    days.into_values().rev().collect()
}
