//! Aggregate statistics over a set of orders.

use std::collections::{BTreeMap, HashMap};

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use pizzapos_orders::{EatType, Order, OrderItem};

use crate::calendar::local_hour;

/// Length of [`Stats::top_items_sorted`].
pub const TOP_ITEMS_LIMIT: usize = 10;

const PIZZA_NAMES: &[&str] = &[
    "margherita",
    "prosciutto",
    "salame",
    "formaggi",
    "vegetariana",
    "funghi",
    "capricciosa",
    "bianca",
    "chicken",
    "sausage",
    "tuna",
    "hawaiian",
    "custom",
];

const QUESADILLA_NAMES: &[&str] = &["cheese", "beef", "ham", "spinach", "mushroom", "pepperoni", "nutella"];

/// Item name without its size suffix: `"Margherita (L)"` reads `"Margherita"`.
pub fn base_item_name(name: &str) -> &str {
    name.split(" (").next().unwrap_or(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Pizza,
    Quesadilla,
    Other,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Pizza => "Pizza",
            ItemCategory::Quesadilla => "Quesadilla",
            ItemCategory::Other => "Other",
        }
    }

    /// The image path decides when the item has one. Older items without an
    /// image are matched by name against the known menu.
    pub fn infer(item: &OrderItem) -> Self {
        match item.image.as_ref().map(|img| img.primary_path()) {
            Some(path) if !path.is_empty() => {
                if path.contains("pizza") {
                    ItemCategory::Pizza
                } else if path.contains("quesadilla") {
                    ItemCategory::Quesadilla
                } else {
                    ItemCategory::Other
                }
            }
            _ => Self::from_name(base_item_name(&item.name)),
        }
    }

    fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if PIZZA_NAMES.iter().any(|n| lower.contains(n)) {
            ItemCategory::Pizza
        } else if !lower.contains("pizza") && QUESADILLA_NAMES.iter().any(|n| lower.contains(n)) {
            ItemCategory::Quesadilla
        } else {
            ItemCategory::Other
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersByType {
    #[serde(rename = "eat-in")]
    pub eat_in: usize,
    #[serde(rename = "take-away")]
    pub take_away: usize,
}

impl OrdersByType {
    pub fn get(&self, eat_type: EatType) -> usize {
        match eat_type {
            EatType::EatIn => self.eat_in,
            EatType::TakeAway => self.take_away,
        }
    }

    fn record(&mut self, eat_type: EatType) {
        match eat_type {
            EatType::EatIn => self.eat_in += 1,
            EatType::TakeAway => self.take_away += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub count: usize,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_orders: usize,
    pub total_revenue: i64,
    pub average_order_value: i64,
    pub items_sold: usize,
    pub orders_by_type: OrdersByType,
    /// Local hour (0-23) to order count; hours without orders are absent.
    pub orders_by_hour: BTreeMap<u32, usize>,
    pub category_breakdown: BTreeMap<ItemCategory, CategoryTotals>,
    /// Most frequent items, ties kept in first-seen order.
    pub top_items_sorted: Vec<ItemCount>,
}

/// Compute [`Stats`] for `orders`, reading hours in `tz`.
///
/// An empty slice yields the all-zero value.
pub fn calculate_stats<Tz: TimeZone>(orders: &[Order], tz: &Tz) -> Stats {
    let mut stats = Stats::default();
    if orders.is_empty() {
        return stats;
    }

    let mut item_counts: Vec<ItemCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for order in orders {
        stats.total_orders += 1;
        stats.total_revenue += order.price();
        stats.orders_by_type.record(order.eat_type());
        if let Some(hour) = local_hour(tz, order.timestamp()) {
            *stats.orders_by_hour.entry(hour).or_default() += 1;
        }

        for item in order.items() {
            stats.items_sold += 1;

            let name = base_item_name(&item.name);
            match positions.get(name) {
                Some(&pos) => item_counts[pos].count += 1,
                None => {
                    positions.insert(name.to_string(), item_counts.len());
                    item_counts.push(ItemCount {
                        name: name.to_string(),
                        count: 1,
                    });
                }
            }

            let totals = stats.category_breakdown.entry(ItemCategory::infer(item)).or_default();
            totals.count += 1;
            totals.revenue += item.price;
        }
    }

    stats.average_order_value = round_ratio(stats.total_revenue, stats.total_orders as i64);

    // `sort_by` is stable: equal counts keep first-seen order.
    item_counts.sort_by(|a, b| b.count.cmp(&a.count));
    item_counts.truncate(TOP_ITEMS_LIMIT);
    stats.top_items_sorted = item_counts;

    stats
}

/// Percentage change in whole percent; a zero baseline reads as +100% when
/// anything was recorded, 0% otherwise.
pub fn percent_change(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    round_half_up((current - previous) as f64 * 100.0 / previous as f64)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub revenue_change: i64,
    pub orders_change: i64,
    pub avg_order_change: i64,
}

impl Comparison {
    pub fn between(current: &Stats, previous: &Stats) -> Self {
        Self {
            revenue_change: percent_change(current.total_revenue, previous.total_revenue),
            orders_change: percent_change(current.total_orders as i64, previous.total_orders as i64),
            avg_order_change: percent_change(current.average_order_value, previous.average_order_value),
        }
    }
}

/// Halves round toward positive infinity.
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub(crate) fn round_ratio(numerator: i64, denominator: i64) -> i64 {
    if denominator == 0 {
        0
    } else {
        round_half_up(numerator as f64 / denominator as f64)
    }
}
