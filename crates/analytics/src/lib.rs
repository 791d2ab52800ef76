//! `pizzapos-analytics`: reporting over completed orders.
//!
//! - `engine`: period queries, stats, comparisons, breakdowns, peak hours,
//!   period discovery and history, all re-derived from the order repository
//! - `stats`: the pure aggregate over a slice of orders
//! - `charts`: SVG/HTML markup for `{label, value}` series
//! - `achievements` / `tracker`: milestone catalogue and persisted progress

pub mod achievements;
pub mod calendar;
pub mod charts;
pub mod engine;
pub mod history;
pub mod stats;
pub mod tracker;

pub use achievements::{ACHIEVEMENTS, Achievement, AchievementCategory, Metric, Metrics};
pub use calendar::{DateSpan, YearMonth, week_start};
pub use charts::{ChartDatum, bar_chart, legend, pie_chart};
pub use engine::{Analytics, BreakdownRow, HourSlot, PeakScope};
pub use history::{DayHistory, history_by_day};
pub use stats::{
    CategoryTotals, Comparison, ItemCategory, ItemCount, OrdersByType, Stats, calculate_stats,
    percent_change,
};
pub use tracker::{
    ACHIEVEMENTS_KEY, AchievementProgress, AchievementStatus, AchievementSummary, AchievementTracker,
    CategoryGroup, ProgressMap, ProgressRepository, StoreProgressRepository,
};
