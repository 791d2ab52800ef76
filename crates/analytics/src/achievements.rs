//! Achievement catalogue and the metrics it is scored against.

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use pizzapos_orders::{Order, OrderItem};

use crate::calendar::local_hour;

use AchievementCategory::{Orders, Revenue, Special, Speed, Volume};
use Metric::{
    FastOrders, MorningOrders, NightOrders, PizzaItems, QuesadillaItems, TotalOrders, TotalRevenue,
};

/// Served within this many milliseconds of creation counts as fast.
pub const FAST_SERVICE_MS: i64 = 300_000;
/// Orders created at or after this local hour count as night orders.
pub const NIGHT_FROM_HOUR: u32 = 22;
/// Orders created before this local hour count as morning orders.
pub const MORNING_BEFORE_HOUR: u32 = 10;

const PIZZA_KEYWORDS: &[&str] = &[
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
    "pizza",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Volume,
    Revenue,
    Orders,
    Speed,
    Special,
}

impl AchievementCategory {
    pub const ALL: [AchievementCategory; 5] = [
        AchievementCategory::Volume,
        AchievementCategory::Revenue,
        AchievementCategory::Orders,
        AchievementCategory::Speed,
        AchievementCategory::Special,
    ];

    /// Section heading shown above the category.
    pub fn title(&self) -> &'static str {
        match self {
            AchievementCategory::Volume => "📦 Volume Milestones",
            AchievementCategory::Revenue => "💰 Revenue Milestones",
            AchievementCategory::Orders => "🎯 Order Frequency",
            AchievementCategory::Speed => "⚡ Speed & Efficiency",
            AchievementCategory::Special => "🎁 Special Achievements",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PizzaItems,
    QuesadillaItems,
    TotalRevenue,
    TotalOrders,
    FastOrders,
    NightOrders,
    MorningOrders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub target: u64,
    pub metric: Metric,
    pub tier: u8,
}

impl Achievement {
    pub fn find(id: &str) -> Option<&'static Achievement> {
        ACHIEVEMENTS.iter().find(|a| a.id == id)
    }
}

const fn achievement(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    category: AchievementCategory,
    target: u64,
    metric: Metric,
    tier: u8,
) -> Achievement {
    Achievement {
        id,
        name,
        description,
        icon,
        category,
        target,
        metric,
        tier,
    }
}

pub static ACHIEVEMENTS: [Achievement; 20] = [
    achievement("first_slice", "First Slice", "Cook your first pizza", "🍕", Volume, 1, PizzaItems, 1),
    achievement("centurion", "Centurion", "Cook 100 pizzas", "💯", Volume, 100, PizzaItems, 2),
    achievement(
        "pizzaiolo",
        "Pizzaiolo",
        "Cook 200 pizzas - You're a true pizza maker!",
        "👨‍🍳",
        Volume,
        200,
        PizzaItems,
        3,
    ),
    achievement(
        "master_chef",
        "Master Chef",
        "Cook 500 pizzas - Master of the oven!",
        "⭐",
        Volume,
        500,
        PizzaItems,
        4,
    ),
    achievement("legend", "Legend", "Cook 1000 pizzas - You're a legend!", "🏆", Volume, 1000, PizzaItems, 5),
    achievement(
        "quesadilla_starter",
        "Quesadilla Starter",
        "Cook your first quesadilla",
        "🌮",
        Volume,
        1,
        QuesadillaItems,
        1,
    ),
    achievement(
        "quesadilla_master",
        "Quesadilla Master",
        "Cook 100 quesadillas",
        "🔥",
        Volume,
        100,
        QuesadillaItems,
        3,
    ),
    achievement("first_baht", "First Baht", "Earn your first revenue", "💰", Revenue, 1, TotalRevenue, 1),
    achievement(
        "10k_club",
        "10K Club",
        "Earn 10,000 THB in total revenue",
        "💵",
        Revenue,
        10_000,
        TotalRevenue,
        2,
    ),
    achievement(
        "50k_milestone",
        "50K Milestone",
        "Earn 50,000 THB - Growing strong!",
        "💸",
        Revenue,
        50_000,
        TotalRevenue,
        3,
    ),
    achievement(
        "six_figures",
        "Six Figures",
        "Earn 100,000 THB - Incredible!",
        "💎",
        Revenue,
        100_000,
        TotalRevenue,
        4,
    ),
    achievement(
        "quarter_million",
        "Quarter Million",
        "Earn 250,000 THB - Outstanding!",
        "🌟",
        Revenue,
        250_000,
        TotalRevenue,
        5,
    ),
    achievement("grand_opening", "Grand Opening", "Complete your first order", "🎊", Orders, 1, TotalOrders, 1),
    achievement("busy_day", "Busy Day", "Complete 50 orders total", "📈", Orders, 50, TotalOrders, 2),
    achievement(
        "century_of_service",
        "Century of Service",
        "Complete 100 orders - Excellent!",
        "🎯",
        Orders,
        100,
        TotalOrders,
        3,
    ),
    achievement(
        "marathon_runner",
        "Marathon Runner",
        "Complete 500 orders - Non-stop!",
        "🏃",
        Orders,
        500,
        TotalOrders,
        4,
    ),
    achievement(
        "speed_demon",
        "Speed Demon",
        "Serve an order in under 5 minutes",
        "⚡",
        Speed,
        1,
        FastOrders,
        2,
    ),
    achievement(
        "lightning_fast",
        "Lightning Fast",
        "Serve 10 orders in under 5 minutes each",
        "🚀",
        Speed,
        10,
        FastOrders,
        3,
    ),
    achievement("night_owl", "Night Owl", "Complete an order after 10 PM", "🦉", Special, 1, NightOrders, 2),
    achievement("early_bird", "Early Bird", "Complete an order before 10 AM", "🌅", Special, 1, MorningOrders, 2),
];

/// Image path, category tag, or a known pizza name.
pub fn counts_as_pizza(item: &OrderItem) -> bool {
    let image = item.image.as_ref().map(|img| img.primary_path()).unwrap_or("");
    let name = item.name.to_lowercase();
    image.contains("pizza")
        || item.category.as_deref() == Some("pizza")
        || PIZZA_KEYWORDS.iter().any(|k| name.contains(k))
}

pub fn counts_as_quesadilla(item: &OrderItem) -> bool {
    let image = item.image.as_ref().map(|img| img.primary_path()).unwrap_or("");
    image.contains("quesadilla")
        || item.category.as_deref() == Some("quesadilla")
        || item.name.to_lowercase().contains("quesadilla")
}

/// Achievement metrics over completed orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub pizza_items: u64,
    pub quesadilla_items: u64,
    pub total_revenue: u64,
    pub total_orders: u64,
    pub fast_orders: u64,
    pub night_orders: u64,
    pub morning_orders: u64,
}

impl Metrics {
    /// Score `orders`; anything not both served and paid is ignored. Hours
    /// are read in `tz`.
    pub fn from_orders<Tz: TimeZone>(orders: &[Order], tz: &Tz) -> Self {
        let mut metrics = Metrics::default();
        let mut revenue: i64 = 0;

        for order in orders.iter().filter(|o| o.is_completed()) {
            metrics.total_orders += 1;
            revenue += order.price();
            metrics.pizza_items += order.items().iter().filter(|i| counts_as_pizza(i)).count() as u64;
            metrics.quesadilla_items += order.items().iter().filter(|i| counts_as_quesadilla(i)).count() as u64;

            if let Some(served_at) = order.served_at() {
                if order.timestamp() != 0 && served_at - order.timestamp() < FAST_SERVICE_MS {
                    metrics.fast_orders += 1;
                }
            }
            match local_hour(tz, order.timestamp()) {
                Some(hour) if hour >= NIGHT_FROM_HOUR => metrics.night_orders += 1,
                Some(hour) if hour < MORNING_BEFORE_HOUR => metrics.morning_orders += 1,
                _ => {}
            }
        }

        metrics.total_revenue = u64::try_from(revenue).unwrap_or(0);
        metrics
    }

    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::PizzaItems => self.pizza_items,
            Metric::QuesadillaItems => self.quesadilla_items,
            Metric::TotalRevenue => self.total_revenue,
            Metric::TotalOrders => self.total_orders,
            Metric::FastOrders => self.fast_orders,
            Metric::NightOrders => self.night_orders,
            Metric::MorningOrders => self.morning_orders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::FixedOffset;
    use pizzapos_core::OrderId;
    use pizzapos_orders::{ItemImage, NewOrder};

    // 2023-11-14 22:13:20 UTC.
    const T0: i64 = 1_700_000_000_000;

    fn completed(id: i64, at: i64, served_after: i64, items: Vec<OrderItem>) -> Order {
        let mut order = Order::create(NewOrder::new(items), OrderId::new(id), id as u64, at, "").unwrap();
        order.mark_paid(at, None);
        order.mark_served(at + served_after);
        order
    }

    #[test]
    fn catalogue_is_complete_and_unique() {
        assert_eq!(ACHIEVEMENTS.len(), 20);
        let ids: HashSet<&str> = ACHIEVEMENTS.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(Achievement::find("10k_club").map(|a| a.target), Some(10_000));
        assert_eq!(Achievement::find("legend").map(|a| a.tier), Some(5));
        assert!(Achievement::find("nope").is_none());
        for category in AchievementCategory::ALL {
            assert!(ACHIEVEMENTS.iter().any(|a| a.category == category));
        }
    }

    #[test]
    fn item_classification() {
        assert!(counts_as_pizza(&OrderItem::new("Margherita (L)", 1)));
        assert!(counts_as_pizza(&OrderItem::new("Pizza of the day", 1)));
        assert!(counts_as_pizza(&OrderItem::new("House", 1).with_category("pizza")));
        assert!(counts_as_pizza(
            &OrderItem::new("House", 1).with_image(ItemImage::Path("images/pizza-house.png".into()))
        ));
        assert!(!counts_as_pizza(&OrderItem::new("Nutella", 1)));

        assert!(counts_as_quesadilla(&OrderItem::new("Quesadilla Beef", 1)));
        assert!(counts_as_quesadilla(
            &OrderItem::new("Beef", 1).with_image(ItemImage::Path("images/quesadilla-beef.png".into()))
        ));
        assert!(!counts_as_quesadilla(&OrderItem::new("Beef", 1)));
    }

    #[test]
    fn metrics_count_completed_orders_only() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let morning = T0 - 14 * 3_600_000; // 08:13 UTC
        let noon = T0 - 10 * 3_600_000; // 12:13 UTC
        let open = Order::create(
            NewOrder::new(vec![OrderItem::new("Tuna", 999)]),
            OrderId::new(9),
            9,
            T0,
            "",
        )
        .unwrap();
        let orders = vec![
            completed(1, T0, 60_000, vec![OrderItem::new("Tuna", 150), OrderItem::new("Quesadilla Ham", 90)]),
            completed(2, morning, FAST_SERVICE_MS, vec![OrderItem::new("Bianca", 200)]),
            completed(3, noon, 1_000, vec![OrderItem::new("Cola", 30)]),
            open,
        ];
        let metrics = Metrics::from_orders(&orders, &utc);

        assert_eq!(metrics.total_orders, 3);
        assert_eq!(metrics.total_revenue, 470);
        assert_eq!(metrics.pizza_items, 2);
        assert_eq!(metrics.quesadilla_items, 1);
        assert_eq!(metrics.fast_orders, 2);
        assert_eq!(metrics.night_orders, 1);
        assert_eq!(metrics.morning_orders, 1);
        assert_eq!(metrics.value(Metric::TotalRevenue), 470);
    }

    #[test]
    fn metric_names_serialize_in_snake_case() {
        assert_eq!(serde_json::to_value(Metric::PizzaItems).unwrap(), "pizza_items");
        let json = serde_json::to_value(ACHIEVEMENTS[0]).unwrap();
        assert_eq!(json["category"], "volume");
        assert_eq!(json["metric"], "pizza_items");
        assert_eq!(AchievementCategory::Speed.title(), "⚡ Speed & Efficiency");
    }
}
