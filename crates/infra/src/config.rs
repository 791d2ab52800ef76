//! Runtime configuration, read from `POS_*` environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use pizzapos_analytics::ACHIEVEMENTS_KEY;
use pizzapos_core::ShopZone;
use pizzapos_inventory::INVENTORY_KEY;
use pizzapos_orders::ORDERS_KEY;

/// Largest UTC offset in use anywhere (UTC+14).
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosConfig {
    /// Directory holding the blob files.
    pub data_dir: PathBuf,
    pub orders_key: String,
    pub inventory_key: String,
    pub achievements_key: String,
    /// Written into export files.
    pub app_version: String,
    /// Fixed UTC offset for calendar days and time labels; the host's local
    /// offset when unset.
    pub timezone_offset_minutes: Option<i32>,
}

impl Default for PosConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            orders_key: ORDERS_KEY.to_string(),
            inventory_key: INVENTORY_KEY.to_string(),
            achievements_key: ACHIEVEMENTS_KEY.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            timezone_offset_minutes: None,
        }
    }
}

impl PosConfig {
    /// Read `POS_DATA_DIR`, `POS_ORDERS_KEY`, `POS_INVENTORY_KEY`,
    /// `POS_ACHIEVEMENTS_KEY`, `POS_APP_VERSION` and `POS_TZ_OFFSET_MINUTES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable source.
    /// Unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("POS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = get("POS_ORDERS_KEY") {
            config.orders_key = key;
        }
        if let Some(key) = get("POS_INVENTORY_KEY") {
            config.inventory_key = key;
        }
        if let Some(key) = get("POS_ACHIEVEMENTS_KEY") {
            config.achievements_key = key;
        }
        if let Some(version) = get("POS_APP_VERSION") {
            config.app_version = version;
        }
        if let Some(raw) = get("POS_TZ_OFFSET_MINUTES") {
            match raw.parse::<i32>() {
                Ok(minutes) if minutes.abs() <= MAX_OFFSET_MINUTES => {
                    config.timezone_offset_minutes = Some(minutes);
                }
                _ => warn!(value = %raw, "ignoring invalid POS_TZ_OFFSET_MINUTES; using local time"),
            }
        }
        config
    }

    /// Zone used for calendar days, hours and order time labels: the
    /// configured offset, or the host zone resolved per instant.
    pub fn zone(&self) -> ShopZone {
        ShopZone::from_offset_minutes(self.timezone_offset_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_the_stored_keys() {
        let config = PosConfig::from_lookup(lookup(&[]));
        assert_eq!(config, PosConfig::default());
        assert_eq!(config.orders_key, "pizzaShopOrders");
        assert_eq!(config.inventory_key, "pizzaShopInventory");
        assert_eq!(config.achievements_key, "pizzaShopAchievements");
        assert_eq!(config.timezone_offset_minutes, None);
    }

    #[test]
    fn variables_override_defaults() {
        let config = PosConfig::from_lookup(lookup(&[
            ("POS_DATA_DIR", "/var/lib/pos"),
            ("POS_ORDERS_KEY", "orders-test"),
            ("POS_TZ_OFFSET_MINUTES", "420"),
            ("POS_INVENTORY_KEY", "   "),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/pos"));
        assert_eq!(config.orders_key, "orders-test");
        assert_eq!(config.inventory_key, "pizzaShopInventory");
        assert_eq!(config.zone(), ShopZone::Fixed(FixedOffset::east_opt(7 * 3600).unwrap()));
    }

    #[test]
    fn invalid_offsets_fall_back_to_local_time() {
        for raw in ["seven", "900", "-1000"] {
            let config = PosConfig::from_lookup(lookup(&[("POS_TZ_OFFSET_MINUTES", raw)]));
            assert_eq!(config.timezone_offset_minutes, None);
            assert_eq!(config.zone(), ShopZone::Local);
        }
        let west = PosConfig::from_lookup(lookup(&[("POS_TZ_OFFSET_MINUTES", "-300")]));
        assert_eq!(west.zone(), ShopZone::Fixed(FixedOffset::west_opt(5 * 3600).unwrap()));
    }
}
