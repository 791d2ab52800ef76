//! Read-only menu catalogue and construction of order items from it.

use serde::{Deserialize, Serialize};

use pizzapos_core::{DomainError, DomainResult};

use crate::{ItemImage, OrderItem};

/// `{categories: [{name, items: [...]}]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    #[serde(default)]
    pub categories: Vec<MenuCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub name: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub size: String,
    pub price: i64,
}

/// A menu entry. Exactly one pricing style applies: custom, variants, or a
/// fixed price (checked in that order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub custom_price: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// How a menu entry is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pricing<'a> {
    Custom,
    Variants(&'a [Variant]),
    Fixed(i64),
}

/// Which price the staff picked when adding an entry to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Standard,
    Size(String),
    Custom(i64),
}

impl Menu {
    pub fn from_json(raw: &str) -> DomainResult<Self> {
        serde_json::from_str(raw).map_err(|e| DomainError::validation(format!("menu: {e}")))
    }

    /// First entry with this exact name, with its category.
    pub fn find_item(&self, name: &str) -> Option<(&MenuCategory, &MenuItem)> {
        self.categories
            .iter()
            .find_map(|c| c.items.iter().find(|i| i.name == name).map(|i| (c, i)))
    }

    /// Build an order item for the named entry.
    pub fn order_item(&self, name: &str, selection: Selection) -> DomainResult<OrderItem> {
        let (category, item) = self
            .find_item(name)
            .ok_or_else(|| DomainError::validation(format!("unknown menu item: {name}")))?;
        item.order_item(&category.name, selection)
    }
}

impl MenuItem {
    pub fn pricing(&self) -> Option<Pricing<'_>> {
        if self.custom_price {
            Some(Pricing::Custom)
        } else if !self.variants.is_empty() {
            Some(Pricing::Variants(&self.variants))
        } else {
            self.price.map(Pricing::Fixed)
        }
    }

    /// `Custom`, `150 THB`, or `150-250 THB` for a variant range.
    pub fn price_label(&self) -> String {
        match self.pricing() {
            Some(Pricing::Custom) => "Custom".to_string(),
            Some(Pricing::Variants(vs)) => {
                let min = vs.iter().map(|v| v.price).min().unwrap_or(0);
                let max = vs.iter().map(|v| v.price).max().unwrap_or(0);
                if min == max {
                    format!("{min} THB")
                } else {
                    format!("{min}-{max} THB")
                }
            }
            Some(Pricing::Fixed(p)) => format!("{p} THB"),
            None => String::new(),
        }
    }

    /// Composite when both halves are present, else the plain path.
    pub fn image_data(&self) -> Option<ItemImage> {
        match (&self.base_image, &self.icon_image) {
            (Some(base), Some(icon)) => Some(ItemImage::Composite {
                base_image: base.clone(),
                icon_image: icon.clone(),
            }),
            _ => self.image.clone().map(ItemImage::Path),
        }
    }

    /// Build the order item for this entry.
    ///
    /// A variant becomes `"<name> (<size>)"` at the variant price. The item
    /// category falls back to the lower-cased menu category name.
    pub fn order_item(&self, category_name: &str, selection: Selection) -> DomainResult<OrderItem> {
        let (name, price) = match (self.pricing(), selection) {
            (Some(Pricing::Custom), Selection::Custom(price)) => {
                if price <= 0 {
                    return Err(DomainError::validation("custom price must be positive"));
                }
                (self.name.clone(), price)
            }
            (Some(Pricing::Variants(vs)), Selection::Size(size)) => {
                let variant = vs.iter().find(|v| v.size == size).ok_or_else(|| {
                    DomainError::validation(format!("{} has no size {size}", self.name))
                })?;
                (format!("{} ({})", self.name, variant.size), variant.price)
            }
            (Some(Pricing::Fixed(price)), Selection::Standard) => (self.name.clone(), price),
            (_, selection) => {
                return Err(DomainError::validation(format!(
                    "{} cannot be ordered as {selection:?}",
                    self.name
                )));
            }
        };

        let mut item = OrderItem::new(name, price).with_category(
            self.category
                .clone()
                .unwrap_or_else(|| category_name.to_lowercase()),
        );
        item.image = self.image_data();
        Ok(item)
    }
}
