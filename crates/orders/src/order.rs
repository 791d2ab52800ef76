use serde::{Deserialize, Deserializer, Serialize};

use pizzapos_core::{DomainError, DomainResult, Entity, OrderId};

/// Fulfilment mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EatType {
    #[default]
    #[serde(rename = "eat-in")]
    EatIn,
    #[serde(rename = "take-away")]
    TakeAway,
}

impl EatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EatType::EatIn => "eat-in",
            EatType::TakeAway => "take-away",
        }
    }
}

impl core::fmt::Display for EatType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Cash,
    Card,
}

/// Free-form display metadata (table number, sound indicator).
///
/// Stored data holds either numbers or strings depending on which screen
/// wrote it; both are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayTag {
    Number(i64),
    Text(String),
}

impl core::fmt::Display for DisplayTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DisplayTag::Number(n) => write!(f, "{n}"),
            DisplayTag::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DisplayTag {
    fn from(value: i64) -> Self {
        DisplayTag::Number(value)
    }
}

impl From<&str> for DisplayTag {
    fn from(value: &str) -> Self {
        DisplayTag::Text(value.to_string())
    }
}

/// Item picture: a single path, or a base image with an overlay icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemImage {
    Path(String),
    #[serde(rename_all = "camelCase")]
    Composite { base_image: String, icon_image: String },
}

impl ItemImage {
    /// Path used for classification: the path itself or the base image.
    pub fn primary_path(&self) -> &str {
        match self {
            ItemImage::Path(p) => p,
            ItemImage::Composite { base_image, .. } => base_image,
        }
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    /// Price in whole THB.
    #[serde(default, deserialize_with = "lenient::price")]
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ItemImage>,
    #[serde(default)]
    pub served: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            name: name.into(),
            price,
            image: None,
            served: false,
            category: None,
        }
    }

    pub fn with_image(mut self, image: ItemImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Category field first, then the image path.
    pub fn is_pizza(&self) -> bool {
        if self
            .category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("pizza"))
        {
            return true;
        }
        self.image
            .as_ref()
            .is_some_and(|img| img.primary_path().contains("pizza"))
    }
}

/// Input to order creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub eat_type: EatType,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
    #[serde(default)]
    pub table_number: Option<DisplayTag>,
    #[serde(default)]
    pub sound_indicator: Option<DisplayTag>,
    #[serde(default)]
    pub customer_description: Option<String>,
}

impl NewOrder {
    pub fn new(items: Vec<OrderItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn eat_type(mut self, eat_type: EatType) -> Self {
        self.eat_type = eat_type;
        self
    }

    pub fn paid_with(mut self, payment_type: Option<PaymentType>) -> Self {
        self.paid = true;
        self.payment_type = payment_type;
        self
    }

    pub fn table_number(mut self, table: impl Into<DisplayTag>) -> Self {
        self.table_number = Some(table.into());
        self
    }
}

/// Entity: Order.
///
/// Invariants maintained by the mutators:
/// - `price` equals the sum of item prices after every item mutation
/// - `served_at` is set iff `served`
/// - `paid_at` is set iff `paid`; `payment_type` is cleared when unpaid
///
/// The serialized shape is the persisted format and must stay field-for-field
/// compatible with stored data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    order_no: u64,
    timestamp: i64,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    served: bool,
    #[serde(default)]
    served_at: Option<i64>,
    #[serde(default)]
    paid: bool,
    #[serde(default)]
    paid_at: Option<i64>,
    #[serde(default)]
    payment_type: Option<PaymentType>,
    #[serde(default)]
    pizza_type: Option<String>,
    #[serde(default)]
    items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "lenient::price")]
    price: i64,
    #[serde(default)]
    eat_type: EatType,
    #[serde(default)]
    table_number: Option<DisplayTag>,
    #[serde(default)]
    sound_indicator: Option<DisplayTag>,
    #[serde(default)]
    customer_description: Option<String>,
}

impl Order {
    /// Build a freshly created order.
    ///
    /// `served` starts false; `paid_at` is `now` when the order is paid up
    /// front. Price and the name summary are derived from the items.
    pub fn create(
        data: NewOrder,
        id: OrderId,
        order_no: u64,
        now: i64,
        time_label: impl Into<String>,
    ) -> DomainResult<Self> {
        if data.items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }

        let mut order = Self {
            id,
            order_no,
            timestamp: now,
            time: Some(time_label.into()),
            served: false,
            served_at: None,
            paid: data.paid,
            paid_at: data.paid.then_some(now),
            payment_type: if data.paid { data.payment_type } else { None },
            pizza_type: None,
            items: data.items,
            price: 0,
            eat_type: data.eat_type,
            table_number: data.table_number,
            sound_indicator: data.sound_indicator,
            customer_description: data.customer_description,
        };
        order.recompute_totals();
        Ok(order)
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_no(&self) -> u64 {
        self.order_no
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn served(&self) -> bool {
        self.served
    }

    pub fn served_at(&self) -> Option<i64> {
        self.served_at
    }

    pub fn paid(&self) -> bool {
        self.paid
    }

    pub fn paid_at(&self) -> Option<i64> {
        self.paid_at
    }

    pub fn payment_type(&self) -> Option<PaymentType> {
        self.payment_type
    }

    pub fn pizza_type(&self) -> Option<&str> {
        self.pizza_type.as_deref()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&OrderItem> {
        self.items.get(index)
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn eat_type(&self) -> EatType {
        self.eat_type
    }

    pub fn table_number(&self) -> Option<&DisplayTag> {
        self.table_number.as_ref()
    }

    pub fn sound_indicator(&self) -> Option<&DisplayTag> {
        self.sound_indicator.as_ref()
    }

    pub fn customer_description(&self) -> Option<&str> {
        self.customer_description.as_deref()
    }

    /// Served and paid: the order belongs to history.
    pub fn is_completed(&self) -> bool {
        self.served && self.paid
    }

    pub fn is_ongoing(&self) -> bool {
        !self.is_completed()
    }

    /// Re-derive `price` and the name summary from the items.
    pub fn recompute_totals(&mut self) {
        self.price = self.items.iter().map(|i| i.price).sum();
        self.pizza_type = Some(
            self.items
                .iter()
                .map(|i| i.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
    }

    /// Always re-stamps `served_at`, including on an already served order.
    pub fn mark_served(&mut self, at: i64) {
        self.served = true;
        self.served_at = Some(at);
    }

    pub fn mark_unserved(&mut self) {
        self.served = false;
        self.served_at = None;
    }

    /// A `None` payment type keeps whatever was recorded before.
    pub fn mark_paid(&mut self, at: i64, payment_type: Option<PaymentType>) {
        self.paid = true;
        self.paid_at = Some(at);
        if payment_type.is_some() {
            self.payment_type = payment_type;
        }
    }

    pub fn mark_unpaid(&mut self) {
        self.paid = false;
        self.paid_at = None;
        self.payment_type = None;
    }

    /// Back to "not served, not paid".
    pub fn restore_to_ongoing(&mut self) {
        self.mark_unserved();
        self.mark_unpaid();
    }

    pub fn set_eat_type(&mut self, eat_type: EatType) -> EatType {
        core::mem::replace(&mut self.eat_type, eat_type)
    }

    pub fn set_table_number(&mut self, value: Option<DisplayTag>) -> Option<DisplayTag> {
        core::mem::replace(&mut self.table_number, value)
    }

    pub fn set_sound_indicator(&mut self, value: Option<DisplayTag>) -> Option<DisplayTag> {
        core::mem::replace(&mut self.sound_indicator, value)
    }

    pub fn set_customer_description(&mut self, value: Option<String>) -> Option<String> {
        core::mem::replace(&mut self.customer_description, value)
    }

    /// Remove the item at `index`.
    ///
    /// Returns `Ok(None)` for an out-of-range index. Removing the only item is
    /// refused: an order never becomes empty.
    pub fn remove_item(&mut self, index: usize) -> DomainResult<Option<OrderItem>> {
        if index >= self.items.len() {
            return Ok(None);
        }
        if self.items.len() == 1 {
            return Err(DomainError::invariant(
                "cannot remove the last item of an order; delete the order instead",
            ));
        }
        let removed = self.items.remove(index);
        self.recompute_totals();
        Ok(Some(removed))
    }

    /// Append items as not yet served.
    pub fn add_items(&mut self, items: impl IntoIterator<Item = OrderItem>) {
        self.items.extend(items.into_iter().map(|mut item| {
            item.served = false;
            item
        }));
        self.recompute_totals();
    }

    /// Set one item's served flag. Returns the updated item, `None` for an
    /// out-of-range index. The order-level flag is untouched.
    pub fn set_item_served(&mut self, index: usize, served: bool) -> Option<&OrderItem> {
        let item = self.items.get_mut(index)?;
        item.served = served;
        Some(item)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Int(i64),
        Float(f64),
        Text(String),
    }

    /// Accepts integers, floats (truncated) and numeric strings; anything
    /// else (including null) reads as 0.
    pub(super) fn price<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawPrice>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawPrice::Int(v)) => v,
            Some(RawPrice::Float(v)) => v.trunc() as i64,
            Some(RawPrice::Text(s)) => parse_leading_int(&s),
            None => 0,
        })
    }

    fn parse_leading_int(s: &str) -> i64 {
        let s = s.trim();
        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s.strip_prefix('+').unwrap_or(s)),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        digits[..end].parse::<i64>().map(|v| sign * v).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: i64) -> OrderItem {
        OrderItem::new(name, price)
    }

    fn order_with(prices: &[i64]) -> Order {
        let items = prices
            .iter()
            .enumerate()
            .map(|(i, p)| item(&format!("Item {i}"), *p))
            .collect();
        Order::create(NewOrder::new(items), OrderId::new(1_000), 1, 1_000, "10:00:00").unwrap()
    }

    #[test]
    fn create_derives_price_and_summary() {
        let order = Order::create(
            NewOrder::new(vec![item("Margherita (M)", 150), item("Cheese", 80)]),
            OrderId::new(5),
            3,
            5,
            "12:00:00",
        )
        .unwrap();

        assert_eq!(order.price(), 230);
        assert_eq!(order.pizza_type(), Some("Margherita (M), Cheese"));
        assert_eq!(order.order_no(), 3);
        assert!(!order.served());
        assert_eq!(order.served_at(), None);
        assert_eq!(order.paid_at(), None);
        assert!(order.is_ongoing());
    }

    #[test]
    fn create_paid_order_stamps_paid_at() {
        let order = Order::create(
            NewOrder::new(vec![item("Bianca", 120)]).paid_with(Some(PaymentType::Card)),
            OrderId::new(9),
            1,
            9_000,
            "",
        )
        .unwrap();
        assert!(order.paid());
        assert_eq!(order.paid_at(), Some(9_000));
        assert_eq!(order.payment_type(), Some(PaymentType::Card));
    }

    #[test]
    fn create_rejects_empty_items() {
        let err = Order::create(NewOrder::default(), OrderId::new(1), 1, 1, "").unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("at least one item") => {}
            _ => panic!("Expected Validation error for empty order"),
        }
    }

    #[test]
    fn completion_requires_both_flags() {
        let mut order = order_with(&[100]);
        order.mark_paid(10, Some(PaymentType::Cash));
        assert!(order.is_ongoing());
        order.mark_served(20);
        assert!(order.is_completed());

        order.restore_to_ongoing();
        assert!(!order.served() && !order.paid());
        assert_eq!(order.served_at(), None);
        assert_eq!(order.paid_at(), None);
        assert_eq!(order.payment_type(), None);
    }

    #[test]
    fn mark_paid_without_type_keeps_previous_type() {
        let mut order = order_with(&[100]);
        order.mark_paid(1, Some(PaymentType::Card));
        order.mark_paid(2, None);
        assert_eq!(order.payment_type(), Some(PaymentType::Card));
        assert_eq!(order.paid_at(), Some(2));
        order.mark_unpaid();
        assert_eq!(order.payment_type(), None);
    }

    #[test]
    fn remove_item_recomputes_price() {
        let mut order = order_with(&[150, 100]);
        let removed = order.remove_item(0).unwrap().unwrap();
        assert_eq!(removed.price, 150);
        assert_eq!(order.price(), 100);
        assert_eq!(order.pizza_type(), Some("Item 1"));
        assert_eq!(order.remove_item(5).unwrap(), None);
    }

    #[test]
    fn removing_last_item_is_refused() {
        let mut order = order_with(&[150]);
        match order.remove_item(0) {
            Err(DomainError::InvariantViolation(msg)) if msg.contains("last item") => {}
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.price(), 150);
    }

    #[test]
    fn added_items_start_unserved() {
        let mut order = order_with(&[100]);
        let mut extra = item("Nutella", 90);
        extra.served = true;
        order.add_items(vec![extra]);
        assert_eq!(order.price(), 190);
        assert!(!order.items()[1].served);
    }

    #[test]
    fn item_served_flag_is_independent_of_order() {
        let mut order = order_with(&[100, 50]);
        assert!(order.set_item_served(1, true).is_some_and(|i| i.served));
        assert!(!order.served());
        assert!(order.set_item_served(2, true).is_none());
    }

    #[test]
    fn pizza_classification_prefers_category_then_image() {
        assert!(item("X", 1).with_category("Pizza").is_pizza());
        assert!(
            item("X", 1)
                .with_image(ItemImage::Path("images/pizza-margherita.png".into()))
                .is_pizza()
        );
        assert!(
            item("X", 1)
                .with_image(ItemImage::Composite {
                    base_image: "images/pizza-base.png".into(),
                    icon_image: "images/ham.png".into(),
                })
                .is_pizza()
        );
        assert!(
            !item("Cheese", 1)
                .with_category("quesadilla")
                .with_image(ItemImage::Path("images/quesadilla.png".into()))
                .is_pizza()
        );
    }

    #[test]
    fn deserializes_legacy_document_shape() {
        let json = r#"{
            "id": 1700000000000, "orderNo": 4, "timestamp": 1700000000000,
            "time": "10:15:00", "served": true, "servedAt": 1700000100000,
            "paid": false, "paidAt": null, "paymentType": null,
            "pizzaType": "Margherita (L)",
            "items": [{"name": "Margherita (L)", "price": "180",
                       "image": {"baseImage": "pizza.png", "iconImage": "m.png"}}],
            "price": "180", "eatType": "take-away",
            "tableNumber": "7", "soundIndicator": 3, "customerDescription": null
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.price(), 180);
        assert_eq!(order.items()[0].price, 180);
        assert!(!order.items()[0].served);
        assert_eq!(order.eat_type(), EatType::TakeAway);
        assert_eq!(order.table_number(), Some(&DisplayTag::Text("7".into())));
        assert_eq!(order.sound_indicator(), Some(&DisplayTag::Number(3)));

        let back = serde_json::to_value(&order).unwrap();
        assert_eq!(back["orderNo"], 4);
        assert_eq!(back["eatType"], "take-away");
        assert_eq!(back["items"][0]["image"]["baseImage"], "pizza.png");
        assert!(back["paidAt"].is_null());
    }

    #[test]
    fn lenient_price_variants() {
        let parse = |raw: &str| -> i64 {
            let item: OrderItem =
                serde_json::from_str(&format!(r#"{{"name":"x","price":{raw}}}"#)).unwrap();
            item.price
        };
        assert_eq!(parse("120"), 120);
        assert_eq!(parse("99.9"), 99);
        assert_eq!(parse(r#"" 150 ""#), 150);
        assert_eq!(parse(r#""80THB""#), 80);
        assert_eq!(parse(r#""n/a""#), 0);
        assert_eq!(parse("null"), 0);
    }

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn price_tracks_item_sum(
            initial in prop::collection::vec(0i64..1_000, 1..8),
            added in prop::collection::vec(0i64..1_000, 0..8),
            removals in prop::collection::vec(0usize..16, 0..8),
        ) {
            let mut order = order_with(&initial);
            order.add_items(added.iter().map(|p| item("extra", *p)));
            for idx in removals {
                let _ = order.remove_item(idx);
            }
            let sum: i64 = order.items().iter().map(|i| i.price).sum();
            prop_assert_eq!(order.price(), sum);
            prop_assert!(!order.items().is_empty());
        }
    }
}
