use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::status::OrderStatus;

/// The authenticated principal an order belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

// ── Inputs ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderItemRequest {
    pub product_name: String,
    pub product_code: Option<String>,
    pub quantity: i32,
    pub price: BigDecimal,
    pub discount: Option<BigDecimal>,
    pub description: Option<String>,
}

/// Shape shared by create and update. Update replaces the whole item list.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

// ── Aggregate ────────────────────────────────────────────────────────────────

/// Decimal places kept for every monetary amount.
pub const MONEY_SCALE: i64 = 2;
/// Prices and discounts stay strictly below this magnitude.
const LINE_AMOUNT_LIMIT: i64 = 100_000_000;
/// Order totals stay strictly below this magnitude.
const TOTAL_AMOUNT_LIMIT: i64 = 10_000_000_000;

fn check_amount(
    label: &str,
    product: &str,
    value: &BigDecimal,
    limit: i64,
) -> Result<(), DomainError> {
    if value.with_scale(MONEY_SCALE) != *value {
        return Err(DomainError::InvalidInput(format!(
            "{} for '{}' has more than {} decimal places: {}",
            label, product, MONEY_SCALE, value
        )));
    }
    if value.abs() >= BigDecimal::from(limit) {
        return Err(DomainError::InvalidInput(format!(
            "{} for '{}' is out of range: {}",
            label, product, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub(crate) id: Uuid,
    pub(crate) order_id: Option<Uuid>,
    pub product_name: String,
    pub product_code: Option<String>,
    pub(crate) quantity: i32,
    pub price: BigDecimal,
    pub(crate) discount: BigDecimal,
    pub description: Option<String>,
}

impl OrderItem {
    /// Builds a detached line item. A missing discount becomes zero. Amounts
    /// with more than [`MONEY_SCALE`] decimal places are rejected.
    pub fn new(request: OrderItemRequest) -> Result<Self, DomainError> {
        if request.quantity <= 0 {
            return Err(DomainError::InvalidInput(format!(
                "Quantity for '{}' must be positive, got {}",
                request.product_name, request.quantity
            )));
        }
        let discount = request.discount.unwrap_or_else(BigDecimal::zero);
        if discount < BigDecimal::zero() {
            return Err(DomainError::InvalidInput(format!(
                "Discount for '{}' must not be negative",
                request.product_name
            )));
        }
        check_amount("Price", &request.product_name, &request.price, LINE_AMOUNT_LIMIT)?;
        check_amount("Discount", &request.product_name, &discount, LINE_AMOUNT_LIMIT)?;

        Ok(Self {
            id: Uuid::new_v4(),
            order_id: None,
            product_name: request.product_name,
            product_code: request.product_code,
            quantity: request.quantity,
            price: request.price,
            discount,
            description: request.description,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owning order, `None` once the item has been detached.
    pub fn order_id(&self) -> Option<Uuid> {
        self.order_id
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn discount(&self) -> &BigDecimal {
        &self.discount
    }

    /// `price * quantity`, minus the flat discount when it is positive.
    ///
    /// The result is not clamped: a discount larger than the line amount
    /// yields a negative subtotal.
    pub fn subtotal(&self) -> BigDecimal {
        let gross = &self.price * BigDecimal::from(self.quantity);
        if self.discount > BigDecimal::zero() {
            gross - &self.discount
        } else {
            gross
        }
    }
}

/// An order together with the line items it exclusively owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub(crate) id: Uuid,
    pub(crate) order_number: String,
    pub(crate) owner: User,
    pub(crate) items: Vec<OrderItem>,
    pub(crate) status: OrderStatus,
    pub(crate) total_amount: BigDecimal,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A fresh `PENDING` order with no items and a zero total.
    pub fn new(order_number: String, owner: User, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_number,
            owner,
            items: Vec::new(),
            status: OrderStatus::Pending,
            total_amount: BigDecimal::zero(),
            shipping_address: None,
            billing_address: None,
            payment_method: None,
            notes: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn owner(&self) -> &User {
        &self.owner
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_amount(&self) -> &BigDecimal {
        &self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        self.owner.id == user.id
    }

    /// Appends `item` and links it to this order. Duplicate product codes are
    /// kept as separate lines.
    pub fn add_item(&mut self, mut item: OrderItem) {
        item.order_id = Some(self.id);
        self.items.push(item);
    }

    /// Detaches the item with `item_id`, returning it with its owner cleared.
    pub fn remove_item(&mut self, item_id: Uuid) -> Option<OrderItem> {
        let index = self.items.iter().position(|i| i.id == item_id)?;
        let mut item = self.items.remove(index);
        item.order_id = None;
        Some(item)
    }

    /// Detaches every item. Used when an update replaces the item list.
    pub fn clear_items(&mut self) -> Vec<OrderItem> {
        self.items
            .drain(..)
            .map(|mut item| {
                item.order_id = None;
                item
            })
            .collect()
    }

    /// Must be called after any change to the item list; the total is not
    /// kept in sync automatically.
    pub fn recalculate_total(&mut self) {
        self.total_amount = self
            .items
            .iter()
            .map(OrderItem::subtotal)
            .fold(BigDecimal::zero(), |acc, subtotal| acc + subtotal);
    }

    /// Fails when the current total cannot be stored.
    pub fn ensure_total_in_range(&self) -> Result<(), DomainError> {
        if self.total_amount.abs() >= BigDecimal::from(TOTAL_AMOUNT_LIMIT) {
            return Err(DomainError::InvalidInput(format!(
                "Order total {} is out of range",
                self.total_amount
            )));
        }
        Ok(())
    }

    pub fn apply_details(&mut self, request: &OrderRequest) {
        self.shipping_address = request.shipping_address.clone();
        self.billing_address = request.billing_address.clone();
        self.payment_method = request.payment_method.clone();
        self.notes = request.notes.clone();
    }

    pub fn ensure_editable(&self) -> Result<(), DomainError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(DomainError::InvalidState(format!(
                "Only pending orders can be updated; order {} is {}",
                self.order_number, self.status
            )))
        }
    }

    /// Moves the order to `next` if the lifecycle allows it. Entering
    /// `CANCELLED` stamps `cancelled_at`.
    pub fn transition_to(
        &mut self,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.status = self.status.transition(next)?;
        if self.status == OrderStatus::Cancelled {
            self.cancelled_at = Some(now.max(self.created_at));
        }
        self.touch(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Cancelled, now)
    }

    /// Records a mutation. `updated_at` never falls behind `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

// ── Read views ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub quantity: i32,
    pub price: BigDecimal,
    pub discount: BigDecimal,
    pub subtotal: BigDecimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub username: String,
    pub items: Vec<OrderItemView>,
    pub status: String,
    pub total_amount: BigDecimal,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            product_name: item.product_name.clone(),
            product_code: item.product_code.clone(),
            quantity: item.quantity,
            price: item.price.clone(),
            discount: item.discount.clone(),
            subtotal: item.subtotal(),
            description: item.description.clone(),
        }
    }
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            user_id: order.owner.id,
            username: order.owner.username.clone(),
            items: order.items.iter().map(OrderItemView::from).collect(),
            status: order.status.as_str().to_string(),
            total_amount: order.total_amount.clone(),
            shipping_address: order.shipping_address.clone(),
            billing_address: order.billing_address.clone(),
            payment_method: order.payment_method.clone(),
            notes: order.notes.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            cancelled_at: order.cancelled_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Duration;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn owner() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
        }
    }

    fn item(price: &str, quantity: i32, discount: Option<&str>) -> OrderItem {
        OrderItem::new(OrderItemRequest {
            product_name: "Widget".to_string(),
            product_code: Some("W-1".to_string()),
            quantity,
            price: dec(price),
            discount: discount.map(dec),
            description: None,
        })
        .expect("valid item")
    }

    #[test]
    fn subtotal_subtracts_flat_discount_once() {
        assert_eq!(item("10.00", 2, None).subtotal(), dec("20.00"));
        assert_eq!(item("5.00", 3, Some("1.50")).subtotal(), dec("13.50"));
    }

    #[test]
    fn subtotal_goes_negative_when_discount_exceeds_line() {
        assert_eq!(item("2.00", 1, Some("5.00")).subtotal(), dec("-3.00"));
    }

    #[test]
    fn total_of_empty_order_is_zero() {
        let mut order = Order::new("ORD-1".to_string(), owner(), Utc::now());
        order.recalculate_total();
        assert_eq!(order.total_amount(), &BigDecimal::zero());
    }

    #[test]
    fn total_sums_item_subtotals() {
        let mut order = Order::new("ORD-1".to_string(), owner(), Utc::now());
        order.add_item(item("10.00", 2, Some("0")));
        order.add_item(item("5.00", 1, Some("1.00")));
        order.recalculate_total();

        assert_eq!(order.total_amount(), &dec("24.00"));
        let independent = order
            .items()
            .iter()
            .fold(BigDecimal::zero(), |acc, i| acc + i.subtotal());
        assert_eq!(order.total_amount(), &independent);
    }

    #[test]
    fn total_is_only_refreshed_on_recalculate() {
        let mut order = Order::new("ORD-1".to_string(), owner(), Utc::now());
        order.add_item(item("1.00", 1, None));
        assert_eq!(order.total_amount(), &BigDecimal::zero());
        order.recalculate_total();
        assert_eq!(order.total_amount(), &dec("1.00"));
    }

    #[test]
    fn add_item_links_and_remove_item_unlinks() {
        let mut order = Order::new("ORD-1".to_string(), owner(), Utc::now());
        let line = item("3.00", 1, None);
        let line_id = line.id();
        assert_eq!(line.order_id(), None);

        order.add_item(line);
        assert_eq!(order.items()[0].order_id(), Some(order.id()));

        let removed = order.remove_item(line_id).expect("item present");
        assert_eq!(removed.order_id(), None);
        assert!(order.items().is_empty());
        assert!(order.remove_item(line_id).is_none());
    }

    #[test]
    fn duplicate_product_codes_are_separate_lines() {
        let mut order = Order::new("ORD-1".to_string(), owner(), Utc::now());
        order.add_item(item("1.00", 1, None));
        order.add_item(item("1.00", 1, None));
        assert_eq!(order.items().len(), 2);
    }

    #[test]
    fn rejects_non_positive_quantity_and_negative_discount() {
        let base = OrderItemRequest {
            product_name: "Widget".to_string(),
            product_code: None,
            quantity: 0,
            price: dec("1.00"),
            discount: None,
            description: None,
        };
        assert!(matches!(
            OrderItem::new(base.clone()),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            OrderItem::new(OrderItemRequest {
                quantity: 1,
                discount: Some(dec("-0.01")),
                ..base
            }),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn amounts_are_limited_to_cents() {
        let request = |price: &str, discount: Option<&str>| OrderItemRequest {
            product_name: "Widget".to_string(),
            product_code: None,
            quantity: 3,
            price: dec(price),
            discount: discount.map(dec),
            description: None,
        };

        assert!(matches!(
            OrderItem::new(request("0.335", None)),
            Err(DomainError::InvalidInput(ref m)) if m.contains("Price")
        ));
        assert!(matches!(
            OrderItem::new(request("1.00", Some("0.001"))),
            Err(DomainError::InvalidInput(ref m)) if m.contains("Discount")
        ));
        // Trailing zeros do not add precision.
        assert_eq!(
            OrderItem::new(request("0.330", None)).unwrap().subtotal(),
            dec("0.99")
        );
    }

    #[test]
    fn amounts_beyond_storable_range_are_rejected() {
        let oversized = OrderItemRequest {
            product_name: "Yacht".to_string(),
            product_code: None,
            quantity: 1,
            price: dec("100000000.00"),
            discount: None,
            description: None,
        };
        assert!(matches!(
            OrderItem::new(oversized.clone()),
            Err(DomainError::InvalidInput(ref m)) if m.contains("out of range")
        ));

        let mut order = Order::new("ORD-1".to_string(), owner(), Utc::now());
        order.add_item(
            OrderItem::new(OrderItemRequest {
                price: dec("99999999.99"),
                quantity: 1_000,
                ..oversized
            })
            .unwrap(),
        );
        order.recalculate_total();
        assert!(matches!(
            order.ensure_total_in_range(),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn cancel_stamps_cancelled_at_and_updated_at() {
        let created = Utc::now();
        let mut order = Order::new("ORD-1".to_string(), owner(), created);
        let later = created + Duration::seconds(5);

        order.cancel(later).expect("pending order can be cancelled");

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.cancelled_at(), Some(later));
        assert_eq!(order.updated_at(), later);
        assert!(order.ensure_editable().is_err());
    }

    #[test]
    fn timestamps_never_precede_creation() {
        let created = Utc::now();
        let mut order = Order::new("ORD-1".to_string(), owner(), created);
        order.cancel(created - Duration::seconds(30)).unwrap();

        assert_eq!(order.updated_at(), created);
        assert_eq!(order.cancelled_at(), Some(created));
    }

    #[test]
    fn illegal_transition_leaves_order_untouched() {
        let mut order = Order::new("ORD-1".to_string(), owner(), Utc::now());
        let before = order.clone();

        let err = order.transition_to(OrderStatus::Delivered, Utc::now());

        assert!(matches!(err, Err(DomainError::InvalidState(_))));
        assert_eq!(order, before);
    }

    #[test]
    fn view_projects_status_token_and_subtotals() {
        let mut order = Order::new("ORD-9".to_string(), owner(), Utc::now());
        order.add_item(item("4.00", 2, Some("1.00")));
        order.recalculate_total();

        let view = OrderView::from(&order);
        assert_eq!(view.status, "PENDING");
        assert_eq!(view.username, "alice");
        assert_eq!(view.items[0].subtotal, dec("7.00"));
        assert_eq!(view.total_amount, dec("7.00"));
    }
}
