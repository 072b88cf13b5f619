//! # Domain Types
//!
//! Core domain types used throughout Comanda.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │   Ingredient    │   │     Order       │   │      Sale       │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  minimum_stock  │   │  origin_id      │   │  order_item_id  │        │
//! │  │  stock (cache)  │   │  status         │   │  unit_cost      │        │
//! │  │  average_cost   │   │  kitchen_status │   │  revenue        │        │
//! │  │  1..n Lot       │   │  1..n OrderItem │   │  profit         │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │    Product      │   │    Category     │   Recipe lives in           │
//! │  │  price, status  │   │  name, order    │   `crate::recipe`           │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cached fields on [`Ingredient`] are materialized from its lots by
//! [`crate::ledger::LotBook::refresh`]; they are never written on their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Inventory
// =============================================================================

/// Stock unit an ingredient is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockUnit {
    /// Mass, counted in kilograms.
    Kilogram,
    /// Volume, counted in liters.
    Liter,
    /// Discrete pieces.
    Unit,
}

impl StockUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            StockUnit::Kilogram => "kg",
            StockUnit::Liter => "l",
            StockUnit::Unit => "un",
        }
    }
}

/// An ingredient tracked through purchase lots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub unit: StockUnit,

    /// At or below this level the ingredient is flagged as low stock.
    pub minimum_stock: Quantity,

    /// Σ remaining over all lots (cache).
    pub stock: Quantity,

    /// Weighted average unit cost over lots with stock, or the last known
    /// average once every lot is empty (cache).
    pub average_cost: Money,

    /// When stock first dropped to/below `minimum_stock`; `None` while above.
    #[ts(as = "Option<String>")]
    pub below_minimum_since: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    pub fn is_below_minimum(&self) -> bool {
        self.below_minimum_since.is_some()
    }
}

/// One purchased batch of an ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Lot {
    pub id: String,
    pub ingredient_id: String,
    pub initial_quantity: Quantity,
    /// Invariant: `0 <= remaining_quantity <= initial_quantity`.
    pub remaining_quantity: Quantity,
    /// Price of one stock unit in this lot.
    pub unit_cost: Money,
    #[ts(as = "String")]
    pub purchased_at: DateTime<Utc>,
}

impl Lot {
    /// Room left before the lot is back at its purchased quantity.
    #[inline]
    pub fn headroom(&self) -> Quantity {
        self.initial_quantity - self.remaining_quantity
    }
}

/// An ingredient together with its lots, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LotDetail {
    pub ingredient: Ingredient,
    pub lots: Vec<Lot>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub sort_order: i64,
}

/// Availability of a product on the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Available,
    /// Out for today (e.g. sold out).
    TemporarilyUnavailable,
    /// Off the menu until further notice.
    IndefinitelyUnavailable,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::TemporarilyUnavailable => "temporarily_unavailable",
            ProductStatus::IndefinitelyUnavailable => "indefinitely_unavailable",
        }
    }
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Available
    }
}

/// A menu product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub category_id: Option<String>,
    pub status: ProductStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }
}

// =============================================================================
// Order Status Enums
// =============================================================================

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Takeaway submitted by a customer, waiting for staff validation.
    PendingValidation,
    Active,
    /// Terminal. Sales rows have been written.
    Finalized,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingValidation => "pending_validation",
            OrderStatus::Active => "active",
            OrderStatus::Finalized => "finalized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

/// Kitchen progress of the most recent round sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum KitchenStatus {
    Received,
    Ready,
    Served,
}

impl KitchenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KitchenStatus::Received => "received",
            KitchenStatus::Ready => "ready",
            KitchenStatus::Served => "served",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    New,
    SentToKitchen,
}

// =============================================================================
// Order
// =============================================================================

/// Contact details attached to a customer-submitted takeaway order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: Option<String>,
    /// Reference to the payment proof the customer attached.
    pub payment_proof: Option<String>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    /// Always >= 1.
    pub quantity: i64,
    /// Recipe ingredients left out of this particular item.
    pub excluded_ingredients: Vec<String>,
    pub comment: Option<String>,
    pub status: ItemStatus,
    #[ts(as = "Option<String>")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl OrderItem {
    #[inline]
    pub fn is_new(&self) -> bool {
        self.status == ItemStatus::New
    }

    #[inline]
    pub fn is_excluded(&self, ingredient_id: &str) -> bool {
        self.excluded_ingredients.iter().any(|e| e == ingredient_id)
    }
}

/// A proposed order line, as submitted by the order-taking UI.
///
/// `id` is `None` for lines added in this edit. Lines already sent to the
/// kitchen must be resubmitted verbatim with their id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItemDraft {
    pub id: Option<String>,
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub excluded_ingredients: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl OrderItemDraft {
    /// Draft for a fresh line with no exclusions or comment.
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        OrderItemDraft {
            id: None,
            product_id: product_id.into(),
            quantity,
            excluded_ingredients: Vec::new(),
            comment: None,
        }
    }

    pub fn excluding(mut self, ingredient_id: impl Into<String>) -> Self {
        self.excluded_ingredients.push(ingredient_id.into());
        self
    }
}

impl From<&OrderItem> for OrderItemDraft {
    fn from(item: &OrderItem) -> Self {
        OrderItemDraft {
            id: Some(item.id.clone()),
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            excluded_ingredients: item.excluded_ingredients.clone(),
            comment: item.comment.clone(),
        }
    }
}

/// An order ("comanda") for a table or for takeaway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Table id, or the configured takeaway origin.
    pub origin_id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub guest_count: i64,
    pub kitchen_status: Option<KitchenStatus>,
    pub customer: Option<CustomerInfo>,
    pub items: Vec<OrderItem>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    // Kitchen timestamps. Audit trail, never derived.
    #[ts(as = "Option<String>")]
    pub first_sent_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub last_sent_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub ready_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub served_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub finalized_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency version, bumped on every write.
    pub version: i64,
}

// =============================================================================
// Sale
// =============================================================================

/// Immutable sales ledger row, one per order item, written at finalization.
///
/// Uses the snapshot pattern: price and cost are frozen at the instant of
/// finalization and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub order_id: String,
    pub order_item_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Product price at time of sale (frozen).
    pub unit_price: Money,
    /// Σ recipe line × ingredient average cost at time of sale (frozen).
    pub unit_cost: Money,
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PendingValidation).unwrap(),
            "\"pending_validation\""
        );
        assert_eq!(
            serde_json::to_string(&ItemStatus::SentToKitchen).unwrap(),
            "\"sent_to_kitchen\""
        );
        assert_eq!(
            serde_json::to_string(&ProductStatus::TemporarilyUnavailable).unwrap(),
            "\"temporarily_unavailable\""
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
        assert_eq!(ProductStatus::default(), ProductStatus::Available);
    }

    #[test]
    fn test_draft_from_item_keeps_identity() {
        let item = OrderItem {
            id: "item-1".to_string(),
            product_id: "pizza".to_string(),
            quantity: 2,
            excluded_ingredients: vec!["olives".to_string()],
            comment: Some("well done".to_string()),
            status: ItemStatus::SentToKitchen,
            sent_at: None,
        };

        let draft = OrderItemDraft::from(&item);
        assert_eq!(draft.id.as_deref(), Some("item-1"));
        assert_eq!(draft.excluded_ingredients, vec!["olives".to_string()]);
        assert!(item.is_excluded("olives"));
        assert!(!item.is_excluded("cheese"));
    }

    #[test]
    fn test_draft_deserializes_without_optional_fields() {
        let draft: OrderItemDraft =
            serde_json::from_str(r#"{"id":null,"product_id":"pizza","quantity":1}"#).unwrap();
        assert!(draft.excluded_ingredients.is_empty());
        assert!(draft.comment.is_none());
    }
}
