//! # Order State Machine
//!
//! Pure transition rules for orders. Every function here either mutates an
//! in-memory [`Order`] or explains why it cannot; persistence and ledger
//! side effects belong to the database layer.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  dine-in:                                                               │
//! │                                                                         │
//! │   create ──► ACTIVE ─── edit items (kitchen ∈ {none, served}) ──┐       │
//! │                │  ▲                                             │       │
//! │                │  └─────────────────────────────────────────────┘       │
//! │                ▼                                                        │
//! │          send_to_kitchen ──► received ──► ready ──► served              │
//! │                                                       │                 │
//! │                                      finalize ◄───────┘                 │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                                     FINALIZED (terminal, sales written) │
//! │                                                                         │
//! │  takeaway:                                                              │
//! │                                                                         │
//! │   submit ──► PENDING_VALIDATION ──► validate ──► ACTIVE (received)      │
//! │                       │                                                 │
//! │                       └──► reject (stock returned, order deleted)       │
//! │                                                                         │
//! │  side channels (ACTIVE only):                                           │
//! │   cancel_unpaid  unpaid, nothing sent  → stock returned, deleted        │
//! │   cancel_empty   no items              → deleted                        │
//! │   mark_paid      any status            → payment flag only              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sent Items Are Frozen
//! Once an item is `sent_to_kitchen` its product, quantity, exclusions and
//! comment never change and it cannot be removed. Callers resubmit it
//! verbatim alongside any new lines.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::recipe::RecipeBook;
use crate::types::{
    CustomerInfo, ItemStatus, KitchenStatus, Order, OrderItem, OrderItemDraft, OrderStatus,
    PaymentStatus, Product, Sale,
};
use crate::validation::{
    validate_comment, validate_customer, validate_exclusions, validate_guest_count,
    validate_item_quantity, validate_name,
};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Construction
// =============================================================================

/// A fresh dine-in (or staff-entered takeaway) order with no items.
pub fn new_order(origin_id: &str, guest_count: i64, now: DateTime<Utc>) -> CoreResult<Order> {
    validate_name("origin_id", origin_id)?;
    validate_guest_count(guest_count)?;

    Ok(Order {
        id: Uuid::new_v4().to_string(),
        origin_id: origin_id.trim().to_string(),
        status: OrderStatus::Active,
        payment_status: PaymentStatus::Unpaid,
        guest_count,
        kitchen_status: None,
        customer: None,
        items: Vec::new(),
        created_at: now,
        updated_at: now,
        first_sent_at: None,
        last_sent_at: None,
        ready_at: None,
        served_at: None,
        finalized_at: None,
        version: 0,
    })
}

/// A customer-submitted takeaway awaiting staff validation.
///
/// Items are built as `new`; they move to `sent_to_kitchen` on validation.
pub fn new_pending_takeaway(
    origin_id: &str,
    drafts: &[OrderItemDraft],
    customer: CustomerInfo,
    products: &HashMap<String, Product>,
    now: DateTime<Utc>,
) -> CoreResult<Order> {
    validate_customer(&customer)?;
    if drafts.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    let mut order = new_order(origin_id, 0, now)?;
    order.status = OrderStatus::PendingValidation;
    order.customer = Some(customer);
    order.items = plan_items(&order, drafts, products)?;

    Ok(order)
}

// =============================================================================
// Item Editing
// =============================================================================

/// Whether the item list may be edited right now.
pub fn ensure_items_editable(order: &Order) -> CoreResult<()> {
    if order.status != OrderStatus::Active {
        return Err(CoreError::invalid_state(
            &order.id,
            format!("items cannot be edited while {}", order.status.as_str()),
        ));
    }
    match order.kitchen_status {
        None | Some(KitchenStatus::Served) => Ok(()),
        Some(status) => Err(CoreError::invalid_state(
            &order.id,
            format!("kitchen is still on the last round ({})", status.as_str()),
        )),
    }
}

/// Builds the proposed item list from `drafts`, enforcing the item rules.
///
/// ## Rules
/// - Draft without id: new line, product must exist and be available
/// - Draft with id of a `new` item: may change anything; a changed product
///   must be available
/// - Draft with id of a sent item: must match it exactly
/// - Every sent item must be present
///
/// Draft order becomes item order. Nothing is mutated; the caller diffs the
/// result against the current items and only then replaces them.
pub fn plan_items(
    order: &Order,
    drafts: &[OrderItemDraft],
    products: &HashMap<String, Product>,
) -> CoreResult<Vec<OrderItem>> {
    let existing: HashMap<&str, &OrderItem> =
        order.items.iter().map(|i| (i.id.as_str(), i)).collect();
    let mut seen_ids = HashSet::new();
    let mut planned = Vec::with_capacity(drafts.len());

    for draft in drafts {
        check_draft(draft)?;

        let item = match draft.id.as_deref() {
            None => OrderItem {
                id: Uuid::new_v4().to_string(),
                product_id: orderable(&draft.product_id, products)?.id.clone(),
                quantity: draft.quantity,
                excluded_ingredients: draft.excluded_ingredients.clone(),
                comment: draft.comment.clone(),
                status: ItemStatus::New,
                sent_at: None,
            },
            Some(id) => {
                if !seen_ids.insert(id) {
                    return Err(ValidationError::Duplicate {
                        field: "item id".to_string(),
                        value: id.to_string(),
                    }
                    .into());
                }
                let current = existing.get(id).ok_or_else(|| ValidationError::InvalidFormat {
                    field: "item id".to_string(),
                    reason: format!("{} is not an item of order {}", id, order.id),
                })?;

                if current.is_new() {
                    if draft.product_id != current.product_id {
                        orderable(&draft.product_id, products)?;
                    }
                    OrderItem {
                        id: current.id.clone(),
                        product_id: draft.product_id.clone(),
                        quantity: draft.quantity,
                        excluded_ingredients: draft.excluded_ingredients.clone(),
                        comment: draft.comment.clone(),
                        status: ItemStatus::New,
                        sent_at: None,
                    }
                } else {
                    if !matches_sent(current, draft) {
                        return Err(CoreError::ItemLocked {
                            item_id: current.id.clone(),
                        });
                    }
                    (*current).clone()
                }
            }
        };

        planned.push(item);
    }

    if let Some(dropped) = order
        .items
        .iter()
        .find(|i| !i.is_new() && !seen_ids.contains(i.id.as_str()))
    {
        return Err(CoreError::ItemLocked {
            item_id: dropped.id.clone(),
        });
    }

    Ok(planned)
}

fn check_draft(draft: &OrderItemDraft) -> CoreResult<()> {
    if draft.quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: draft.quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    validate_item_quantity(draft.quantity)?;
    validate_exclusions(&draft.excluded_ingredients)?;
    validate_comment(draft.comment.as_deref())?;
    Ok(())
}

fn orderable<'a>(product_id: &str, products: &'a HashMap<String, Product>) -> CoreResult<&'a Product> {
    let product = products
        .get(product_id)
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    if !product.is_available() {
        return Err(CoreError::ProductUnavailable {
            product_id: product.id.clone(),
            status: product.status.as_str().to_string(),
        });
    }
    Ok(product)
}

fn matches_sent(item: &OrderItem, draft: &OrderItemDraft) -> bool {
    item.product_id == draft.product_id
        && item.quantity == draft.quantity
        && item.excluded_ingredients == draft.excluded_ingredients
        && item.comment == draft.comment
}

pub fn update_guest_count(order: &mut Order, guest_count: i64, now: DateTime<Utc>) -> CoreResult<()> {
    if order.status == OrderStatus::Finalized {
        return Err(CoreError::invalid_state(&order.id, "order is finalized"));
    }
    validate_guest_count(guest_count)?;
    order.guest_count = guest_count;
    order.updated_at = now;
    Ok(())
}

// =============================================================================
// Kitchen Transitions
// =============================================================================

/// Marks every `new` item as sent and opens a kitchen round.
///
/// Returns how many items were sent.
pub fn send_to_kitchen(order: &mut Order, now: DateTime<Utc>) -> CoreResult<usize> {
    ensure_items_editable(order)?;

    let mut sent = 0;
    for item in order.items.iter_mut().filter(|i| i.is_new()) {
        item.status = ItemStatus::SentToKitchen;
        item.sent_at = Some(now);
        sent += 1;
    }
    if sent == 0 {
        return Err(CoreError::invalid_state(&order.id, "no new items to send"));
    }

    order.kitchen_status = Some(KitchenStatus::Received);
    order.first_sent_at.get_or_insert(now);
    order.last_sent_at = Some(now);
    order.updated_at = now;
    Ok(sent)
}

/// Kitchen finished the current round: `received → ready`.
pub fn mark_ready(order: &mut Order, now: DateTime<Utc>) -> CoreResult<()> {
    expect_kitchen(order, KitchenStatus::Received)?;
    order.kitchen_status = Some(KitchenStatus::Ready);
    order.ready_at = Some(now);
    order.updated_at = now;
    Ok(())
}

/// Front of house delivered the round: `ready → served`.
///
/// `served_at` keeps the first delivery time.
pub fn acknowledge_served(order: &mut Order, now: DateTime<Utc>) -> CoreResult<()> {
    expect_kitchen(order, KitchenStatus::Ready)?;
    order.kitchen_status = Some(KitchenStatus::Served);
    order.served_at.get_or_insert(now);
    order.updated_at = now;
    Ok(())
}

fn expect_kitchen(order: &Order, expected: KitchenStatus) -> CoreResult<()> {
    if order.status != OrderStatus::Active {
        return Err(CoreError::invalid_state(
            &order.id,
            format!("order is {}", order.status.as_str()),
        ));
    }
    if order.kitchen_status != Some(expected) {
        let current = order.kitchen_status.map(|s| s.as_str()).unwrap_or("not sent");
        return Err(CoreError::invalid_state(
            &order.id,
            format!("kitchen status is {}, expected {}", current, expected.as_str()),
        ));
    }
    Ok(())
}

/// Returns `true` if the flag changed.
pub fn mark_paid(order: &mut Order, now: DateTime<Utc>) -> bool {
    if order.payment_status == PaymentStatus::Paid {
        return false;
    }
    order.payment_status = PaymentStatus::Paid;
    order.updated_at = now;
    true
}

// =============================================================================
// Takeaway
// =============================================================================

/// `pending_validation → active`, items straight to the kitchen.
pub fn validate_takeaway(order: &mut Order, now: DateTime<Utc>) -> CoreResult<()> {
    ensure_pending(order)?;

    for item in order.items.iter_mut() {
        item.status = ItemStatus::SentToKitchen;
        item.sent_at = Some(now);
    }
    order.status = OrderStatus::Active;
    order.kitchen_status = Some(KitchenStatus::Received);
    order.first_sent_at.get_or_insert(now);
    order.last_sent_at = Some(now);
    order.updated_at = now;
    Ok(())
}

pub fn ensure_pending(order: &Order) -> CoreResult<()> {
    if order.status != OrderStatus::PendingValidation {
        return Err(CoreError::invalid_state(
            &order.id,
            format!("expected pending_validation, order is {}", order.status.as_str()),
        ));
    }
    Ok(())
}

// =============================================================================
// Cancellation
// =============================================================================

/// An abandoned session: active, unpaid, nothing reached the kitchen.
pub fn ensure_cancellable_unpaid(order: &Order) -> CoreResult<()> {
    if order.status != OrderStatus::Active {
        return Err(CoreError::invalid_state(&order.id, "only active orders can be cancelled"));
    }
    if order.payment_status == PaymentStatus::Paid {
        return Err(CoreError::invalid_state(&order.id, "order is already paid"));
    }
    if order.items.iter().any(|i| !i.is_new()) {
        return Err(CoreError::invalid_state(
            &order.id,
            "items were already sent to the kitchen",
        ));
    }
    Ok(())
}

pub fn ensure_cancellable_empty(order: &Order) -> CoreResult<()> {
    if order.status != OrderStatus::Active {
        return Err(CoreError::invalid_state(&order.id, "only active orders can be cancelled"));
    }
    if !order.items.is_empty() {
        return Err(CoreError::invalid_state(&order.id, "order still has items"));
    }
    Ok(())
}

// =============================================================================
// Finalization
// =============================================================================

/// Outcome of checking whether an order may be finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeCheck {
    /// Already finalized; a retry must succeed without writing anything.
    AlreadyFinalized,
    Proceed,
}

pub fn check_finalize(order: &Order) -> CoreResult<FinalizeCheck> {
    match order.status {
        OrderStatus::Finalized => return Ok(FinalizeCheck::AlreadyFinalized),
        OrderStatus::PendingValidation => {
            return Err(CoreError::invalid_state(
                &order.id,
                "takeaway must be validated before it can be finalized",
            ))
        }
        OrderStatus::Active => {}
    }

    if order.items.is_empty() {
        return Err(CoreError::invalid_state(&order.id, "order has no items"));
    }
    if order.items.iter().any(|i| i.is_new()) {
        return Err(CoreError::invalid_state(
            &order.id,
            "order has items not yet sent to the kitchen",
        ));
    }
    if order.kitchen_status == Some(KitchenStatus::Ready) {
        return Err(CoreError::invalid_state(
            &order.id,
            "order is ready but not yet served",
        ));
    }
    Ok(FinalizeCheck::Proceed)
}

/// Closes the order. An order never acknowledged as served counts as
/// served now.
pub fn finalize(order: &mut Order, now: DateTime<Utc>) {
    if order.served_at.is_none() {
        order.served_at = Some(now);
    }
    order.status = OrderStatus::Finalized;
    order.finalized_at = Some(now);
    order.updated_at = now;
}

/// One sale row per item, priced and costed at this instant.
///
/// `average_costs` holds each ingredient's current average unit cost.
/// Excluded ingredients are not part of the cost.
pub fn snapshot_sales(
    order: &Order,
    products: &HashMap<String, Product>,
    recipes: &RecipeBook,
    average_costs: &HashMap<String, Money>,
    now: DateTime<Utc>,
) -> CoreResult<Vec<Sale>> {
    order
        .items
        .iter()
        .map(|item| {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
            let unit_cost = recipes
                .get(&item.product_id)
                .map(|r| r.unit_cost(&item.excluded_ingredients, average_costs))
                .unwrap_or_default();

            let revenue = product.price.multiply_quantity(item.quantity);
            let cost = unit_cost.multiply_quantity(item.quantity);

            Ok(Sale {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                order_item_id: item.id.clone(),
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: product.price,
                unit_cost,
                revenue,
                cost,
                profit: revenue - cost,
                sold_at: now,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use crate::recipe::{Recipe, RecipeLine};
    use crate::types::ProductStatus;
    use chrono::{Duration, TimeZone};

    fn t(n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(n)
    }

    fn product(id: &str, price: i64, status: ProductStatus) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            price: Money::from_cents(price),
            category_id: None,
            status,
            created_at: t(0),
            updated_at: t(0),
        }
    }

    fn menu() -> HashMap<String, Product> {
        [
            product("pizza", 1000, ProductStatus::Available),
            product("salad", 650, ProductStatus::Available),
            product("soup", 500, ProductStatus::TemporarilyUnavailable),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect()
    }

    fn order_with(drafts: &[OrderItemDraft]) -> Order {
        let mut order = new_order("T1", 2, t(0)).unwrap();
        order.items = plan_items(&order, drafts, &menu()).unwrap();
        order
    }

    fn drafts_of(order: &Order) -> Vec<OrderItemDraft> {
        order.items.iter().map(OrderItemDraft::from).collect()
    }

    #[test]
    fn test_new_order_defaults() {
        let order = new_order(" T1 ", 4, t(0)).unwrap();
        assert_eq!(order.origin_id, "T1");
        assert_eq!(order.status, OrderStatus::Active);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.kitchen_status, None);

        assert!(new_order("", 1, t(0)).is_err());
        assert!(new_order("T1", -1, t(0)).is_err());
    }

    #[test]
    fn test_plan_assigns_ids_to_new_lines() {
        let order = order_with(&[OrderItemDraft::new("pizza", 2)]);
        assert_eq!(order.items.len(), 1);
        assert!(!order.items[0].id.is_empty());
        assert!(order.items[0].is_new());
    }

    #[test]
    fn test_plan_rejects_unavailable_and_unknown_products() {
        let order = new_order("T1", 2, t(0)).unwrap();

        let err = plan_items(&order, &[OrderItemDraft::new("soup", 1)], &menu()).unwrap_err();
        assert!(matches!(err, CoreError::ProductUnavailable { .. }));

        let err = plan_items(&order, &[OrderItemDraft::new("steak", 1)], &menu()).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_plan_rejects_bad_quantities() {
        let order = new_order("T1", 2, t(0)).unwrap();

        let err = plan_items(&order, &[OrderItemDraft::new("pizza", 0)], &menu()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = plan_items(&order, &[OrderItemDraft::new("pizza", 1000)], &menu()).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
    }

    #[test]
    fn test_new_items_freely_editable() {
        let order = order_with(&[OrderItemDraft::new("pizza", 2)]);
        let mut drafts = drafts_of(&order);
        drafts[0].quantity = 3;
        drafts[0].excluded_ingredients.push("cheese".into());

        let planned = plan_items(&order, &drafts, &menu()).unwrap();
        assert_eq!(planned[0].id, order.items[0].id);
        assert_eq!(planned[0].quantity, 3);

        // Removal of a new item is allowed
        assert!(plan_items(&order, &[], &menu()).unwrap().is_empty());
    }

    #[test]
    fn test_sent_items_are_locked() {
        let mut order = order_with(&[OrderItemDraft::new("pizza", 2)]);
        send_to_kitchen(&mut order, t(1)).unwrap();
        mark_ready(&mut order, t(2)).unwrap();
        acknowledge_served(&mut order, t(3)).unwrap();

        // Dropping it
        let err = plan_items(&order, &[], &menu()).unwrap_err();
        assert!(matches!(err, CoreError::ItemLocked { .. }));

        // Changing it
        let mut drafts = drafts_of(&order);
        drafts[0].quantity = 5;
        let err = plan_items(&order, &drafts, &menu()).unwrap_err();
        assert!(matches!(err, CoreError::ItemLocked { .. }));

        // Resubmitting unchanged plus a new line
        let mut drafts = drafts_of(&order);
        drafts.push(OrderItemDraft::new("salad", 1));
        let planned = plan_items(&order, &drafts, &menu()).unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].status, ItemStatus::SentToKitchen);
        assert!(planned[1].is_new());
    }

    #[test]
    fn test_editing_blocked_while_kitchen_busy() {
        let mut order = order_with(&[OrderItemDraft::new("pizza", 1)]);
        send_to_kitchen(&mut order, t(1)).unwrap();

        assert!(ensure_items_editable(&order).is_err());
        mark_ready(&mut order, t(2)).unwrap();
        assert!(ensure_items_editable(&order).is_err());
        acknowledge_served(&mut order, t(3)).unwrap();
        assert!(ensure_items_editable(&order).is_ok());
    }

    #[test]
    fn test_kitchen_round_timestamps() {
        let mut order = order_with(&[OrderItemDraft::new("pizza", 1)]);

        assert_eq!(send_to_kitchen(&mut order, t(1)).unwrap(), 1);
        assert_eq!(order.kitchen_status, Some(KitchenStatus::Received));
        assert_eq!(order.items[0].sent_at, Some(t(1)));

        mark_ready(&mut order, t(2)).unwrap();
        acknowledge_served(&mut order, t(3)).unwrap();

        // Second round
        let mut drafts = drafts_of(&order);
        drafts.push(OrderItemDraft::new("salad", 1));
        order.items = plan_items(&order, &drafts, &menu()).unwrap();
        send_to_kitchen(&mut order, t(4)).unwrap();
        mark_ready(&mut order, t(5)).unwrap();
        acknowledge_served(&mut order, t(6)).unwrap();

        assert_eq!(order.first_sent_at, Some(t(1)));
        assert_eq!(order.last_sent_at, Some(t(4)));
        assert_eq!(order.ready_at, Some(t(5)));
        assert_eq!(order.served_at, Some(t(3)));
    }

    #[test]
    fn test_send_requires_new_items() {
        let mut order = order_with(&[]);
        assert!(send_to_kitchen(&mut order, t(1)).is_err());
    }

    #[test]
    fn test_out_of_order_kitchen_transitions() {
        let mut order = order_with(&[OrderItemDraft::new("pizza", 1)]);
        assert!(mark_ready(&mut order, t(1)).is_err());
        assert!(acknowledge_served(&mut order, t(1)).is_err());
        send_to_kitchen(&mut order, t(1)).unwrap();
        assert!(acknowledge_served(&mut order, t(2)).is_err());
    }

    #[test]
    fn test_finalize_preconditions() {
        let mut order = order_with(&[]);
        assert!(check_finalize(&order).is_err());

        order = order_with(&[OrderItemDraft::new("pizza", 1)]);
        assert!(check_finalize(&order).is_err());

        send_to_kitchen(&mut order, t(1)).unwrap();
        // received is allowed; only ready blocks
        assert_eq!(check_finalize(&order).unwrap(), FinalizeCheck::Proceed);

        mark_ready(&mut order, t(2)).unwrap();
        assert!(check_finalize(&order).is_err());

        acknowledge_served(&mut order, t(3)).unwrap();
        assert_eq!(check_finalize(&order).unwrap(), FinalizeCheck::Proceed);

        finalize(&mut order, t(4));
        assert_eq!(check_finalize(&order).unwrap(), FinalizeCheck::AlreadyFinalized);
        assert_eq!(order.finalized_at, Some(t(4)));
        assert_eq!(order.served_at, Some(t(3)));
    }

    #[test]
    fn test_finalize_stamps_implicit_service() {
        let mut order = order_with(&[OrderItemDraft::new("pizza", 1)]);
        send_to_kitchen(&mut order, t(1)).unwrap();
        finalize(&mut order, t(2));
        assert_eq!(order.served_at, Some(t(2)));
    }

    #[test]
    fn test_cancel_rules() {
        let mut order = order_with(&[OrderItemDraft::new("pizza", 1)]);
        assert!(ensure_cancellable_unpaid(&order).is_ok());
        assert!(ensure_cancellable_empty(&order).is_err());

        mark_paid(&mut order, t(1));
        assert!(ensure_cancellable_unpaid(&order).is_err());

        let mut order = order_with(&[OrderItemDraft::new("pizza", 1)]);
        send_to_kitchen(&mut order, t(1)).unwrap();
        assert!(ensure_cancellable_unpaid(&order).is_err());

        let order = order_with(&[]);
        assert!(ensure_cancellable_empty(&order).is_ok());
    }

    #[test]
    fn test_mark_paid_idempotent() {
        let mut order = order_with(&[]);
        assert!(mark_paid(&mut order, t(1)));
        assert!(!mark_paid(&mut order, t(2)));
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Active);
    }

    #[test]
    fn test_takeaway_flow() {
        let customer = CustomerInfo {
            name: "Ana".to_string(),
            phone: None,
            payment_proof: Some("proof-123".to_string()),
        };
        let mut order = new_pending_takeaway(
            "TAKEAWAY",
            &[OrderItemDraft::new("pizza", 1)],
            customer.clone(),
            &menu(),
            t(0),
        )
        .unwrap();
        assert_eq!(order.status, OrderStatus::PendingValidation);
        assert!(check_finalize(&order).is_err());
        assert!(ensure_items_editable(&order).is_err());

        validate_takeaway(&mut order, t(1)).unwrap();
        assert_eq!(order.status, OrderStatus::Active);
        assert_eq!(order.kitchen_status, Some(KitchenStatus::Received));
        assert!(order.items.iter().all(|i| !i.is_new()));
        assert!(validate_takeaway(&mut order, t(2)).is_err());

        let err = new_pending_takeaway("TAKEAWAY", &[], customer, &menu(), t(0)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_snapshot_sales() {
        let mut order = order_with(&[
            OrderItemDraft::new("pizza", 2),
            OrderItemDraft::new("pizza", 1).excluding("cheese"),
        ]);
        send_to_kitchen(&mut order, t(1)).unwrap();

        let recipes: RecipeBook = vec![Recipe::new(
            "pizza",
            vec![
                RecipeLine::new("cheese", Quantity::from_milli(100)),
                RecipeLine::new("dough", Quantity::from_milli(250)),
            ],
        )
        .unwrap()]
        .into_iter()
        .collect();
        let costs: HashMap<String, Money> = [
            ("cheese".to_string(), Money::from_cents(1200)),
            ("dough".to_string(), Money::from_cents(400)),
        ]
        .into_iter()
        .collect();

        let sales = snapshot_sales(&order, &menu(), &recipes, &costs, t(2)).unwrap();

        assert_eq!(sales.len(), 2);
        // 0.1×12.00 + 0.25×4.00 = 2.20 per pizza
        assert_eq!(sales[0].unit_cost, Money::from_cents(220));
        assert_eq!(sales[0].revenue, Money::from_cents(2000));
        assert_eq!(sales[0].cost, Money::from_cents(440));
        assert_eq!(sales[0].profit, Money::from_cents(1560));
        // Without cheese: 1.00
        assert_eq!(sales[1].unit_cost, Money::from_cents(100));
        assert_eq!(sales[1].order_item_id, order.items[1].id);
    }

    #[test]
    fn test_guest_count_update() {
        let mut order = order_with(&[]);
        update_guest_count(&mut order, 6, t(1)).unwrap();
        assert_eq!(order.guest_count, 6);
        assert!(update_guest_count(&mut order, -2, t(1)).is_err());
    }
}
