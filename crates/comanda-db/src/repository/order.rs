//! # Order Repository (Order Store)
//!
//! Owns the order lifecycle and is the only caller of the ledger's
//! mutating functions.
//!
//! ## Mutation Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. lock order:<id>                                                     │
//! │  2. read order, products, recipes        (pooled conn, then released)   │
//! │  3. rules from comanda_core::order       (pure)                         │
//! │  4. deltas = diff(expand(old), expand(new))                             │
//! │  5. lock ingredient:<id> for each delta  (ascending id)                 │
//! │  6. BEGIN                                                               │
//! │       claim: UPDATE orders … version+1 WHERE version = read version     │
//! │       apply deltas to lots               (deduct +, restore −)          │
//! │       write order row + items  (or DELETE)                              │
//! │     COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Any error between BEGIN and COMMIT drops the transaction, so neither
//! the items nor a single lot change. The claim is the first statement so
//! the transaction holds SQLite's write lock before it reads any lot.
//!
//! Deltas are planned before BEGIN and planned again on the transaction's
//! snapshot; a recipe replaced in between surfaces as `Conflict`. Recipes
//! of products held by open orders cannot be replaced at all (see
//! `CatalogRepository::set_recipe`), so a return always mirrors the
//! deduction it undoes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::locks::{LockKey, LockRegistry, LockSet};
use crate::repository::catalog::{load_products, load_recipes};
use crate::repository::inventory::{apply_deltas, LedgerReport};
use crate::repository::sale::record_finalization;
use comanda_core::order::{self as rules, FinalizeCheck};
use comanda_core::recipe::{diff, expand, Needs, StockDelta};
use comanda_core::{
    CoreError, CustomerInfo, ItemStatus, KitchenStatus, Order, OrderItem, OrderItemDraft,
    OrderStatus, PaymentStatus, Sale, StorePolicy,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    origin_id: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    guest_count: i64,
    kitchen_status: Option<KitchenStatus>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    payment_proof: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    first_sent_at: Option<DateTime<Utc>>,
    last_sent_at: Option<DateTime<Utc>>,
    ready_at: Option<DateTime<Utc>>,
    served_at: Option<DateTime<Utc>>,
    finalized_at: Option<DateTime<Utc>>,
    version: i64,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        let customer = self.customer_name.map(|name| CustomerInfo {
            name,
            phone: self.customer_phone,
            payment_proof: self.payment_proof,
        });

        Order {
            id: self.id,
            origin_id: self.origin_id,
            status: self.status,
            payment_status: self.payment_status,
            guest_count: self.guest_count,
            kitchen_status: self.kitchen_status,
            customer,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
            first_sent_at: self.first_sent_at,
            last_sent_at: self.last_sent_at,
            ready_at: self.ready_at,
            served_at: self.served_at,
            finalized_at: self.finalized_at,
            version: self.version,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    quantity: i64,
    excluded_ingredients: String,
    comment: Option<String>,
    status: ItemStatus,
    sent_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DbError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            excluded_ingredients: serde_json::from_str(&row.excluded_ingredients)?,
            comment: row.comment,
            status: row.status,
            sent_at: row.sent_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, origin_id, status, payment_status, guest_count, kitchen_status, \
     customer_name, customer_phone, payment_proof, created_at, updated_at, \
     first_sent_at, last_sent_at, ready_at, served_at, finalized_at, version";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, quantity, excluded_ingredients, comment, status, sent_at";

// =============================================================================
// Outcomes
// =============================================================================

/// Result of [`OrderRepository::finalize`].
#[derive(Debug, Clone, Serialize)]
pub struct Finalization {
    pub order: Order,
    pub sales: Vec<Sale>,
    /// `false` when the order was already finalized by an earlier call.
    pub newly_finalized: bool,
}

/// What to do with the order row once ledger deltas are applied.
#[derive(Clone, Copy)]
enum Write {
    Save,
    Delete,
}

// =============================================================================
// Repository
// =============================================================================

/// The Order Store.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    locks: Arc<LockRegistry>,
    policy: StorePolicy,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool, locks: Arc<LockRegistry>, policy: StorePolicy) -> Self {
        OrderRepository {
            pool,
            locks,
            policy,
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn get_order(&self, id: &str) -> DbResult<Order> {
        let mut conn = self.pool.acquire().await?;
        require_order(&mut conn, id).await
    }

    /// Every order (any status) opened on an origin, oldest first.
    ///
    /// The origin is trimmed the same way `create_order` trims it.
    pub async fn get_orders_by_origin(&self, origin_id: &str) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE origin_id = ?1 ORDER BY created_at, rowid",
            ORDER_COLUMNS
        ))
        .bind(origin_id.trim())
        .fetch_all(&mut *conn)
        .await?;

        attach_items(&mut conn, rows).await
    }

    pub async fn list_active_orders(&self) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE status = 'active' ORDER BY created_at, rowid",
            ORDER_COLUMNS
        ))
        .fetch_all(&mut *conn)
        .await?;

        attach_items(&mut conn, rows).await
    }

    /// Orders the kitchen is working on (`received`) or has finished
    /// (`ready`), longest-waiting round first.
    pub async fn list_kitchen_queue(&self) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders \
             WHERE status = 'active' AND kitchen_status IN ('received', 'ready') \
             ORDER BY last_sent_at, rowid",
            ORDER_COLUMNS
        ))
        .fetch_all(&mut *conn)
        .await?;

        attach_items(&mut conn, rows).await
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Opens an order on a table.
    ///
    /// A table holds at most one active order; the takeaway origin holds any
    /// number.
    pub async fn create_order(&self, origin_id: &str, guest_count: i64) -> DbResult<Order> {
        let now = Utc::now();
        let order = rules::new_order(origin_id, guest_count, now)?;

        let _origin = self
            .lock([LockKey::Origin(order.origin_id.clone())])
            .await?;

        let mut tx = self.pool.begin().await?;

        if !self.policy.is_takeaway(&order.origin_id) {
            let occupied: Option<String> = sqlx::query_scalar(
                "SELECT id FROM orders WHERE origin_id = ?1 AND status = 'active' LIMIT 1",
            )
            .bind(&order.origin_id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(existing) = occupied {
                return Err(CoreError::OriginOccupied {
                    origin_id: order.origin_id.clone(),
                    order_id: existing,
                }
                .into());
            }
        }

        insert_order(&mut tx, &order).await?;
        tx.commit().await?;

        info!(order_id = %order.id, origin_id = %order.origin_id, "Order created");
        Ok(order)
    }

    /// A customer-submitted takeaway. Stock is deducted now, not at
    /// validation.
    pub async fn submit_pending_takeaway(
        &self,
        items: Vec<OrderItemDraft>,
        customer: CustomerInfo,
    ) -> DbResult<Order> {
        let now = Utc::now();

        let (order, deltas) = {
            let mut conn = self.pool.acquire().await?;
            let products = load_products(&mut conn, &draft_product_ids(&items)).await?;
            let order = rules::new_pending_takeaway(
                &self.policy.takeaway_origin,
                &items,
                customer,
                &products,
                now,
            )?;
            let deltas = plan_deltas(&mut conn, &[], &order.items).await?;
            (order, deltas)
        };

        let _ingredients = self.lock(ingredient_keys(&deltas)).await?;

        let mut tx = self.pool.begin().await?;
        insert_order(&mut tx, &order).await?;
        verify_deltas(&mut tx, &[], &order.items, &deltas).await?;
        apply_deltas(&mut tx, &deltas, &self.policy, &order.id, now).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            items = order.items.len(),
            "Takeaway submitted, awaiting validation"
        );
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Item Editing
    // -------------------------------------------------------------------------

    /// Replaces the item list, moving only the stock difference.
    ///
    /// Sent items must be resubmitted unchanged; lines without an id are
    /// added.
    pub async fn update_order_items(
        &self,
        order_id: &str,
        items: Vec<OrderItemDraft>,
    ) -> DbResult<Order> {
        let _order_lock = self.lock_order(order_id).await?;
        let now = Utc::now();

        let (mut order, held, deltas) = {
            let mut conn = self.pool.acquire().await?;
            let mut order = require_order(&mut conn, order_id).await?;
            rules::ensure_items_editable(&order)?;

            let products = load_products(&mut conn, &draft_product_ids(&items)).await?;
            let proposed = rules::plan_items(&order, &items, &products)?;
            let deltas = plan_deltas(&mut conn, &order.items, &proposed).await?;

            let held = std::mem::replace(&mut order.items, proposed);
            order.updated_at = now;
            (order, held, deltas)
        };

        debug!(order_id = %order_id, deltas = deltas.len(), "Applying item edit");
        self.commit(&mut order, &held, &deltas, Write::Save, now)
            .await?;

        info!(order_id = %order_id, items = order.items.len(), "Order items updated");
        Ok(order)
    }

    pub async fn update_guest_count(&self, order_id: &str, guest_count: i64) -> DbResult<Order> {
        self.transition(order_id, |order, now| {
            rules::update_guest_count(order, guest_count, now)
        })
        .await
    }

    // -------------------------------------------------------------------------
    // Kitchen
    // -------------------------------------------------------------------------

    /// Sends every `new` item to the kitchen.
    pub async fn send_to_kitchen(&self, order_id: &str) -> DbResult<Order> {
        let order = self
            .transition(order_id, |order, now| {
                rules::send_to_kitchen(order, now).map(|_| ())
            })
            .await?;
        info!(order_id = %order_id, "Order sent to kitchen");
        Ok(order)
    }

    pub async fn mark_ready(&self, order_id: &str) -> DbResult<Order> {
        let order = self.transition(order_id, rules::mark_ready).await?;
        info!(order_id = %order_id, "Order ready");
        Ok(order)
    }

    pub async fn acknowledge_served(&self, order_id: &str) -> DbResult<Order> {
        let order = self.transition(order_id, rules::acknowledge_served).await?;
        info!(order_id = %order_id, "Order served");
        Ok(order)
    }

    /// Records the payment signal. Does not change the lifecycle.
    pub async fn mark_paid(&self, order_id: &str) -> DbResult<Order> {
        let order = self
            .transition(order_id, |order, now| {
                rules::mark_paid(order, now);
                Ok(())
            })
            .await?;
        info!(order_id = %order_id, "Order paid");
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Takeaway
    // -------------------------------------------------------------------------

    /// Accepts a pending takeaway straight into the kitchen queue.
    pub async fn validate_takeaway(&self, order_id: &str) -> DbResult<Order> {
        let order = self
            .transition(order_id, rules::validate_takeaway)
            .await?;
        info!(order_id = %order_id, "Takeaway validated");
        Ok(order)
    }

    /// Turns down a pending takeaway: stock comes back, the order is deleted.
    pub async fn reject_takeaway(&self, order_id: &str) -> DbResult<()> {
        self.remove(order_id, rules::ensure_pending, true).await?;
        info!(order_id = %order_id, "Takeaway rejected");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Cancellation
    // -------------------------------------------------------------------------

    /// Abandons an unpaid order nothing of which reached the kitchen. Every
    /// deducted quantity is returned.
    pub async fn cancel_unpaid(&self, order_id: &str) -> DbResult<()> {
        self.remove(order_id, rules::ensure_cancellable_unpaid, true)
            .await?;
        info!(order_id = %order_id, "Unpaid order cancelled");
        Ok(())
    }

    /// Deletes an order that has no items.
    pub async fn cancel_empty(&self, order_id: &str) -> DbResult<()> {
        self.remove(order_id, rules::ensure_cancellable_empty, false)
            .await?;
        info!(order_id = %order_id, "Empty order cancelled");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Finalization
    // -------------------------------------------------------------------------

    /// Closes the order and writes its sales. Safe to retry: a second call
    /// returns the existing sales and writes nothing.
    pub async fn finalize(&self, order_id: &str) -> DbResult<Finalization> {
        let _order_lock = self.lock_order(order_id).await?;
        let now = Utc::now();

        let mut order = self.get_order(order_id).await?;

        if rules::check_finalize(&order)? == FinalizeCheck::AlreadyFinalized {
            debug!(order_id = %order_id, "Already finalized");
            let sales = existing_sales(&self.pool, order_id).await?;
            return Ok(Finalization {
                order,
                sales,
                newly_finalized: false,
            });
        }

        let mut tx = self.pool.begin().await?;
        claim(&mut tx, &mut order, now).await?;
        let sales = record_finalization(&mut tx, &mut order, now).await?;
        save_order(&mut tx, &order).await?;
        tx.commit().await?;

        info!(order_id = %order_id, "Order finalized");
        Ok(Finalization {
            order,
            sales,
            newly_finalized: true,
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn lock(&self, keys: impl IntoIterator<Item = LockKey>) -> DbResult<LockSet> {
        self.locks.acquire(keys, self.policy.lock_timeout).await
    }

    async fn lock_order(&self, order_id: &str) -> DbResult<LockSet> {
        self.lock([LockKey::Order(order_id.to_string())]).await
    }

    /// Applies a stock-neutral rule to the order and persists it.
    async fn transition<F>(&self, order_id: &str, apply: F) -> DbResult<Order>
    where
        F: FnOnce(&mut Order, DateTime<Utc>) -> Result<(), CoreError>,
    {
        let _order_lock = self.lock_order(order_id).await?;
        let now = Utc::now();

        let mut order = self.get_order(order_id).await?;
        apply(&mut order, now)?;

        let held = order.items.clone();
        self.commit(&mut order, &held, &[], Write::Save, now).await?;
        Ok(order)
    }

    /// Deletes the order after `check` passes, returning its stock first
    /// when `refund` is set.
    async fn remove<F>(&self, order_id: &str, check: F, refund: bool) -> DbResult<()>
    where
        F: FnOnce(&Order) -> Result<(), CoreError>,
    {
        let _order_lock = self.lock_order(order_id).await?;
        let now = Utc::now();

        let (mut order, deltas) = {
            let mut conn = self.pool.acquire().await?;
            let order = require_order(&mut conn, order_id).await?;
            check(&order)?;

            let deltas = if refund {
                plan_deltas(&mut conn, &order.items, &[]).await?
            } else {
                Vec::new()
            };
            (order, deltas)
        };

        let held = order.items.clone();
        self.commit(&mut order, &held, &deltas, Write::Delete, now)
            .await?;
        Ok(())
    }

    /// Steps 5 and 6 of the mutation protocol. `held` is the item list the
    /// ledger currently reflects; `deltas` move it to the written state.
    async fn commit(
        &self,
        order: &mut Order,
        held: &[OrderItem],
        deltas: &[StockDelta],
        write: Write,
        now: DateTime<Utc>,
    ) -> DbResult<LedgerReport> {
        let _ingredients = self.lock(ingredient_keys(deltas)).await?;

        let mut tx = self.pool.begin().await?;
        claim(&mut tx, order, now).await?;

        let next: &[OrderItem] = match write {
            Write::Save => &order.items,
            Write::Delete => &[],
        };
        verify_deltas(&mut tx, held, next, deltas).await?;

        let report = apply_deltas(&mut tx, deltas, &self.policy, &order.id, now).await?;

        match write {
            Write::Save => save_order(&mut tx, order).await?,
            Write::Delete => delete_order(&mut tx, &order.id).await?,
        }

        tx.commit().await?;
        Ok(report)
    }
}

// =============================================================================
// Row Access
// =============================================================================

fn draft_product_ids(drafts: &[OrderItemDraft]) -> Vec<String> {
    drafts.iter().map(|d| d.product_id.clone()).collect()
}

async fn needs(conn: &mut SqliteConnection, items: &[OrderItem]) -> DbResult<Needs> {
    let product_ids: Vec<String> = items.iter().map(|i| i.product_id.clone()).collect();
    let recipes = load_recipes(conn, &product_ids).await?;
    Ok(expand(items, &recipes))
}

/// Ledger movements that take the stock held for `held` to what `next`
/// requires, under the recipes visible on `conn`.
async fn plan_deltas(
    conn: &mut SqliteConnection,
    held: &[OrderItem],
    next: &[OrderItem],
) -> DbResult<Vec<StockDelta>> {
    let old = needs(conn, held).await?;
    let new = needs(conn, next).await?;
    Ok(diff(&old, &new))
}

/// Re-plans inside the transaction. Deltas planned against a recipe that
/// has since been replaced would deduct or return the wrong amount.
async fn verify_deltas(
    conn: &mut SqliteConnection,
    held: &[OrderItem],
    next: &[OrderItem],
    planned: &[StockDelta],
) -> DbResult<()> {
    if held == next {
        return Ok(());
    }

    let fresh = plan_deltas(conn, held, next).await?;
    if fresh != planned {
        return Err(DbError::conflict(
            "a recipe changed while the stock movement was planned",
        ));
    }
    Ok(())
}

fn ingredient_keys(deltas: &[StockDelta]) -> Vec<LockKey> {
    deltas
        .iter()
        .map(|d| LockKey::Ingredient(d.ingredient_id.clone()))
        .collect()
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {} FROM orders WHERE id = ?1",
        ORDER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(attach_items(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn require_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Order> {
    fetch_order(conn, id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
}

async fn attach_items(conn: &mut SqliteConnection, rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let item_rows = sqlx::query_as::<_, OrderItemRow>(&format!(
        "SELECT {} FROM order_items WHERE order_id IN (SELECT value FROM json_each(?1)) \
         ORDER BY order_id, position",
        ITEM_COLUMNS
    ))
    .bind(serde_json::to_string(&ids)?)
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: HashMap<String, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        let order_id = row.order_id.clone();
        grouped
            .entry(order_id)
            .or_default()
            .push(OrderItem::try_from(row)?);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = grouped.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect())
}

/// Bumps the version if nobody else has since `order` was read.
async fn claim(conn: &mut SqliteConnection, order: &mut Order, now: DateTime<Utc>) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE orders SET version = version + 1, updated_at = ?1 WHERE id = ?2 AND version = ?3",
    )
    .bind(now)
    .bind(&order.id)
    .bind(order.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict(format!(
            "order {} changed since version {}",
            order.id, order.version
        )));
    }

    order.version += 1;
    order.updated_at = now;
    Ok(())
}

async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    let customer = order.customer.as_ref();

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, origin_id, status, payment_status, guest_count, kitchen_status,
            customer_name, customer_phone, payment_proof, created_at, updated_at,
            first_sent_at, last_sent_at, ready_at, served_at, finalized_at, version
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
    )
    .bind(&order.id)
    .bind(&order.origin_id)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.guest_count)
    .bind(order.kitchen_status)
    .bind(customer.map(|c| c.name.clone()))
    .bind(customer.and_then(|c| c.phone.clone()))
    .bind(customer.and_then(|c| c.payment_proof.clone()))
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.first_sent_at)
    .bind(order.last_sent_at)
    .bind(order.ready_at)
    .bind(order.served_at)
    .bind(order.finalized_at)
    .bind(order.version)
    .execute(&mut *conn)
    .await?;

    write_items(conn, order).await
}

/// Writes every mutable column. The version was already bumped by
/// [`claim`].
async fn save_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE orders SET
            status = ?1, payment_status = ?2, guest_count = ?3, kitchen_status = ?4,
            updated_at = ?5, first_sent_at = ?6, last_sent_at = ?7, ready_at = ?8,
            served_at = ?9, finalized_at = ?10
        WHERE id = ?11
        "#,
    )
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.guest_count)
    .bind(order.kitchen_status)
    .bind(order.updated_at)
    .bind(order.first_sent_at)
    .bind(order.last_sent_at)
    .bind(order.ready_at)
    .bind(order.served_at)
    .bind(order.finalized_at)
    .bind(&order.id)
    .execute(&mut *conn)
    .await?;

    write_items(conn, order).await
}

/// Makes the stored items exactly `order.items`, keeping each surviving
/// row's `created_at`.
async fn write_items(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    let keep: Vec<&str> = order.items.iter().map(|i| i.id.as_str()).collect();

    sqlx::query(
        "DELETE FROM order_items WHERE order_id = ?1 \
         AND id NOT IN (SELECT value FROM json_each(?2))",
    )
    .bind(&order.id)
    .bind(serde_json::to_string(&keep)?)
    .execute(&mut *conn)
    .await?;

    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, position, product_id, quantity, excluded_ingredients,
                comment, status, sent_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                position = excluded.position,
                product_id = excluded.product_id,
                quantity = excluded.quantity,
                excluded_ingredients = excluded.excluded_ingredients,
                comment = excluded.comment,
                status = excluded.status,
                sent_at = excluded.sent_at
            "#,
        )
        .bind(&item.id)
        .bind(&order.id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(serde_json::to_string(&item.excluded_ingredients)?)
        .bind(&item.comment)
        .bind(item.status)
        .bind(item.sent_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn delete_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM orders WHERE id = ?1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn existing_sales(pool: &SqlitePool, order_id: &str) -> DbResult<Vec<Sale>> {
    crate::repository::sale::SaleRepository::new(pool.clone())
        .sales_for_order(order_id)
        .await
}

// =============================================================================
// Unit Tests
// =============================================================================
