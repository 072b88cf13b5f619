//! # Sale Repository (Sales Recorder)
//!
//! The append-only sales ledger.
//!
//! ## Finalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order Store.finalize(order)                                            │
//! │     │   (order lock held, transaction open)                             │
//! │     ▼                                                                   │
//! │  record_finalization()  ← THIS MODULE                                   │
//! │     ├── read average unit cost of every recipe ingredient, now          │
//! │     ├── one Sale per item: price × qty, unit cost × qty, profit         │
//! │     ├── served_at := now if it was never acknowledged                   │
//! │     └── status := finalized                                             │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Order Store writes the order row and commits                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Price and cost are copied into the sale row. Later purchases, price
//! changes or recipe edits never alter a written sale. Rows are protected by
//! `UNIQUE(order_item_id)` and by triggers rejecting UPDATE and DELETE.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::catalog::{load_products, load_recipes};
use crate::repository::inventory::average_costs;
use comanda_core::order::{finalize, snapshot_sales};
use comanda_core::{Money, Order, Sale};

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    order_id: String,
    order_item_id: String,
    product_id: String,
    quantity: i64,
    unit_price_cents: i64,
    unit_cost_cents: i64,
    revenue_cents: i64,
    cost_cents: i64,
    profit_cents: i64,
    sold_at: DateTime<Utc>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            id: row.id,
            order_id: row.order_id,
            order_item_id: row.order_item_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: Money::from_cents(row.unit_price_cents),
            unit_cost: Money::from_cents(row.unit_cost_cents),
            revenue: Money::from_cents(row.revenue_cents),
            cost: Money::from_cents(row.cost_cents),
            profit: Money::from_cents(row.profit_cents),
            sold_at: row.sold_at,
        }
    }
}

const SALE_COLUMNS: &str = "id, order_id, order_item_id, product_id, quantity, \
     unit_price_cents, unit_cost_cents, revenue_cents, cost_cents, profit_cents, sold_at";

/// Read-only access to the sales ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Sale rows of one order, in item order.
    pub async fn sales_for_order(&self, order_id: &str) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {} FROM sales WHERE order_id = ?1 ORDER BY rowid",
            SALE_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }

    /// Sales with `from <= sold_at < to`, oldest first.
    pub async fn sales_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {} FROM sales WHERE sold_at >= ?1 AND sold_at < ?2 ORDER BY sold_at, rowid",
            SALE_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }
}

/// Snapshots costs, writes one sale per item and closes the order in memory.
///
/// Runs inside the Order Store's finalize transaction; the caller persists
/// `order` afterwards.
pub(crate) async fn record_finalization(
    conn: &mut SqliteConnection,
    order: &mut Order,
    now: DateTime<Utc>,
) -> DbResult<Vec<Sale>> {
    let product_ids: Vec<String> = order.items.iter().map(|i| i.product_id.clone()).collect();
    let products = load_products(conn, &product_ids).await?;
    let recipes = load_recipes(conn, &product_ids).await?;
    let costs = average_costs(conn, &recipes.ingredient_ids()).await?;

    let sales = snapshot_sales(order, &products, &recipes, &costs, now)?;
    finalize(order, now);

    for sale in &sales {
        insert_sale(conn, sale).await?;
    }

    let revenue: Money = sales.iter().map(|s| s.revenue).sum();
    let profit: Money = sales.iter().map(|s| s.profit).sum();
    info!(
        order_id = %order.id,
        items = sales.len(),
        revenue = %revenue,
        profit = %profit,
        "Sales recorded"
    );

    Ok(sales)
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(order_item_id = %sale.order_item_id, product_id = %sale.product_id, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, order_id, order_item_id, product_id, quantity,
            unit_price_cents, unit_cost_cents, revenue_cents, cost_cents, profit_cents,
            sold_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.order_id)
    .bind(&sale.order_item_id)
    .bind(&sale.product_id)
    .bind(sale.quantity)
    .bind(sale.unit_price.cents())
    .bind(sale.unit_cost.cents())
    .bind(sale.revenue.cents())
    .bind(sale.cost.cents())
    .bind(sale.profit.cents())
    .bind(sale.sold_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
