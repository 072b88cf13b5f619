//! # Inventory Repository (Lot Ledger)
//!
//! Ingredients, their purchase lots and every stock movement.
//!
//! ## Who May Move Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_purchase   ← public, inventory screens                          │
//! │  apply_deltas      ← crate-only, called by the Order Store inside its   │
//! │                      transaction (deduct on +, restore on −)            │
//! │                                                                         │
//! │  Everything else here is read-only.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Write Path
//! Every mutation loads a [`LotBook`], applies one operation to it and
//! writes the whole book back: each lot row plus the ingredient's cached
//! `stock`, `average_cost_cents` and `below_minimum_since`. Caches are
//! therefore always what the lots say they are.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::locks::{LockKey, LockRegistry};
use comanda_core::ledger::LotBook;
use comanda_core::recipe::StockDelta;
use comanda_core::validation::{
    validate_name, validate_non_negative_quantity, validate_positive_quantity, validate_price,
};
use comanda_core::{
    CoreError, Ingredient, Lot, LotDetail, MissingIngredientPolicy, Money, Quantity, StockUnit,
    StorePolicy,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct IngredientRow {
    id: String,
    name: String,
    unit: StockUnit,
    minimum_stock: i64,
    stock: i64,
    average_cost_cents: i64,
    below_minimum_since: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Ingredient {
            id: row.id,
            name: row.name,
            unit: row.unit,
            minimum_stock: Quantity::from_milli(row.minimum_stock),
            stock: Quantity::from_milli(row.stock),
            average_cost: Money::from_cents(row.average_cost_cents),
            below_minimum_since: row.below_minimum_since,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LotRow {
    id: String,
    ingredient_id: String,
    initial_quantity: i64,
    remaining_quantity: i64,
    unit_cost_cents: i64,
    purchased_at: DateTime<Utc>,
}

impl From<LotRow> for Lot {
    fn from(row: LotRow) -> Self {
        Lot {
            id: row.id,
            ingredient_id: row.ingredient_id,
            initial_quantity: Quantity::from_milli(row.initial_quantity),
            remaining_quantity: Quantity::from_milli(row.remaining_quantity),
            unit_cost: Money::from_cents(row.unit_cost_cents),
            purchased_at: row.purchased_at,
        }
    }
}

const INGREDIENT_COLUMNS: &str = "id, name, unit, minimum_stock, stock, average_cost_cents, \
     below_minimum_since, created_at, updated_at";

const LOT_COLUMNS: &str =
    "id, ingredient_id, initial_quantity, remaining_quantity, unit_cost_cents, purchased_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for ingredient and lot operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
    locks: Arc<LockRegistry>,
    policy: StorePolicy,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool, locks: Arc<LockRegistry>, policy: StorePolicy) -> Self {
        InventoryRepository {
            pool,
            locks,
            policy,
        }
    }

    /// Registers an ingredient with no lots (and therefore no stock).
    pub async fn create_ingredient(
        &self,
        name: &str,
        unit: StockUnit,
        minimum_stock: Quantity,
    ) -> DbResult<Ingredient> {
        validate_name("ingredient name", name).map_err(CoreError::from)?;
        validate_non_negative_quantity("minimum_stock", minimum_stock).map_err(CoreError::from)?;

        let now = Utc::now();
        let mut book = LotBook::new(
            Ingredient {
                id: Uuid::new_v4().to_string(),
                name: name.trim().to_string(),
                unit,
                minimum_stock,
                stock: Quantity::zero(),
                average_cost: Money::zero(),
                below_minimum_since: None,
                created_at: now,
                updated_at: now,
            },
            Vec::new(),
        );
        book.refresh(now);
        let (ingredient, _) = book.into_parts();

        debug!(id = %ingredient.id, name = %ingredient.name, "Creating ingredient");

        sqlx::query(
            r#"
            INSERT INTO ingredients (
                id, name, unit, minimum_stock, stock, average_cost_cents,
                below_minimum_since, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(ingredient.unit)
        .bind(ingredient.minimum_stock.milli())
        .bind(ingredient.stock.milli())
        .bind(ingredient.average_cost.cents())
        .bind(ingredient.below_minimum_since)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &ingredient.name),
            other => other,
        })?;

        Ok(ingredient)
    }

    pub async fn get_ingredient(&self, id: &str) -> DbResult<Option<Ingredient>> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {} FROM ingredients WHERE id = ?1",
            INGREDIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Ingredient::from))
    }

    /// Every ingredient with `stock` and `average_cost` computed from its
    /// lots, ordered by name.
    pub async fn list_ingredients_with_computed_stock(&self) -> DbResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {} FROM ingredients ORDER BY name",
            INGREDIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let lots = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM ingredient_lots ORDER BY purchased_at, rowid",
            LOT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut by_ingredient: HashMap<String, Vec<Lot>> = HashMap::new();
        for lot in lots {
            by_ingredient
                .entry(lot.ingredient_id.clone())
                .or_default()
                .push(Lot::from(lot));
        }

        Ok(ingredients
            .into_iter()
            .map(|row| {
                let mut ingredient = Ingredient::from(row);
                let lots = by_ingredient.remove(&ingredient.id).unwrap_or_default();
                let book = LotBook::new(ingredient.clone(), lots);
                ingredient.stock = book.stock();
                ingredient.average_cost = book.average_cost();
                ingredient
            })
            .collect())
    }

    /// Σ remaining across the ingredient's lots.
    pub async fn compute_stock(&self, ingredient_id: &str) -> DbResult<Quantity> {
        let mut conn = self.pool.acquire().await?;
        let book = require_book(&mut conn, ingredient_id).await?;
        Ok(book.stock())
    }

    /// Weighted average unit cost over lots with stock; the last known
    /// average when all are empty; zero if never purchased.
    pub async fn compute_average_cost(&self, ingredient_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        let book = require_book(&mut conn, ingredient_id).await?;
        Ok(book.average_cost())
    }

    /// The ingredient and its lots, oldest first.
    pub async fn get_lot_detail(&self, ingredient_id: &str) -> DbResult<LotDetail> {
        let mut conn = self.pool.acquire().await?;
        let (ingredient, lots) = require_book(&mut conn, ingredient_id).await?.into_parts();
        Ok(LotDetail { ingredient, lots })
    }

    /// Ingredients at or below their minimum, longest-standing first.
    pub async fn list_below_minimum(&self) -> DbResult<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {} FROM ingredients WHERE below_minimum_since IS NOT NULL \
             ORDER BY below_minimum_since, name",
            INGREDIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    /// Appends a lot bought now for `total_price`.
    ///
    /// ## Arguments
    /// * `quantity` - Must be positive
    /// * `total_price` - Whole lot price; `unit_cost = total_price / quantity`
    pub async fn record_purchase(
        &self,
        ingredient_id: &str,
        quantity: Quantity,
        total_price: Money,
    ) -> DbResult<Lot> {
        validate_positive_quantity("quantity", quantity).map_err(CoreError::from)?;
        validate_price("total_price", total_price).map_err(CoreError::from)?;

        let _locks = self
            .locks
            .acquire(
                [LockKey::Ingredient(ingredient_id.to_string())],
                self.policy.lock_timeout,
            )
            .await?;

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let mut book = require_book(&mut tx, ingredient_id).await?;
        let lot = book.record_purchase(quantity, total_price, now)?;
        save_book(&mut tx, &book).await?;

        tx.commit().await?;

        info!(
            ingredient_id = %ingredient_id,
            quantity = %quantity,
            unit_cost = %lot.unit_cost,
            stock = %book.stock(),
            "Purchase recorded"
        );
        Ok(lot)
    }

    /// Changes the low-stock threshold and re-evaluates the flag.
    pub async fn set_minimum_stock(
        &self,
        ingredient_id: &str,
        minimum_stock: Quantity,
    ) -> DbResult<Ingredient> {
        validate_non_negative_quantity("minimum_stock", minimum_stock).map_err(CoreError::from)?;

        let _locks = self
            .locks
            .acquire(
                [LockKey::Ingredient(ingredient_id.to_string())],
                self.policy.lock_timeout,
            )
            .await?;

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let (mut ingredient, lots) = require_book(&mut tx, ingredient_id).await?.into_parts();
        ingredient.minimum_stock = minimum_stock;
        let mut book = LotBook::new(ingredient, lots);
        book.refresh(now);

        sqlx::query("UPDATE ingredients SET minimum_stock = ?1 WHERE id = ?2")
            .bind(minimum_stock.milli())
            .bind(ingredient_id)
            .execute(&mut *tx)
            .await?;
        save_book(&mut tx, &book).await?;

        tx.commit().await?;

        Ok(book.into_parts().0)
    }
}

// =============================================================================
// Ledger Internals
// =============================================================================

/// What a batch of deltas did to the ledger.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct LedgerReport {
    /// Ingredients a recipe referenced that no longer exist.
    pub skipped: Vec<String>,
    /// Ingredients deducted past their stock (policy `Allow` only).
    pub oversold: Vec<String>,
}

pub(crate) async fn load_book(
    conn: &mut SqliteConnection,
    ingredient_id: &str,
) -> DbResult<Option<LotBook>> {
    let Some(row) = sqlx::query_as::<_, IngredientRow>(&format!(
        "SELECT {} FROM ingredients WHERE id = ?1",
        INGREDIENT_COLUMNS
    ))
    .bind(ingredient_id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let lots = sqlx::query_as::<_, LotRow>(&format!(
        "SELECT {} FROM ingredient_lots WHERE ingredient_id = ?1 ORDER BY purchased_at, rowid",
        LOT_COLUMNS
    ))
    .bind(ingredient_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(LotBook::new(
        Ingredient::from(row),
        lots.into_iter().map(Lot::from).collect(),
    )))
}

async fn require_book(conn: &mut SqliteConnection, ingredient_id: &str) -> DbResult<LotBook> {
    load_book(conn, ingredient_id)
        .await?
        .ok_or_else(|| CoreError::IngredientNotFound(ingredient_id.to_string()).into())
}

/// Writes every lot and the ingredient's cached fields.
pub(crate) async fn save_book(conn: &mut SqliteConnection, book: &LotBook) -> DbResult<()> {
    for lot in book.lots() {
        sqlx::query(
            r#"
            INSERT INTO ingredient_lots (
                id, ingredient_id, initial_quantity, remaining_quantity,
                unit_cost_cents, purchased_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                initial_quantity = excluded.initial_quantity,
                remaining_quantity = excluded.remaining_quantity
            "#,
        )
        .bind(&lot.id)
        .bind(&lot.ingredient_id)
        .bind(lot.initial_quantity.milli())
        .bind(lot.remaining_quantity.milli())
        .bind(lot.unit_cost.cents())
        .bind(lot.purchased_at)
        .execute(&mut *conn)
        .await?;
    }

    let ingredient = book.ingredient();
    sqlx::query(
        r#"
        UPDATE ingredients
        SET stock = ?1, average_cost_cents = ?2, below_minimum_since = ?3, updated_at = ?4
        WHERE id = ?5
        "#,
    )
    .bind(ingredient.stock.milli())
    .bind(ingredient.average_cost.cents())
    .bind(ingredient.below_minimum_since)
    .bind(ingredient.updated_at)
    .bind(&ingredient.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Applies recipe deltas inside the caller's transaction.
///
/// The caller must already hold the ingredient locks for every delta.
/// `context` names the order for log lines.
pub(crate) async fn apply_deltas(
    conn: &mut SqliteConnection,
    deltas: &[StockDelta],
    policy: &StorePolicy,
    context: &str,
    now: DateTime<Utc>,
) -> DbResult<LedgerReport> {
    let mut report = LedgerReport::default();

    for delta in deltas {
        let Some(mut book) = load_book(conn, &delta.ingredient_id).await? else {
            match policy.missing_ingredient {
                MissingIngredientPolicy::SkipAndLog => {
                    warn!(
                        order_id = %context,
                        ingredient_id = %delta.ingredient_id,
                        change = %delta.change,
                        "Recipe references unknown ingredient, stock movement skipped"
                    );
                    report.skipped.push(delta.ingredient_id.clone());
                    continue;
                }
                MissingIngredientPolicy::Abort => {
                    return Err(CoreError::IngredientNotFound(delta.ingredient_id.clone()).into());
                }
            }
        };

        if delta.change.is_positive() {
            let deduction = book.deduct(delta.change, policy.oversell, now)?;
            if deduction.is_oversold() {
                warn!(
                    order_id = %context,
                    ingredient_id = %delta.ingredient_id,
                    requested = %deduction.requested,
                    applied = %deduction.applied,
                    shortfall = %deduction.shortfall,
                    "Oversold: lots exhausted"
                );
                report.oversold.push(delta.ingredient_id.clone());
            }
        } else {
            let restoration = book.restore(-delta.change, now)?;
            if restoration.overflow.is_positive() {
                warn!(
                    order_id = %context,
                    ingredient_id = %delta.ingredient_id,
                    requested = %restoration.requested,
                    overflow = %restoration.overflow,
                    opened_lot = restoration.opened_lot,
                    "Returned stock exceeded lot headroom"
                );
            }
        }

        save_book(conn, &book).await?;
        debug!(
            order_id = %context,
            ingredient_id = %delta.ingredient_id,
            change = %delta.change,
            stock = %book.stock(),
            "Stock moved"
        );
    }

    Ok(report)
}

/// Current average unit cost of each ingredient, computed from its lots.
/// Unknown ingredients are absent.
pub(crate) async fn average_costs(
    conn: &mut SqliteConnection,
    ingredient_ids: &[String],
) -> DbResult<HashMap<String, Money>> {
    let mut costs = HashMap::with_capacity(ingredient_ids.len());
    for id in ingredient_ids {
        if let Some(book) = load_book(conn, id).await? {
            costs.insert(id.clone(), book.average_cost());
        }
    }
    Ok(costs)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestKitchen;
    use comanda_core::{ErrorKind, OversellPolicy};

    fn delta(id: &str, milli: i64) -> StockDelta {
        StockDelta {
            ingredient_id: id.to_string(),
            change: Quantity::from_milli(milli),
        }
    }

    /// Cheese with lots (5 @ 10, t1) and (5 @ 20, t2), no other stock.
    async fn two_lot_cheese(kitchen: &TestKitchen) -> String {
        let inventory = kitchen.db.inventory();
        let id = inventory
            .create_ingredient("Aged Cheese", StockUnit::Kilogram, Quantity::zero())
            .await
            .unwrap()
            .id;
        inventory
            .record_purchase(&id, Quantity::from_units(5), Money::from_cents(50))
            .await
            .unwrap();
        // Distinct purchase instants
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        inventory
            .record_purchase(&id, Quantity::from_units(5), Money::from_cents(100))
            .await
            .unwrap();
        id
    }

    async fn apply(kitchen: &TestKitchen, deltas: &[StockDelta], policy: &StorePolicy) -> DbResult<LedgerReport> {
        let mut tx = kitchen.db.pool().begin().await.unwrap();
        let report = apply_deltas(&mut tx, deltas, policy, "test", Utc::now()).await?;
        tx.commit().await.unwrap();
        Ok(report)
    }

    #[tokio::test]
    async fn test_record_purchase_updates_cache() {
        let kitchen = TestKitchen::new().await;
        let inventory = kitchen.db.inventory();

        let lot = inventory
            .record_purchase(&kitchen.tomato, Quantity::from_units(2), Money::from_cents(700))
            .await
            .unwrap();
        assert_eq!(lot.unit_cost, Money::from_cents(350));

        let detail = inventory.get_lot_detail(&kitchen.tomato).await.unwrap();
        assert_eq!(detail.lots.len(), 2);
        assert_eq!(detail.ingredient.stock, inventory.compute_stock(&kitchen.tomato).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_purchase_validation() {
        let kitchen = TestKitchen::new().await;
        let inventory = kitchen.db.inventory();

        let err = inventory
            .record_purchase(&kitchen.tomato, Quantity::zero(), Money::from_cents(100))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = inventory
            .record_purchase("nope", Quantity::from_units(1), Money::from_cents(100))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_fifo_deduct_and_average() {
        let kitchen = TestKitchen::new().await;
        let cheese = two_lot_cheese(&kitchen).await;

        apply(&kitchen, &[delta(&cheese, 7000)], &StorePolicy::default())
            .await
            .unwrap();

        let detail = kitchen.db.inventory().get_lot_detail(&cheese).await.unwrap();
        assert_eq!(detail.lots[0].remaining_quantity, Quantity::zero());
        assert_eq!(detail.lots[1].remaining_quantity, Quantity::from_units(3));
        assert_eq!(
            kitchen.db.inventory().compute_average_cost(&cheese).await.unwrap(),
            Money::from_cents(20)
        );
        assert_eq!(detail.ingredient.average_cost, Money::from_cents(20));
    }

    #[tokio::test]
    async fn test_return_replenishes_newest_first() {
        let kitchen = TestKitchen::new().await;
        let cheese = two_lot_cheese(&kitchen).await;
        let policy = StorePolicy::default();

        apply(&kitchen, &[delta(&cheese, 7000)], &policy).await.unwrap();
        apply(&kitchen, &[delta(&cheese, -2000)], &policy).await.unwrap();

        let detail = kitchen.db.inventory().get_lot_detail(&cheese).await.unwrap();
        assert_eq!(detail.lots[0].remaining_quantity, Quantity::zero());
        assert_eq!(detail.lots[1].remaining_quantity, Quantity::from_units(5));

        apply(&kitchen, &[delta(&cheese, -5000)], &policy).await.unwrap();

        let detail = kitchen.db.inventory().get_lot_detail(&cheese).await.unwrap();
        assert_eq!(detail.lots[0].remaining_quantity, Quantity::from_units(5));
        assert_eq!(detail.lots[1].remaining_quantity, Quantity::from_units(5));
    }

    #[tokio::test]
    async fn test_oversell_policy() {
        let kitchen = TestKitchen::new().await;
        let cheese = two_lot_cheese(&kitchen).await;

        let strict = StorePolicy::default().with_oversell(OversellPolicy::Reject);
        let err = apply(&kitchen, &[delta(&cheese, 11_000)], &strict)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

        let report = apply(&kitchen, &[delta(&cheese, 11_000)], &StorePolicy::default())
            .await
            .unwrap();
        assert_eq!(report.oversold, vec![cheese.clone()]);
        assert_eq!(
            kitchen.db.inventory().compute_stock(&cheese).await.unwrap(),
            Quantity::zero()
        );
        // Cost history survives the stockout
        assert_eq!(
            kitchen.db.inventory().compute_average_cost(&cheese).await.unwrap(),
            Money::from_cents(15)
        );
    }

    #[tokio::test]
    async fn test_missing_ingredient_policy() {
        let kitchen = TestKitchen::new().await;

        let report = apply(
            &kitchen,
            &[delta("ghost", 100), delta(&kitchen.dough, 100)],
            &StorePolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(report.skipped, vec!["ghost".to_string()]);

        let strict = StorePolicy::default().with_missing_ingredient(MissingIngredientPolicy::Abort);
        let err = apply(&kitchen, &[delta("ghost", 100)], &strict)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_below_minimum_tracking() {
        let kitchen = TestKitchen::new().await;
        let inventory = kitchen.db.inventory();
        let policy = StorePolicy::default();

        let basil = inventory
            .create_ingredient("Basil", StockUnit::Kilogram, Quantity::from_units(1))
            .await
            .unwrap();
        // No stock yet: already at/below the minimum
        assert!(basil.is_below_minimum());

        inventory
            .record_purchase(&basil.id, Quantity::from_units(3), Money::from_cents(900))
            .await
            .unwrap();
        let basil = inventory.get_ingredient(&basil.id).await.unwrap().unwrap();
        assert!(!basil.is_below_minimum());

        apply(&kitchen, &[delta(&basil.id, 2500)], &policy).await.unwrap();
        let first = inventory
            .get_ingredient(&basil.id)
            .await
            .unwrap()
            .unwrap()
            .below_minimum_since;
        assert!(first.is_some());

        apply(&kitchen, &[delta(&basil.id, 100)], &policy).await.unwrap();
        let second = inventory
            .get_ingredient(&basil.id)
            .await
            .unwrap()
            .unwrap()
            .below_minimum_since;
        assert_eq!(first, second);

        let low = inventory.list_below_minimum().await.unwrap();
        assert!(low.iter().any(|i| i.id == basil.id));

        apply(&kitchen, &[delta(&basil.id, -2600)], &policy).await.unwrap();
        let basil = inventory.get_ingredient(&basil.id).await.unwrap().unwrap();
        assert_eq!(basil.below_minimum_since, None);
    }

    #[tokio::test]
    async fn test_set_minimum_stock_reevaluates_flag() {
        let kitchen = TestKitchen::new().await;
        let inventory = kitchen.db.inventory();

        // Cheese holds 8 kg in the fixture
        let cheese = inventory
            .set_minimum_stock(&kitchen.cheese, Quantity::from_units(10))
            .await
            .unwrap();
        assert!(cheese.is_below_minimum());

        let cheese = inventory
            .set_minimum_stock(&kitchen.cheese, Quantity::from_units(1))
            .await
            .unwrap();
        assert!(!cheese.is_below_minimum());
    }

    #[tokio::test]
    async fn test_list_with_computed_stock() {
        let kitchen = TestKitchen::new().await;
        let list = kitchen
            .db
            .inventory()
            .list_ingredients_with_computed_stock()
            .await
            .unwrap();

        let cheese = list.iter().find(|i| i.id == kitchen.cheese).unwrap();
        assert_eq!(cheese.stock, Quantity::from_units(8));
        assert_eq!(list.len(), 3);
    }
}
