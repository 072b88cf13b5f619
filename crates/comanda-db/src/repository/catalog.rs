//! # Catalog Repository
//!
//! Categories, products and recipes. Reference data: the Order Store only
//! ever reads it.
//!
//! ## Recipe Storage
//! ```text
//! recipe_lines
//! ┌────────────┬───────────────┬──────────┬──────────┐
//! │ product_id │ ingredient_id │ quantity │ position │
//! ├────────────┼───────────────┼──────────┼──────────┤
//! │ pizza      │ cheese        │      100 │        0 │   0.1 kg per pizza
//! │ pizza      │ dough         │      250 │        1 │
//! └────────────┴───────────────┴──────────┴──────────┘
//! ```
//! `set_recipe` replaces all lines of a product in one transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::recipe::{Recipe, RecipeBook, RecipeLine};
use comanda_core::validation::{validate_name, validate_price};
use comanda_core::{Category, CoreError, Money, Product, ProductStatus, Quantity};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    sort_order: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_cents: i64,
    category_id: Option<String>,
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: Money::from_cents(row.price_cents),
            category_id: row.category_id,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeLineRow {
    product_id: String,
    ingredient_id: String,
    quantity: i64,
}

const PRODUCT_COLUMNS: &str =
    "id, name, price_cents, category_id, status, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub async fn create_category(&self, name: &str, sort_order: i64) -> DbResult<Category> {
        validate_name("category name", name).map_err(CoreError::from)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            sort_order,
        };
        debug!(id = %category.id, name = %category.name, "Creating category");

        sqlx::query("INSERT INTO categories (id, name, sort_order) VALUES (?1, ?2, ?3)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.sort_order)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &category.name),
                other => other,
            })?;

        Ok(category)
    }

    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, sort_order FROM categories ORDER BY sort_order, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Adds a product to the menu as `available` with an empty recipe.
    pub async fn create_product(
        &self,
        name: &str,
        price: Money,
        category_id: Option<&str>,
    ) -> DbResult<Product> {
        validate_name("product name", name).map_err(CoreError::from)?;
        validate_price("price", price).map_err(CoreError::from)?;

        if let Some(category_id) = category_id {
            let exists: Option<String> =
                sqlx::query_scalar("SELECT id FROM categories WHERE id = ?1")
                    .bind(category_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Category", category_id));
            }
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            price,
            category_id: category_id.map(String::from),
            status: ProductStatus::Available,
            created_at: now,
            updated_at: now,
        };
        debug!(id = %product.id, name = %product.name, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, category_id, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(&product.category_id)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Products ordered by name, optionally limited to one category.
    pub async fn list_products(&self, category_id: Option<&str>) -> DbResult<Vec<Product>> {
        let rows = match category_id {
            Some(category_id) => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {} FROM products WHERE category_id = ?1 ORDER BY name",
                    PRODUCT_COLUMNS
                ))
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {} FROM products ORDER BY name",
                    PRODUCT_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Changes availability. Items already on orders are unaffected.
    pub async fn set_product_status(&self, id: &str, status: ProductStatus) -> DbResult<Product> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE products SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        info!(product_id = %id, status = status.as_str(), "Product status changed");

        self.get_product(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    // -------------------------------------------------------------------------
    // Recipes
    // -------------------------------------------------------------------------

    /// Replaces a product's recipe.
    ///
    /// Refused while an `active` or `pending_validation` order holds the
    /// product: that order's deducted stock was computed from the current
    /// recipe and is returned by the same recipe on edit or cancel.
    pub async fn set_recipe(&self, product_id: &str, lines: Vec<RecipeLine>) -> DbResult<Recipe> {
        let recipe = Recipe::new(product_id, lines)?;

        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        let holder: Option<String> = sqlx::query_scalar(
            r#"
            SELECT o.id FROM order_items i
            JOIN orders o ON o.id = i.order_id
            WHERE i.product_id = ?1 AND o.status IN ('active', 'pending_validation')
            LIMIT 1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(order_id) = holder {
            return Err(CoreError::invalid_state(
                order_id,
                format!("holds product {} whose recipe is being replaced", product_id),
            )
            .into());
        }

        for line in &recipe.lines {
            let known: Option<String> =
                sqlx::query_scalar("SELECT id FROM ingredients WHERE id = ?1")
                    .bind(&line.ingredient_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if known.is_none() {
                return Err(CoreError::IngredientNotFound(line.ingredient_id.clone()).into());
            }
        }

        sqlx::query("DELETE FROM recipe_lines WHERE product_id = ?1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        for (position, line) in recipe.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recipe_lines (product_id, ingredient_id, quantity, position)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(product_id)
            .bind(&line.ingredient_id)
            .bind(line.quantity.milli())
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(product_id = %product_id, lines = recipe.lines.len(), "Recipe replaced");
        Ok(recipe)
    }

    /// A product's recipe; empty when none was set.
    pub async fn get_recipe(&self, product_id: &str) -> DbResult<Recipe> {
        if self.get_product(product_id).await?.is_none() {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        let mut conn = self.pool.acquire().await?;
        let book = load_recipes(&mut conn, &[product_id.to_string()]).await?;

        Ok(book
            .get(product_id)
            .cloned()
            .unwrap_or_else(|| Recipe::empty(product_id)))
    }
}

// =============================================================================
// Shared Loaders
// =============================================================================

/// Recipes for the given products. Products without lines are absent.
pub(crate) async fn load_recipes(
    conn: &mut SqliteConnection,
    product_ids: &[String],
) -> DbResult<RecipeBook> {
    if product_ids.is_empty() {
        return Ok(RecipeBook::new());
    }

    let rows = sqlx::query_as::<_, RecipeLineRow>(
        r#"
        SELECT product_id, ingredient_id, quantity
        FROM recipe_lines
        WHERE product_id IN (SELECT value FROM json_each(?1))
        ORDER BY product_id, position
        "#,
    )
    .bind(serde_json::to_string(product_ids)?)
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: HashMap<String, Vec<RecipeLine>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.product_id)
            .or_default()
            .push(RecipeLine::new(row.ingredient_id, Quantity::from_milli(row.quantity)));
    }

    // Rows were validated on write; rebuild without re-checking.
    Ok(grouped
        .into_iter()
        .map(|(product_id, lines)| Recipe { product_id, lines })
        .collect())
}

/// Products by id. Unknown ids are absent from the map.
pub(crate) async fn load_products(
    conn: &mut SqliteConnection,
    product_ids: &[String],
) -> DbResult<HashMap<String, Product>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {} FROM products WHERE id IN (SELECT value FROM json_each(?1))",
        PRODUCT_COLUMNS
    ))
    .bind(serde_json::to_string(product_ids)?)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.id.clone(), Product::from(row)))
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::test_support::TestKitchen;
    use comanda_core::recipe::RecipeLine;
    use comanda_core::{ErrorKind, Money, OrderItemDraft, ProductStatus, Quantity};

    #[tokio::test]
    async fn test_create_and_list_products() {
        let kitchen = TestKitchen::new().await;
        let catalog = kitchen.db.catalog();

        let drinks = catalog.create_category("Drinks", 2).await.unwrap();
        catalog
            .create_product("Lemonade", Money::from_cents(300), Some(&drinks.id))
            .await
            .unwrap();

        let in_drinks = catalog.list_products(Some(&drinks.id)).await.unwrap();
        assert_eq!(in_drinks.len(), 1);
        assert_eq!(in_drinks[0].name, "Lemonade");

        // Pizza and Salad from the fixture plus Lemonade
        assert_eq!(catalog.list_products(None).await.unwrap().len(), 3);

        let categories = catalog.list_categories().await.unwrap();
        assert!(categories.iter().any(|c| c.name == "Drinks"));
    }

    #[tokio::test]
    async fn test_duplicate_category_rejected() {
        let kitchen = TestKitchen::new().await;
        let catalog = kitchen.db.catalog();

        catalog.create_category("Desserts", 1).await.unwrap();
        let err = catalog.create_category("Desserts", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let kitchen = TestKitchen::new().await;
        let err = kitchen
            .db
            .catalog()
            .create_product("Ghost", Money::from_cents(100), Some("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_set_recipe_replaces_lines() {
        let kitchen = TestKitchen::new().await;
        let catalog = kitchen.db.catalog();

        let recipe = catalog
            .set_recipe(
                &kitchen.pizza,
                vec![RecipeLine::new(&kitchen.cheese, Quantity::from_milli(150))],
            )
            .await
            .unwrap();
        assert_eq!(recipe.lines.len(), 1);

        let stored = catalog.get_recipe(&kitchen.pizza).await.unwrap();
        assert_eq!(stored.lines, recipe.lines);
    }

    #[tokio::test]
    async fn test_set_recipe_rejects_unknown_ingredient() {
        let kitchen = TestKitchen::new().await;
        let err = kitchen
            .db
            .catalog()
            .set_recipe(
                &kitchen.pizza,
                vec![RecipeLine::new("unobtainium", Quantity::from_milli(1))],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // Original recipe untouched
        let recipe = kitchen.db.catalog().get_recipe(&kitchen.pizza).await.unwrap();
        assert!(!recipe.lines.is_empty());
    }

    #[tokio::test]
    async fn test_set_recipe_rejects_oversized_line() {
        let kitchen = TestKitchen::new().await;
        let err = kitchen
            .db
            .catalog()
            .set_recipe(
                &kitchen.salad,
                vec![RecipeLine::new(&kitchen.tomato, Quantity::from_milli(i64::MAX / 100))],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        // Salad still orderable at full quantity on the old recipe
        let order = kitchen.db.orders().create_order("T1", 1).await.unwrap();
        kitchen
            .db
            .orders()
            .update_order_items(&order.id, vec![OrderItemDraft::new(&kitchen.salad, 10)])
            .await
            .unwrap();
        assert_eq!(kitchen.stock(&kitchen.tomato).await, Quantity::from_milli(500));
    }

    #[tokio::test]
    async fn test_product_status() {
        let kitchen = TestKitchen::new().await;
        let product = kitchen
            .db
            .catalog()
            .set_product_status(&kitchen.salad, ProductStatus::TemporarilyUnavailable)
            .await
            .unwrap();
        assert!(!product.is_available());

        let err = kitchen
            .db
            .catalog()
            .set_product_status("missing", ProductStatus::Available)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_empty_recipe_for_untracked_product() {
        let kitchen = TestKitchen::new().await;
        let water = kitchen
            .db
            .catalog()
            .create_product("Water", Money::from_cents(150), None)
            .await
            .unwrap();

        let recipe = kitchen.db.catalog().get_recipe(&water.id).await.unwrap();
        assert!(recipe.lines.is_empty());
    }
}
