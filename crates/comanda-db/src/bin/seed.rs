//! # Demo Restaurant Seeder
//!
//! Loads a small restaurant into a database for local development: stocked
//! ingredients, a menu with recipes, and one finished table so the sales
//! ledger is not empty.
//!
//! ## Usage
//! ```bash
//! # Uses COMANDA_DB_PATH (default ./comanda.db)
//! cargo run -p comanda-db --bin seed
//!
//! # Explicit database path, skip the sample order
//! cargo run -p comanda-db --bin seed -- --db ./data/dev.db --no-order
//! ```
//!
//! Set `RUST_LOG=comanda_db=debug` to watch every stock movement.

use std::env;

use comanda_core::recipe::RecipeLine;
use comanda_core::{Money, OrderItemDraft, Quantity, StockUnit};
use comanda_db::{ComandaConfig, Database, DbConfig};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// (name, unit, minimum milli, [(purchased milli, total cents)])
const INGREDIENTS: &[(&str, StockUnit, i64, &[(i64, i64)])] = &[
    ("Mozzarella", StockUnit::Kilogram, 1_000, &[(5_000, 6_000), (3_000, 3_900)]),
    ("Pizza dough", StockUnit::Kilogram, 2_000, &[(10_000, 3_000)]),
    ("Tomato sauce", StockUnit::Liter, 500, &[(4_000, 1_600)]),
    ("Basil", StockUnit::Kilogram, 50, &[(200, 900)]),
    ("Lettuce", StockUnit::Unit, 3_000, &[(12_000, 1_080)]),
    ("Olive oil", StockUnit::Liter, 250, &[(2_000, 1_700)]),
    ("Lemon", StockUnit::Unit, 5_000, &[(30_000, 900)]),
];

/// (category, product, price cents, [(ingredient, milli)])
const MENU: &[(&str, &str, i64, &[(&str, i64)])] = &[
    (
        "Pizzas",
        "Margherita",
        1_050,
        &[
            ("Mozzarella", 120),
            ("Pizza dough", 250),
            ("Tomato sauce", 100),
            ("Basil", 5),
        ],
    ),
    (
        "Pizzas",
        "Marinara",
        850,
        &[("Pizza dough", 250), ("Tomato sauce", 120), ("Olive oil", 10)],
    ),
    (
        "Starters",
        "Green salad",
        650,
        &[("Lettuce", 500), ("Olive oil", 15), ("Lemon", 250)],
    ),
    ("Drinks", "Lemonade", 300, &[("Lemon", 1_000)]),
    ("Drinks", "Still water", 150, &[]),
];

/// Same filter convention as the rest of the workspace.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,comanda=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config = ComandaConfig::from_env()?;
    let mut sample_order = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.db = DbConfig::new(&args[i + 1])
                        .max_connections(config.db.max_connections);
                    i += 1;
                }
            }
            "--no-order" => sample_order = false,
            "--help" | "-h" => {
                println!("Comanda demo restaurant seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $COMANDA_DB_PATH or ./comanda.db)");
                println!("      --no-order     Do not run the sample table through to finalization");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Comanda demo restaurant seeder");
    println!("==============================");
    println!("Database: {}", config.db.database_path.display());
    println!();

    let db = Database::from_config(config).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.catalog().list_products(None).await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} products", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Ingredients and their purchase lots
    let inventory = db.inventory();
    let mut ingredient_ids = Vec::with_capacity(INGREDIENTS.len());
    for (name, unit, minimum, purchases) in INGREDIENTS {
        let ingredient = inventory
            .create_ingredient(name, *unit, Quantity::from_milli(*minimum))
            .await?;
        for (quantity, total) in purchases.iter() {
            inventory
                .record_purchase(
                    &ingredient.id,
                    Quantity::from_milli(*quantity),
                    Money::from_cents(*total),
                )
                .await?;
        }
        ingredient_ids.push((*name, ingredient.id));
    }
    println!("✓ {} ingredients stocked", ingredient_ids.len());

    // Menu
    let catalog = db.catalog();
    let mut category_ids: Vec<(&str, String)> = Vec::new();
    let mut product_ids: Vec<(&str, String)> = Vec::new();
    for (sort_order, (category, product, price, lines)) in MENU.iter().enumerate() {
        let category_id = match category_ids.iter().find(|(name, _)| name == category) {
            Some((_, id)) => id.clone(),
            None => {
                let created = catalog
                    .create_category(category, sort_order as i64)
                    .await?;
                category_ids.push((*category, created.id.clone()));
                created.id
            }
        };

        let created = catalog
            .create_product(product, Money::from_cents(*price), Some(&category_id))
            .await?;

        let recipe: Vec<RecipeLine> = lines
            .iter()
            .filter_map(|(ingredient, milli)| {
                ingredient_ids
                    .iter()
                    .find(|(name, _)| name == ingredient)
                    .map(|(_, id)| RecipeLine::new(id, Quantity::from_milli(*milli)))
            })
            .collect();
        catalog.set_recipe(&created.id, recipe).await?;

        product_ids.push((*product, created.id));
    }
    println!(
        "✓ {} products in {} categories",
        product_ids.len(),
        category_ids.len()
    );

    if sample_order {
        let find = |name: &str| {
            product_ids
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, id)| id.clone())
                .ok_or_else(|| format!("menu has no {}", name))
        };

        let orders = db.orders();
        let order = orders.create_order("T1", 3).await?;
        orders
            .update_order_items(
                &order.id,
                vec![
                    OrderItemDraft::new(find("Margherita")?, 2),
                    OrderItemDraft::new(find("Green salad")?, 1),
                    OrderItemDraft::new(find("Lemonade")?, 3),
                ],
            )
            .await?;
        orders.send_to_kitchen(&order.id).await?;
        orders.mark_ready(&order.id).await?;
        orders.acknowledge_served(&order.id).await?;
        orders.mark_paid(&order.id).await?;
        let done = orders.finalize(&order.id).await?;

        let revenue: Money = done.sales.iter().map(|s| s.revenue).sum();
        let profit: Money = done.sales.iter().map(|s| s.profit).sum();
        println!(
            "✓ Table T1 finalized: {} sales, revenue {}, profit {}",
            done.sales.len(),
            revenue,
            profit
        );
    }

    println!();
    let low = inventory.list_below_minimum().await?;
    if low.is_empty() {
        println!("All ingredients above minimum stock.");
    } else {
        for ingredient in low {
            println!(
                "⚠ {} below minimum: {} {}",
                ingredient.name,
                ingredient.stock,
                ingredient.unit.symbol()
            );
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
