//! Shared fixture for repository tests.

use comanda_core::recipe::RecipeLine;
use comanda_core::{Money, Order, OrderItemDraft, Quantity, StockUnit, StorePolicy};

use crate::pool::{Database, DbConfig};

/// A small kitchen on a fresh in-memory database.
///
/// ```text
/// Cheese  8 kg  @ 12.00/kg   min 1 kg
/// Dough  10 kg  @  3.00/kg   min 2 kg
/// Tomato  2 kg  @  5.00/kg   min 0.5 kg
///
/// Pizza 10.00  = cheese 0.1 + dough 0.25 + tomato 0.08
/// Salad  6.50  = tomato 0.15
/// ```
pub(crate) struct TestKitchen {
    pub db: Database,
    pub cheese: String,
    pub dough: String,
    pub tomato: String,
    pub pizza: String,
    pub salad: String,
}

impl TestKitchen {
    pub async fn new() -> Self {
        Self::with_policy(StorePolicy::default()).await
    }

    pub async fn with_policy(policy: StorePolicy) -> Self {
        let db = Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .with_policy(policy);

        let inventory = db.inventory();
        let mut stocked = Vec::new();
        for (name, minimum, units, total) in [
            ("Cheese", 1000, 8, 9600),
            ("Dough", 2000, 10, 3000),
            ("Tomato", 500, 2, 1000),
        ] {
            let ingredient = inventory
                .create_ingredient(name, StockUnit::Kilogram, Quantity::from_milli(minimum))
                .await
                .unwrap();
            inventory
                .record_purchase(
                    &ingredient.id,
                    Quantity::from_units(units),
                    Money::from_cents(total),
                )
                .await
                .unwrap();
            stocked.push(ingredient.id);
        }
        let (cheese, dough, tomato) = (stocked[0].clone(), stocked[1].clone(), stocked[2].clone());

        let catalog = db.catalog();
        let mains = catalog.create_category("Mains", 1).await.unwrap();

        let pizza = catalog
            .create_product("Pizza", Money::from_cents(1000), Some(&mains.id))
            .await
            .unwrap()
            .id;
        catalog
            .set_recipe(
                &pizza,
                vec![
                    RecipeLine::new(&cheese, Quantity::from_milli(100)),
                    RecipeLine::new(&dough, Quantity::from_milli(250)),
                    RecipeLine::new(&tomato, Quantity::from_milli(80)),
                ],
            )
            .await
            .unwrap();

        let salad = catalog
            .create_product("Salad", Money::from_cents(650), Some(&mains.id))
            .await
            .unwrap()
            .id;
        catalog
            .set_recipe(&salad, vec![RecipeLine::new(&tomato, Quantity::from_milli(150))])
            .await
            .unwrap();

        TestKitchen {
            db,
            cheese,
            dough,
            tomato,
            pizza,
            salad,
        }
    }

    /// Current stock, summed from the lots.
    pub async fn stock(&self, ingredient_id: &str) -> Quantity {
        self.db.inventory().compute_stock(ingredient_id).await.unwrap()
    }

    /// An order taken, sent, readied and served: ready to finalize.
    pub async fn served_order(&self, origin_id: &str, items: Vec<OrderItemDraft>) -> Order {
        let orders = self.db.orders();
        let order = orders.create_order(origin_id, 2).await.unwrap();
        orders.update_order_items(&order.id, items).await.unwrap();
        orders.send_to_kitchen(&order.id).await.unwrap();
        orders.mark_ready(&order.id).await.unwrap();
        orders.acknowledge_served(&order.id).await.unwrap();
        orders.get_order(&order.id).await.unwrap()
    }
}
