//! # Recipe Expander
//!
//! Turns order items into ingredient requirements and diffs two requirement
//! sets into the ledger movements an edit has to apply.
//!
//! ## Delta Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  current items ──► expand ──► old needs  ┐                              │
//! │                                          ├─► diff ──► [StockDelta]      │
//! │  proposed items ─► expand ──► new needs  ┘      │                       │
//! │                                                 ▼                       │
//! │                              change > 0  → ledger deduct(change)        │
//! │                              change < 0  → ledger restore(-change)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the difference ever reaches the ledger, so any sequence of edits
//! leaves the ledger holding exactly `expand(final items)` against the order.
//!
//! Needs are a `BTreeMap`, which gives the diff a stable ascending
//! ingredient order. The database layer takes ingredient locks in that order.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::{div_round_half_even, Money};
use crate::quantity::{Quantity, MILLI_PER_UNIT};
use crate::types::OrderItem;
use crate::MAX_RECIPE_QUANTITY;

/// Ingredient id → total quantity required.
pub type Needs = BTreeMap<String, Quantity>;

// =============================================================================
// Recipes
// =============================================================================

/// Quantity of one ingredient in one unit of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeLine {
    pub ingredient_id: String,
    pub quantity: Quantity,
}

impl RecipeLine {
    pub fn new(ingredient_id: impl Into<String>, quantity: Quantity) -> Self {
        RecipeLine {
            ingredient_id: ingredient_id.into(),
            quantity,
        }
    }
}

/// A product's recipe. An empty recipe means the product is not tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Recipe {
    pub product_id: String,
    pub lines: Vec<RecipeLine>,
}

impl Recipe {
    /// Builds a recipe, rejecting quantities outside
    /// `1..=MAX_RECIPE_QUANTITY` thousandths and ingredients listed twice.
    pub fn new(product_id: impl Into<String>, lines: Vec<RecipeLine>) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        for line in &lines {
            if !line.quantity.is_positive() {
                return Err(ValidationError::MustBePositive {
                    field: format!("recipe quantity for {}", line.ingredient_id),
                }
                .into());
            }
            if line.quantity.milli() > MAX_RECIPE_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: format!("recipe quantity for {}", line.ingredient_id),
                    min: 1,
                    max: MAX_RECIPE_QUANTITY,
                }
                .into());
            }
            if !seen.insert(line.ingredient_id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "ingredient_id".to_string(),
                    value: line.ingredient_id.clone(),
                }
                .into());
            }
        }

        Ok(Recipe {
            product_id: product_id.into(),
            lines,
        })
    }

    pub fn empty(product_id: impl Into<String>) -> Self {
        Recipe {
            product_id: product_id.into(),
            lines: Vec::new(),
        }
    }

    /// Cost of one unit of the product at the given per-unit ingredient
    /// costs, leaving out `excluded` ingredients.
    ///
    /// Ingredients missing from `costs` contribute nothing. The sum is
    /// rounded once, not per line.
    pub fn unit_cost(&self, excluded: &[String], costs: &HashMap<String, Money>) -> Money {
        let exact: i128 = self
            .lines
            .iter()
            .filter(|line| !excluded.contains(&line.ingredient_id))
            .filter_map(|line| {
                costs
                    .get(&line.ingredient_id)
                    .map(|cost| line.quantity.milli() as i128 * cost.cents() as i128)
            })
            .sum();

        Money::from_cents(div_round_half_even(exact, MILLI_PER_UNIT as i128) as i64)
    }
}

/// Recipes keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    recipes: HashMap<String, Recipe>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.product_id.clone(), recipe);
    }

    pub fn get(&self, product_id: &str) -> Option<&Recipe> {
        self.recipes.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Every ingredient id referenced by any recipe in the book.
    pub fn ingredient_ids(&self) -> Vec<String> {
        let ids: std::collections::BTreeSet<&str> = self
            .recipes
            .values()
            .flat_map(|r| r.lines.iter().map(|l| l.ingredient_id.as_str()))
            .collect();
        ids.into_iter().map(String::from).collect()
    }
}

impl FromIterator<Recipe> for RecipeBook {
    fn from_iter<I: IntoIterator<Item = Recipe>>(iter: I) -> Self {
        let mut book = RecipeBook::new();
        for recipe in iter {
            book.insert(recipe);
        }
        book
    }
}

// =============================================================================
// Expansion
// =============================================================================

/// Ingredient requirements of `items`.
///
/// Each recipe line not excluded on the item adds `line quantity × item
/// quantity`. Products without a recipe contribute nothing. Ingredients
/// that end up with a zero total are omitted.
pub fn expand(items: &[OrderItem], recipes: &RecipeBook) -> Needs {
    let mut needs = Needs::new();

    for item in items {
        let Some(recipe) = recipes.get(&item.product_id) else {
            continue;
        };
        for line in &recipe.lines {
            if item.is_excluded(&line.ingredient_id) {
                continue;
            }
            *needs.entry(line.ingredient_id.clone()).or_default() += line.quantity * item.quantity;
        }
    }

    needs.retain(|_, qty| !qty.is_zero());
    needs
}

/// Signed change in an ingredient requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockDelta {
    pub ingredient_id: String,
    /// Positive: more is needed (deduct). Negative: less is needed (restore).
    pub change: Quantity,
}

/// `new − old` for every ingredient in either map, ascending by ingredient
/// id, zero changes dropped.
pub fn diff(old: &Needs, new: &Needs) -> Vec<StockDelta> {
    let ids: std::collections::BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    ids.into_iter()
        .filter_map(|id| {
            let before = old.get(id).copied().unwrap_or_default();
            let after = new.get(id).copied().unwrap_or_default();
            let change = after - before;
            (!change.is_zero()).then(|| StockDelta {
                ingredient_id: id.clone(),
                change,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
