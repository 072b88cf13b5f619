//! # comanda-core: Pure Business Logic for Comanda
//!
//! This crate holds the restaurant order and inventory rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │      Callers (order-taking UI, kitchen display, takeaway)       │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │         comanda-db (Order Store, Lot Ledger, Sales)             │    │
//! │  │   locks + SQLite transactions around the rules below            │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ comanda-core (THIS CRATE) ★                     │    │
//! │  │                                                                 │    │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐   │    │
//! │  │   │ ledger  │ │ recipe  │ │  order  │ │  money  │ │ policy  │   │    │
//! │  │   │ LotBook │ │ expand  │ │  state  │ │quantity │ │         │   │    │
//! │  │   │  FIFO   │ │  diff   │ │ machine │ │         │ │         │   │    │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘   │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO CLOCK (callers pass `now`)          │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Ingredient, Lot, Product, Order, Sale)
//! - [`money`] - Money in integer cents
//! - [`quantity`] - Ingredient amounts in thousandths of a stock unit
//! - [`ledger`] - FIFO lot arithmetic and cached stock/cost fields
//! - [`recipe`] - Recipe expansion and requirement diffs
//! - [`order`] - Order state machine rules and sale snapshots
//! - [`policy`] - Oversell / missing-ingredient / takeaway policy
//! - [`error`] - Domain error types and caller-facing classification
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use comanda_core::quantity::Quantity;
//! use comanda_core::recipe::{diff, Needs};
//!
//! let mut before = Needs::new();
//! before.insert("cheese".to_string(), Quantity::from_milli(200));
//! let mut after = Needs::new();
//! after.insert("cheese".to_string(), Quantity::from_milli(300));
//!
//! // Going from 2 to 3 pizzas only deducts the extra 0.1 kg
//! let deltas = diff(&before, &after);
//! assert_eq!(deltas[0].change, Quantity::from_milli(100));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod order;
pub mod policy;
pub mod quantity;
pub mod recipe;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use policy::{MissingIngredientPolicy, OversellPolicy, StorePolicy};
pub use quantity::Quantity;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum portions on a single order line.
///
/// ## Business Reason
/// Catches typos (1000 instead of 10) before they drain the ledger.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum guests recorded on one order.
pub const MAX_GUEST_COUNT: i64 = 500;

/// Largest quantity one recipe line may call for per portion, in
/// thousandths of the stock unit (1000 units).
///
/// Keeps `line quantity × MAX_ITEM_QUANTITY` summed over an order far
/// inside `i64`.
pub const MAX_RECIPE_QUANTITY: i64 = 1_000_000;

pub const MAX_NAME_LENGTH: usize = 200;

pub const MAX_COMMENT_LENGTH: usize = 500;
