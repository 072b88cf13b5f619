//! # Repository Module
//!
//! Database repository implementations for Comanda.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderRepository (Order Store)                                          │
//! │  ├── orders, order_items                                                │
//! │  ├── ──► inventory::apply_deltas   lots + ingredient cache              │
//! │  └── ──► sale::record_finalization sales                                │
//! │                                                                         │
//! │  InventoryRepository (Lot Ledger)                                       │
//! │  └── ingredients, ingredient_lots  (purchases, minimum stock)           │
//! │                                                                         │
//! │  CatalogRepository                                                      │
//! │  └── categories, products, recipe_lines                                 │
//! │                                                                         │
//! │  SaleRepository (Sales Recorder)                                        │
//! │  └── read-only; rows are written only from finalize                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Recipe-driven stock movement has no public entry point outside the Order
//! Store: the ledger's delta functions are `pub(crate)` and take the caller's
//! transaction.
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`] - Categories, products, recipes
//! - [`InventoryRepository`] - Ingredients and their lots
//! - [`OrderRepository`] - Order lifecycle
//! - [`SaleRepository`] - Sales ledger reads

pub mod catalog;
pub mod inventory;
pub mod order;
pub mod sale;

pub use catalog::CatalogRepository;
pub use inventory::InventoryRepository;
pub use order::{Finalization, OrderRepository};
pub use sale::SaleRepository;
