//! # comanda-db: Persistence and Transactional Components
//!
//! SQLite storage for Comanda, plus the three components that must be
//! transactional: the Lot Ledger, the Order Store and the Sales Recorder.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Data Flow                                │
//! │                                                                         │
//! │  Waiter UI / kitchen display / takeaway form  (out of scope)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                   comanda-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │  ┌────────────┐   ┌──────────────────┐   ┌──────────────────┐   │    │
//! │  │  │  Database  │   │   Repositories   │   │    Migrations    │   │    │
//! │  │  │  (pool.rs) │   │  catalog         │   │    (embedded)    │   │    │
//! │  │  │            │◄──│  inventory       │   │                  │   │    │
//! │  │  │ SqlitePool │   │  order           │   │ 001_initial.sql  │   │    │
//! │  │  │ LockReg.   │   │  sale            │   │                  │   │    │
//! │  │  └────────────┘   └──────────────────┘   └──────────────────┘   │    │
//! │  │        │                   │                                    │    │
//! │  │        │                   ▼                                    │    │
//! │  │        │          comanda-core (rules, ledger arithmetic)       │    │
//! │  └────────┼────────────────────────────────────────────────────────┘    │
//! │           ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite Database                             │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and the [`Database`] handle
//! - [`config`] - Environment-driven configuration
//! - [`locks`] - Keyed async locks (origin, order, ingredient)
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, inventory, order and sale repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_db::{ComandaConfig, Database};
//!
//! let db = Database::from_config(ComandaConfig::from_env()?).await?;
//!
//! let order = db.orders().create_order("T4", 2).await?;
//! db.orders().update_order_items(&order.id, drafts).await?;
//! db.orders().send_to_kitchen(&order.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ComandaConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    CatalogRepository, Finalization, InventoryRepository, OrderRepository, SaleRepository,
};
