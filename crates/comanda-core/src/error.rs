//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                        │
//! │  ├── ValidationError  - Input validation failures                       │
//! │  └── ErrorKind        - Caller-facing classification                    │
//! │                                                                         │
//! │  comanda-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures, wraps CoreError               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ErrorKind → caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Classification
//! ```text
//! NotFound            unknown order / product / ingredient id
//! InvalidArgument     negative or zero quantity, malformed payload
//! PreconditionFailed  state machine rule violated, table occupied, ...
//! Conflict            concurrent mutation lost a race (retry after re-fetch)
//! Internal            storage or transaction failure
//! ```
//! The first three never leave a partial effect behind.

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::quantity::Quantity;

// =============================================================================
// Error Kind
// =============================================================================

/// Caller-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    PreconditionFailed,
    /// Retryable: re-fetch the order and re-submit.
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Whether a caller may retry the same request after re-reading state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Conflict)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Referenced ingredient does not exist.
    ///
    /// ## When This Occurs
    /// - Purchase recorded against an unknown id
    /// - A recipe line points at a deleted ingredient (corrupt recipe)
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Editing items while the kitchen is preparing the last round
    /// - Finalizing with items still in `new`
    /// - Marking ready an order that was never sent
    #[error("Order {order_id} cannot be changed: {reason}")]
    InvalidOrderState { order_id: String, reason: String },

    /// Another active order already holds this table.
    #[error("Origin {origin_id} already has active order {order_id}")]
    OriginOccupied { origin_id: String, order_id: String },

    #[error("Product {product_id} is {status} and cannot be ordered")]
    ProductUnavailable { product_id: String, status: String },

    /// A `sent` item was removed or modified.
    #[error("Item {item_id} was already sent to the kitchen and cannot change")]
    ItemLocked { item_id: String },

    /// Only raised when the oversell policy is `Reject`.
    #[error("Insufficient stock for {ingredient_id}: available {available}, requested {requested}")]
    InsufficientStock {
        ingredient_id: String,
        available: Quantity,
        requested: Quantity,
    },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Helper for state machine rejections.
    pub fn invalid_state(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidOrderState {
            order_id: order_id.into(),
            reason: reason.into(),
        }
    }

    /// Classifies this error for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::OrderNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::IngredientNotFound(_) => ErrorKind::NotFound,
            CoreError::InvalidOrderState { .. }
            | CoreError::OriginOccupied { .. }
            | CoreError::ProductUnavailable { .. }
            | CoreError::ItemLocked { .. }
            | CoreError::InsufficientStock { .. } => ErrorKind::PreconditionFailed,
            CoreError::QuantityTooLarge { .. } | CoreError::Validation(_) => {
                ErrorKind::InvalidArgument
            }
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs, so they never leave partial effects.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} '{value}' is listed more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
