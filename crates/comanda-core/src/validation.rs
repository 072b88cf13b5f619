//! # Validation Module
//!
//! Input validation for Comanda.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (order-taking UI, kitchen display, intake form)        │
//! │  ├── Basic format checks (empty, length)                                │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Business rule validation, before any lock or transaction           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK constraints (quantities, remaining <= initial)               │
//! │  ├── UNIQUE constraints (one sale per order item)                       │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::validation::{validate_name, validate_item_quantity};
//!
//! validate_name("name", "Margherita").unwrap();
//! validate_item_quantity(2).unwrap();
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::CustomerInfo;
use crate::{MAX_COMMENT_LENGTH, MAX_GUEST_COUNT, MAX_ITEM_QUANTITY, MAX_NAME_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (product, ingredient, category, customer).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_name;
///
/// assert!(validate_name("name", "Mozzarella").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a free-text item comment ("no onions", "well done").
pub fn validate_comment(comment: Option<&str>) -> ValidationResult<()> {
    match comment {
        Some(text) if text.chars().count() > MAX_COMMENT_LENGTH => Err(ValidationError::TooLong {
            field: "comment".to_string(),
            max: MAX_COMMENT_LENGTH,
        }),
        _ => Ok(()),
    }
}

/// Validates takeaway contact details. Only the name is mandatory.
pub fn validate_customer(customer: &CustomerInfo) -> ValidationResult<()> {
    validate_name("customer name", &customer.name)?;

    if let Some(phone) = customer.phone.as_deref() {
        let ok = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
        if !ok || phone.trim().is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: "customer phone".to_string(),
                reason: "must contain only digits, spaces and + - ( )".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order item quantity (whole portions).
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_item_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a guest count. Zero is allowed (counter service, takeaway).
pub fn validate_guest_count(count: i64) -> ValidationResult<()> {
    if !(0..=MAX_GUEST_COUNT).contains(&count) {
        return Err(ValidationError::OutOfRange {
            field: "guest_count".to_string(),
            min: 0,
            max: MAX_GUEST_COUNT,
        });
    }

    Ok(())
}

/// Validates an ingredient amount that must be strictly positive
/// (purchases, recipe lines).
pub fn validate_positive_quantity(field: &str, qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an amount that may be zero but not negative (minimum stock).
pub fn validate_non_negative_quantity(field: &str, qty: Quantity) -> ValidationResult<()> {
    if qty.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a price. Zero is allowed (free items, complimentary lots).
///
/// ## Example
/// ```rust
/// use comanda_core::money::Money;
/// use comanda_core::validation::validate_price;
///
/// assert!(validate_price("price", Money::from_cents(1099)).is_ok());
/// assert!(validate_price("price", Money::zero()).is_ok());
/// assert!(validate_price("price", Money::from_cents(-100)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Rejects an exclusion list that names the same ingredient twice.
pub fn validate_exclusions(excluded: &[String]) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for id in excluded {
        if !seen.insert(id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "excluded_ingredients".to_string(),
                value: id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Pizza Margherita").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_item_quantity() {
        assert!(validate_item_quantity(1).is_ok());
        assert!(validate_item_quantity(999).is_ok());

        assert!(validate_item_quantity(0).is_err());
        assert!(validate_item_quantity(-1).is_err());
        assert!(validate_item_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_guest_count() {
        assert!(validate_guest_count(0).is_ok());
        assert!(validate_guest_count(4).is_ok());
        assert!(validate_guest_count(-1).is_err());
        assert!(validate_guest_count(MAX_GUEST_COUNT + 1).is_err());
    }

    #[test]
    fn test_validate_quantities() {
        assert!(validate_positive_quantity("quantity", Quantity::from_milli(1)).is_ok());
        assert!(validate_positive_quantity("quantity", Quantity::zero()).is_err());
        assert!(validate_non_negative_quantity("minimum", Quantity::zero()).is_ok());
        assert!(validate_non_negative_quantity("minimum", Quantity::from_milli(-1)).is_err());
    }

    #[test]
    fn test_validate_customer() {
        let mut customer = CustomerInfo {
            name: "Ana".to_string(),
            phone: Some("+351 912-345-678".to_string()),
            payment_proof: None,
        };
        assert!(validate_customer(&customer).is_ok());

        customer.phone = Some("call me".to_string());
        assert!(validate_customer(&customer).is_err());

        customer.phone = None;
        customer.name = " ".to_string();
        assert!(validate_customer(&customer).is_err());
    }

    #[test]
    fn test_validate_exclusions() {
        assert!(validate_exclusions(&["cheese".into(), "olives".into()]).is_ok());
        assert!(validate_exclusions(&["cheese".into(), "cheese".into()]).is_err());
    }

    #[test]
    fn test_validate_comment() {
        assert!(validate_comment(None).is_ok());
        assert!(validate_comment(Some("no basil")).is_ok());
        assert!(validate_comment(Some(&"x".repeat(MAX_COMMENT_LENGTH + 1))).is_err());
    }
}
