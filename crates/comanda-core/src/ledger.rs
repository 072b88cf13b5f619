//! # Lot Ledger Arithmetic
//!
//! Pure FIFO lot accounting for one ingredient. The database layer loads a
//! [`LotBook`], applies exactly one operation, and writes the book back inside
//! the same transaction.
//!
//! ## Deduct vs Restore
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lots (oldest → newest):   L1 (t=1)    L2 (t=2)    L3 (t=3)             │
//! │                                                                         │
//! │  deduct(q)   ─────────────► L1 ──► L2 ──► L3                            │
//! │              oldest first, each lot clamped at 0.                       │
//! │              Short? Logged as shortfall (or rejected by policy).        │
//! │                                                                         │
//! │  restore(q)  L1 ◄── L2 ◄── L3 ◄────────────                             │
//! │              newest first, each up to its initial quantity.            │
//! │              Left over? Added to L1 so nothing is dropped.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cached Fields
//! After every operation [`LotBook::refresh`] recomputes the ingredient's
//! `stock`, `average_cost` and `below_minimum_since` from the lots. They are
//! a materialized view: nothing else writes them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{div_round_half_even, Money};
use crate::policy::OversellPolicy;
use crate::quantity::Quantity;
use crate::types::{Ingredient, Lot};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deduction {
    pub requested: Quantity,
    /// Taken from lots.
    pub applied: Quantity,
    /// `requested - applied`; non-zero only when stock ran out.
    pub shortfall: Quantity,
}

impl Deduction {
    pub fn is_oversold(&self) -> bool {
        self.shortfall.is_positive()
    }
}

/// Result of a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Restoration {
    pub requested: Quantity,
    /// Quantity that did not fit in any lot's headroom and was parked on
    /// the oldest lot (or a newly opened lot).
    pub overflow: Quantity,
    /// Whether a lot had to be opened because the ingredient had none.
    pub opened_lot: bool,
}

// =============================================================================
// Lot Book
// =============================================================================

/// An ingredient and its lots, oldest purchase first.
#[derive(Debug, Clone)]
pub struct LotBook {
    ingredient: Ingredient,
    lots: Vec<Lot>,
}

impl LotBook {
    /// Builds a book. Lots are ordered by purchase time; lots bought at the
    /// same instant keep their given order.
    pub fn new(ingredient: Ingredient, mut lots: Vec<Lot>) -> Self {
        lots.sort_by_key(|lot| lot.purchased_at);
        LotBook { ingredient, lots }
    }

    pub fn ingredient(&self) -> &Ingredient {
        &self.ingredient
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn into_parts(self) -> (Ingredient, Vec<Lot>) {
        (self.ingredient, self.lots)
    }

    /// Σ remaining across lots.
    pub fn stock(&self) -> Quantity {
        self.lots.iter().map(|lot| lot.remaining_quantity).sum()
    }

    /// Stock-weighted mean unit cost over lots that still hold stock.
    ///
    /// With every lot empty this is the last average computed while stock
    /// existed (zero if the ingredient was never purchased).
    pub fn average_cost(&self) -> Money {
        let stock = self.stock();
        if !stock.is_positive() {
            return self.ingredient.average_cost;
        }

        let weighted: i128 = self
            .lots
            .iter()
            .filter(|lot| lot.remaining_quantity.is_positive())
            .map(|lot| lot.remaining_quantity.milli() as i128 * lot.unit_cost.cents() as i128)
            .sum();

        Money::from_cents(div_round_half_even(weighted, stock.milli() as i128) as i64)
    }

    /// Consumes `quantity` from the oldest lots first.
    ///
    /// Under [`OversellPolicy::Allow`] a quantity larger than the stock
    /// drains every lot to zero and reports the rest as `shortfall`; lots
    /// never go negative. Under [`OversellPolicy::Reject`] it fails with
    /// `InsufficientStock` and leaves the book untouched.
    pub fn deduct(
        &mut self,
        quantity: Quantity,
        policy: OversellPolicy,
        now: DateTime<Utc>,
    ) -> CoreResult<Deduction> {
        ensure_not_negative(quantity)?;

        let available = self.stock();
        if policy == OversellPolicy::Reject && quantity > available {
            return Err(CoreError::InsufficientStock {
                ingredient_id: self.ingredient.id.clone(),
                available,
                requested: quantity,
            });
        }

        let mut left = quantity;
        for lot in self.lots.iter_mut() {
            if !left.is_positive() {
                break;
            }
            let take = left.min(lot.remaining_quantity);
            lot.remaining_quantity -= take;
            left -= take;
        }

        self.refresh(now);

        Ok(Deduction {
            requested: quantity,
            applied: quantity - left,
            shortfall: left,
        })
    }

    /// Gives `quantity` back, undoing the most recent consumption first.
    ///
    /// Each lot is topped up to its initial quantity, newest lot first. Any
    /// remainder goes onto the oldest lot, whose initial quantity is raised
    /// to keep `remaining <= initial`. A book with no lots opens one at the
    /// last known average cost.
    pub fn restore(&mut self, quantity: Quantity, now: DateTime<Utc>) -> CoreResult<Restoration> {
        ensure_not_negative(quantity)?;

        let mut left = quantity;
        for lot in self.lots.iter_mut().rev() {
            if !left.is_positive() {
                break;
            }
            let give = left.min(lot.headroom());
            lot.remaining_quantity += give;
            left -= give;
        }

        let overflow = left;
        let mut opened_lot = false;

        if overflow.is_positive() {
            match self.lots.first_mut() {
                Some(oldest) => {
                    oldest.remaining_quantity += overflow;
                    if oldest.remaining_quantity > oldest.initial_quantity {
                        oldest.initial_quantity = oldest.remaining_quantity;
                    }
                }
                None => {
                    self.lots.push(Lot {
                        id: Uuid::new_v4().to_string(),
                        ingredient_id: self.ingredient.id.clone(),
                        initial_quantity: overflow,
                        remaining_quantity: overflow,
                        unit_cost: self.ingredient.average_cost,
                        purchased_at: now,
                    });
                    opened_lot = true;
                }
            }
        }

        self.refresh(now);

        Ok(Restoration {
            requested: quantity,
            overflow,
            opened_lot,
        })
    }

    /// Appends a newly purchased lot. `unit_cost = total_price / quantity`.
    pub fn record_purchase(
        &mut self,
        quantity: Quantity,
        total_price: Money,
        now: DateTime<Utc>,
    ) -> CoreResult<Lot> {
        if total_price.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "total_price".to_string(),
            }
            .into());
        }
        let unit_cost = total_price
            .per_unit_of(quantity)
            .ok_or_else(|| ValidationError::MustBePositive {
                field: "quantity".to_string(),
            })?;

        let lot = Lot {
            id: Uuid::new_v4().to_string(),
            ingredient_id: self.ingredient.id.clone(),
            initial_quantity: quantity,
            remaining_quantity: quantity,
            unit_cost,
            purchased_at: now,
        };
        self.lots.push(lot.clone());
        self.refresh(now);

        Ok(lot)
    }

    /// Recomputes the cached ingredient fields from the lots.
    ///
    /// `below_minimum_since` is stamped only on the transition to at/below
    /// the minimum and cleared on the transition back above it.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        let stock = self.stock();
        let average = self.average_cost();

        let ingredient = &mut self.ingredient;
        ingredient.stock = stock;
        ingredient.average_cost = average;

        if stock <= ingredient.minimum_stock {
            if ingredient.below_minimum_since.is_none() {
                ingredient.below_minimum_since = Some(now);
            }
        } else {
            ingredient.below_minimum_since = None;
        }
        ingredient.updated_at = now;
    }
}

fn ensure_not_negative(quantity: Quantity) -> CoreResult<()> {
    if quantity.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StockUnit;
    use chrono::{Duration, TimeZone};

    fn t(n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(n)
    }

    fn ingredient(minimum: Quantity) -> Ingredient {
        Ingredient {
            id: "cheese".to_string(),
            name: "Cheese".to_string(),
            unit: StockUnit::Kilogram,
            minimum_stock: minimum,
            stock: Quantity::zero(),
            average_cost: Money::zero(),
            below_minimum_since: None,
            created_at: t(0),
            updated_at: t(0),
        }
    }

    fn lot(id: &str, qty: i64, cost: i64, at: i64) -> Lot {
        Lot {
            id: id.to_string(),
            ingredient_id: "cheese".to_string(),
            initial_quantity: Quantity::from_units(qty),
            remaining_quantity: Quantity::from_units(qty),
            unit_cost: Money::from_cents(cost),
            purchased_at: t(at),
        }
    }

    fn two_lot_book() -> LotBook {
        let mut book = LotBook::new(
            ingredient(Quantity::zero()),
            vec![lot("l2", 5, 20, 2), lot("l1", 5, 10, 1)],
        );
        book.refresh(t(3));
        book
    }

    #[test]
    fn test_lots_sorted_oldest_first() {
        let book = two_lot_book();
        let ids: Vec<_> = book.lots().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l2"]);
        assert_eq!(book.stock(), Quantity::from_units(10));
        assert_eq!(book.average_cost(), Money::from_cents(15));
    }

    #[test]
    fn test_fifo_deduct() {
        let mut book = two_lot_book();

        let d = book
            .deduct(Quantity::from_units(7), OversellPolicy::Allow, t(4))
            .unwrap();

        assert_eq!(d.applied, Quantity::from_units(7));
        assert!(!d.is_oversold());
        assert_eq!(book.lots()[0].remaining_quantity, Quantity::zero());
        assert_eq!(book.lots()[1].remaining_quantity, Quantity::from_units(3));
        assert_eq!(book.average_cost(), Money::from_cents(20));
        assert_eq!(book.ingredient().stock, Quantity::from_units(3));
        assert_eq!(book.ingredient().average_cost, Money::from_cents(20));
    }

    #[test]
    fn test_restore_newest_first() {
        let mut book = two_lot_book();
        book.deduct(Quantity::from_units(7), OversellPolicy::Allow, t(4))
            .unwrap();

        let r = book.restore(Quantity::from_units(7), t(5)).unwrap();

        assert_eq!(r.overflow, Quantity::zero());
        assert_eq!(book.lots()[0].remaining_quantity, Quantity::from_units(5));
        assert_eq!(book.lots()[1].remaining_quantity, Quantity::from_units(5));
        assert_eq!(book.average_cost(), Money::from_cents(15));
    }

    #[test]
    fn test_restore_partial_prefers_newest_lot() {
        let mut book = two_lot_book();
        book.deduct(Quantity::from_units(7), OversellPolicy::Allow, t(4))
            .unwrap();

        book.restore(Quantity::from_units(3), t(5)).unwrap();

        // headroom of 2 on l2 filled first, then 1 onto l1
        assert_eq!(book.lots()[1].remaining_quantity, Quantity::from_units(5));
        assert_eq!(book.lots()[0].remaining_quantity, Quantity::from_units(1));
    }

    #[test]
    fn test_oversell_allowed_clamps_at_zero() {
        let mut book = two_lot_book();

        let d = book
            .deduct(Quantity::from_units(12), OversellPolicy::Allow, t(4))
            .unwrap();

        assert_eq!(d.applied, Quantity::from_units(10));
        assert_eq!(d.shortfall, Quantity::from_units(2));
        assert!(book.lots().iter().all(|l| l.remaining_quantity.is_zero()));
        // Cost history survives the stockout
        assert_eq!(book.average_cost(), Money::from_cents(15));
        assert_eq!(book.ingredient().average_cost, Money::from_cents(15));
    }

    #[test]
    fn test_oversell_rejected_leaves_book_untouched() {
        let mut book = two_lot_book();

        let err = book
            .deduct(Quantity::from_units(11), OversellPolicy::Reject, t(4))
            .unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(book.stock(), Quantity::from_units(10));
    }

    #[test]
    fn test_restore_overflow_goes_to_oldest_lot() {
        let mut book = two_lot_book();
        book.deduct(Quantity::from_units(1), OversellPolicy::Allow, t(4))
            .unwrap();

        let r = book.restore(Quantity::from_units(3), t(5)).unwrap();

        assert_eq!(r.overflow, Quantity::from_units(2));
        let oldest = &book.lots()[0];
        assert_eq!(oldest.remaining_quantity, Quantity::from_units(6));
        assert_eq!(oldest.initial_quantity, Quantity::from_units(6));
        assert_eq!(book.stock(), Quantity::from_units(12));
    }

    #[test]
    fn test_restore_without_lots_opens_one() {
        let mut book = LotBook::new(ingredient(Quantity::zero()), Vec::new());

        let r = book.restore(Quantity::from_milli(250), t(1)).unwrap();

        assert!(r.opened_lot);
        assert_eq!(book.lots().len(), 1);
        assert_eq!(book.stock(), Quantity::from_milli(250));
    }

    #[test]
    fn test_negative_arguments_rejected() {
        let mut book = two_lot_book();
        let err = book
            .deduct(Quantity::from_milli(-1), OversellPolicy::Allow, t(4))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = book.restore(Quantity::from_milli(-1), t(4)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_record_purchase() {
        let mut book = LotBook::new(ingredient(Quantity::zero()), Vec::new());

        let lot = book
            .record_purchase(Quantity::from_milli(2500), Money::from_cents(5000), t(1))
            .unwrap();

        assert_eq!(lot.unit_cost, Money::from_cents(2000));
        assert_eq!(book.ingredient().stock, Quantity::from_milli(2500));
        assert_eq!(book.ingredient().average_cost, Money::from_cents(2000));

        let err = book
            .record_purchase(Quantity::zero(), Money::from_cents(100), t(2))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_below_minimum_timestamp() {
        let mut book = LotBook::new(
            ingredient(Quantity::from_units(3)),
            vec![lot("l1", 10, 10, 1)],
        );
        book.refresh(t(1));
        assert_eq!(book.ingredient().below_minimum_since, None);

        // Crossing sets the stamp
        book.deduct(Quantity::from_units(7), OversellPolicy::Allow, t(2))
            .unwrap();
        assert_eq!(book.ingredient().below_minimum_since, Some(t(2)));

        // Further deductions keep the original stamp
        book.deduct(Quantity::from_units(1), OversellPolicy::Allow, t(3))
            .unwrap();
        assert_eq!(book.ingredient().below_minimum_since, Some(t(2)));

        // Rising back above clears it
        book.restore(Quantity::from_units(2), t(4)).unwrap();
        assert_eq!(book.ingredient().below_minimum_since, None);
    }
}
