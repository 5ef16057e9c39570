//! # Cart Line Rules
//!
//! Decides the new quantity of a line before anything is written.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Action              Rule                        Result                 │
//! │  ──────              ────                        ──────                 │
//! │  add (qty ≤ 0)       reject                      InvalidQuantity        │
//! │  add (new line)      lines < max_items           quantity               │
//! │  add (existing)      existing + qty ≤ max        existing + qty         │
//! │  update (qty = 0)    remove the line             None                   │
//! │  update (qty < 0)    reject                      InvalidQuantity        │
//! │  any                 result ≤ product stock      else InsufficientStock │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer writes whatever these functions return.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::Product;
use crate::validation::ValidationResult;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE};

/// Per-cart limits. Configurable in shopfront-service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLimits {
    /// Maximum number of distinct products.
    pub max_items: usize,
    /// Maximum quantity of one product.
    pub max_item_quantity: i64,
}

impl Default for CartLimits {
    fn default() -> Self {
        CartLimits {
            max_items: MAX_CART_ITEMS,
            max_item_quantity: MAX_ITEM_QUANTITY,
        }
    }
}

impl CartLimits {
    /// Largest total a cart can reach under these limits, or `None` if it
    /// would not fit in `i64`.
    pub fn max_cart_total(&self) -> Option<i64> {
        let items = i64::try_from(self.max_items).ok()?;
        MAX_PRICE.checked_mul(self.max_item_quantity)?.checked_mul(items)
    }

    /// Limits must be positive and keep every cart total within `i64`.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.max_items == 0 || self.max_item_quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "cart limits".to_string(),
            });
        }

        if self.max_cart_total().is_none() {
            return Err(ValidationError::Inconsistent {
                field: "cart limits".to_string(),
                reason: format!(
                    "allow totals beyond i64 at {} francs per unit",
                    MAX_PRICE
                ),
            });
        }

        Ok(())
    }
}

/// Rejects quantities below one.
pub fn ensure_positive_quantity(quantity: i64) -> CoreResult<()> {
    if quantity <= 0 {
        return Err(CoreError::InvalidQuantity { quantity });
    }
    Ok(())
}

/// Returns the line quantity after adding `quantity` of `product`.
///
/// ## Arguments
/// * `existing` - Current quantity of this product in the cart, if any
/// * `distinct_lines` - Number of lines currently in the cart
pub fn quantity_after_add(
    product: &Product,
    existing: Option<i64>,
    distinct_lines: usize,
    quantity: i64,
    limits: CartLimits,
) -> CoreResult<i64> {
    ensure_positive_quantity(quantity)?;
    limits.validate()?;
    ensure_sellable(product)?;

    if existing.is_none() && distinct_lines >= limits.max_items {
        return Err(CoreError::CartTooLarge {
            max: limits.max_items,
        });
    }

    let new_quantity = existing.unwrap_or(0).saturating_add(quantity);
    check_line_quantity(product, new_quantity, limits)?;
    Ok(new_quantity)
}

/// Returns the line quantity after setting it to `quantity`.
///
/// `Ok(None)` means the line should be removed.
pub fn quantity_after_update(
    product: &Product,
    quantity: i64,
    limits: CartLimits,
) -> CoreResult<Option<i64>> {
    if quantity == 0 {
        return Ok(None);
    }
    ensure_positive_quantity(quantity)?;
    limits.validate()?;
    check_line_quantity(product, quantity, limits)?;
    Ok(Some(quantity))
}

fn ensure_sellable(product: &Product) -> CoreResult<()> {
    if !product.is_active {
        return Err(CoreError::ProductUnavailable(product.id.clone()));
    }
    Ok(())
}

fn check_line_quantity(product: &Product, quantity: i64, limits: CartLimits) -> CoreResult<()> {
    if quantity > limits.max_item_quantity {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: limits.max_item_quantity,
        });
    }

    if !product.can_sell(quantity) {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
            requested: quantity,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotion::tests::product;

    #[test]
    fn test_add_new_line() {
        let p = product(10_000);
        assert_eq!(quantity_after_add(&p, None, 0, 2, CartLimits::default()).unwrap(), 2);
    }

    #[test]
    fn test_add_to_existing_line_accumulates() {
        let p = product(10_000);
        assert_eq!(quantity_after_add(&p, Some(2), 1, 3, CartLimits::default()).unwrap(), 5);
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let p = product(10_000);
        assert!(matches!(
            quantity_after_add(&p, None, 0, -5, CartLimits::default()),
            Err(CoreError::InvalidQuantity { quantity: -5 })
        ));
        assert!(matches!(
            quantity_after_add(&p, None, 0, 0, CartLimits::default()),
            Err(CoreError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[test]
    fn test_stock_is_enforced() {
        let p = product(10_000); // stock 10
        assert!(matches!(
            quantity_after_add(&p, Some(8), 1, 3, CartLimits::default()),
            Err(CoreError::InsufficientStock { available: 10, requested: 11, .. })
        ));
    }

    #[test]
    fn test_inactive_product_rejected() {
        let mut p = product(10_000);
        p.is_active = false;
        assert!(matches!(
            quantity_after_add(&p, None, 0, 1, CartLimits::default()),
            Err(CoreError::ProductUnavailable(_))
        ));
    }

    #[test]
    fn test_limits() {
        let mut p = product(10_000);
        p.stock = 10_000;
        let limits = CartLimits {
            max_items: 2,
            max_item_quantity: 5,
        };

        assert!(matches!(
            quantity_after_add(&p, None, 2, 1, limits),
            Err(CoreError::CartTooLarge { max: 2 })
        ));
        // Existing lines can still grow when the cart is full
        assert_eq!(quantity_after_add(&p, Some(1), 2, 1, limits).unwrap(), 2);
        assert!(matches!(
            quantity_after_add(&p, Some(4), 1, 2, limits),
            Err(CoreError::QuantityTooLarge { requested: 6, max: 5 })
        ));
    }

    #[test]
    fn test_huge_add_is_capped_not_overflowed() {
        let p = product(10_000);
        assert!(matches!(
            quantity_after_add(&p, Some(3), 1, i64::MAX, CartLimits::default()),
            Err(CoreError::QuantityTooLarge { requested: i64::MAX, .. })
        ));
    }

    #[test]
    fn test_limits_must_keep_totals_in_range() {
        assert!(CartLimits::default().validate().is_ok());
        assert_eq!(
            CartLimits::default().max_cart_total(),
            Some(MAX_PRICE * MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64)
        );

        let zero = CartLimits {
            max_items: 0,
            max_item_quantity: 5,
        };
        assert!(zero.validate().is_err());

        let unbounded = CartLimits {
            max_items: 1_000,
            max_item_quantity: i64::MAX / 2,
        };
        assert_eq!(unbounded.max_cart_total(), None);
        assert!(matches!(
            unbounded.validate(),
            Err(ValidationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_update_zero_removes() {
        let p = product(10_000);
        assert_eq!(quantity_after_update(&p, 0, CartLimits::default()).unwrap(), None);
        assert_eq!(quantity_after_update(&p, 4, CartLimits::default()).unwrap(), Some(4));
        assert!(matches!(
            quantity_after_update(&p, -1, CartLimits::default()),
            Err(CoreError::InvalidQuantity { quantity: -1 })
        ));
    }
}
