//! # Promotion Window
//!
//! Decides whether a product's promotional price applies on a given day.
//!
//! ## Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │        starts_on                              ends_on                   │
//! │            │◄──────────── promo_price ───────────►│                     │
//! │   price    │                                      │    price            │
//! │ ───────────●──────────────────────────────────────●───────────────      │
//! │            ▲ inclusive                  inclusive ▲                     │
//! │                                                                         │
//! │  No promo_price, or a missing date  →  never active                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The evaluation date is always passed in. Nothing here reads the clock.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Product;

/// A fully specified promotion: price plus inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionWindow {
    pub price: Money,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

impl PromotionWindow {
    /// True when `as_of` falls within `[starts_on, ends_on]`.
    #[inline]
    pub fn contains(&self, as_of: NaiveDate) -> bool {
        self.starts_on <= as_of && as_of <= self.ends_on
    }
}

impl Product {
    /// Returns the promotion if price and both dates are set.
    pub fn promotion_window(&self) -> Option<PromotionWindow> {
        Some(PromotionWindow {
            price: Money::from_amount(self.promo_price?),
            starts_on: self.promo_starts_on?,
            ends_on: self.promo_ends_on?,
        })
    }
}

/// Returns true iff the product has a promotional price and
/// `starts_on <= as_of <= ends_on`.
///
/// ## Example
/// ```rust,ignore
/// // promo window [Mar 1, Mar 3]
/// assert!(is_promotion_active(&product, mar_1));
/// assert!(is_promotion_active(&product, mar_3));
/// assert!(!is_promotion_active(&product, mar_4));
/// ```
pub fn is_promotion_active(product: &Product, as_of: NaiveDate) -> bool {
    product
        .promotion_window()
        .is_some_and(|window| window.contains(as_of))
}

/// Unit price the customer pays on `as_of`.
pub fn effective_unit_price(product: &Product, as_of: NaiveDate) -> Money {
    match product.promotion_window() {
        Some(window) if window.contains(as_of) => window.price,
        _ => product.base_price(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    pub(crate) fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + Duration::days(n)
    }

    pub(crate) fn product(price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: format!("Produit {}", price),
            price,
            promo_price: None,
            promo_starts_on: None,
            promo_ends_on: None,
            stock: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn promo_product(price: i64, promo: i64, start: i64, end: i64) -> Product {
        Product {
            promo_price: Some(promo),
            promo_starts_on: Some(day(start)),
            promo_ends_on: Some(day(end)),
            ..product(price)
        }
    }

    #[test]
    fn test_active_inside_window() {
        let p = promo_product(100_000, 80_000, -1, 3);
        assert!(is_promotion_active(&p, day(0)));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let p = promo_product(10_000, 8_000, 0, 2);
        assert!(is_promotion_active(&p, day(0)));
        assert!(is_promotion_active(&p, day(2)));
    }

    #[test]
    fn test_inactive_outside_window() {
        let p = promo_product(10_000, 8_000, 0, 2);
        assert!(!is_promotion_active(&p, day(-1)));
        assert!(!is_promotion_active(&p, day(3)));

        // Expired promotion: [-10, -1] seen from day 0
        let expired = promo_product(100_000, 80_000, -10, -1);
        assert!(!is_promotion_active(&expired, day(0)));
    }

    #[test]
    fn test_missing_dates_mean_no_promotion() {
        let mut p = promo_product(10_000, 8_000, 0, 2);
        p.promo_starts_on = None;
        assert!(!is_promotion_active(&p, day(1)));

        let mut p = promo_product(10_000, 8_000, 0, 2);
        p.promo_ends_on = None;
        assert!(!is_promotion_active(&p, day(1)));
        assert_eq!(effective_unit_price(&p, day(1)).amount(), 10_000);
    }

    #[test]
    fn test_no_promo_price_means_no_promotion() {
        let mut p = promo_product(10_000, 8_000, 0, 2);
        p.promo_price = None;
        assert!(!is_promotion_active(&p, day(1)));
    }

    #[test]
    fn test_effective_unit_price() {
        let p = promo_product(10_000, 8_000, 0, 2);
        assert_eq!(effective_unit_price(&p, day(1)).amount(), 8_000);
        assert_eq!(effective_unit_price(&p, day(5)).amount(), 10_000);
        assert_eq!(effective_unit_price(&product(4_500), day(1)).amount(), 4_500);
    }
}
