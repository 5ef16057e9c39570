//! # Coupon Rules
//!
//! Pure checks shared by the redemption transaction and cart pricing.
//!
//! ## Redemption Checks (in order)
//! ```text
//! apply "PROMO10" on as_of
//!      │
//!      ├── no coupon with that exact code?  → CouponError::NotFound
//!      ├── is_active == false?              → CouponError::Inactive
//!      ├── expires_on < as_of?              → CouponError::Expired
//!      ├── remaining_uses <= 0?             → CouponError::Exhausted
//!      │
//!      ▼
//!   usable → attach to cart + decrement (one transaction, shopfront-db)
//! ```

use chrono::NaiveDate;

use crate::error::CouponError;
use crate::types::Coupon;

/// Checks every redemption rule except existence.
///
/// Existence is the caller's lookup; pass the found coupon here.
pub fn check_coupon(coupon: &Coupon, as_of: NaiveDate) -> Result<(), CouponError> {
    if !coupon.is_active {
        return Err(CouponError::Inactive(coupon.code.clone()));
    }

    if coupon.expires_on < as_of {
        return Err(CouponError::Expired {
            code: coupon.code.clone(),
            expired_on: coupon.expires_on,
        });
    }

    if coupon.remaining_uses <= 0 {
        return Err(CouponError::Exhausted(coupon.code.clone()));
    }

    Ok(())
}

impl Coupon {
    /// Whether an already-attached coupon still discounts the cart.
    ///
    /// The use was consumed at attach time, so the remaining counter is
    /// not consulted here: the cart that took the last use keeps its
    /// discount.
    pub fn grants_discount(&self, as_of: NaiveDate) -> bool {
        self.is_active && self.expires_on >= as_of
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::promotion::tests::day;
    use chrono::Utc;

    pub(crate) fn coupon(code: &str, bps: u32, expires_in: i64, remaining: i64) -> Coupon {
        Coupon {
            id: uuid::Uuid::new_v4().to_string(),
            code: code.to_string(),
            label: "Promo".to_string(),
            is_active: true,
            expires_on: day(expires_in),
            discount_bps: bps,
            remaining_uses: remaining,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_valid_coupon() {
        assert!(check_coupon(&coupon("PROMO10", 1000, 5, 10), day(0)).is_ok());
    }

    #[test]
    fn test_expiry_day_is_still_valid() {
        assert!(check_coupon(&coupon("PROMO10", 1000, 0, 10), day(0)).is_ok());
    }

    #[test]
    fn test_expired() {
        let c = coupon("PROMO10", 1000, 0, 10);
        assert_eq!(
            check_coupon(&c, day(1)),
            Err(CouponError::Expired {
                code: "PROMO10".to_string(),
                expired_on: day(0),
            })
        );
    }

    #[test]
    fn test_inactive_checked_before_expiry() {
        let mut c = coupon("OLD", 1000, -3, 0);
        c.is_active = false;
        assert_eq!(check_coupon(&c, day(0)), Err(CouponError::Inactive("OLD".to_string())));
    }

    #[test]
    fn test_exhausted() {
        let c = coupon("LAST", 1000, 5, 0);
        assert_eq!(check_coupon(&c, day(0)), Err(CouponError::Exhausted("LAST".to_string())));
    }

    #[test]
    fn test_grants_discount_ignores_remaining_uses() {
        let c = coupon("LAST", 1000, 5, 0);
        assert!(c.grants_discount(day(0)));
        assert!(!c.grants_discount(day(6)));
    }
}
