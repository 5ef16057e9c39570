//! # Validation Module
//!
//! Input validation for records entering the catalogue.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Web layer                                                     │
//! │  └── Form parsing, immediate feedback                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Field formats (email, coupon code)                                │
//! │  └── Cross-field rules (promo price below price, start before end)    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── CHECK constraints (quantity ≥ 1, price and stock ranges)          │
//! │  ├── UNIQUE constraints (coupon code, customer email)                  │
//! │  └── Foreign keys with ON DELETE CASCADE                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopfront_core::validation::{validate_coupon_code, validate_price};
//!
//! validate_coupon_code("PROMO10").unwrap();
//! assert!(validate_price("price", 2_000_000_000).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewCoupon, NewCustomer, NewProduct};
use crate::{BPS_SCALE, MAX_PRICE, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn require(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    require("name", name, 200)
}

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// Case is preserved; codes are matched exactly.
///
/// ## Example
/// ```rust
/// use shopfront_core::validation::validate_coupon_code;
///
/// assert!(validate_coupon_code("PROMO10").is_ok());
/// assert!(validate_coupon_code("").is_err());
/// assert!(validate_coupon_code("PROMO 10").is_err());
/// ```
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    require("code", code, 50)?;

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address (shape only, no deliverability).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    require("email", email, 254)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@domain".to_string(),
    };

    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a catalogue price: whole francs, from 1 to [`MAX_PRICE`].
///
/// The ceiling keeps every cart total within `i64`, see
/// [`CartLimits::validate`](crate::cart::CartLimits::validate).
pub fn validate_price(field: &str, amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if amount > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_PRICE,
        });
    }

    Ok(())
}

/// Validates a stock level: 0 to [`MAX_STOCK`].
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a coupon discount: strictly between 0% and 100%.
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps == 0 || bps >= BPS_SCALE {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 1,
            max: i64::from(BPS_SCALE) - 1,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a product before insert.
///
/// ## Promotion Rules
/// ```text
/// promo_price set?
///      │
///      ├── promo_price >= price          → Inconsistent
///      ├── starts_on > ends_on           → Inconsistent
///      └── dates partially set           → allowed (promotion never active)
/// ```
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_price("price", product.price)?;

    validate_stock(product.stock)?;

    if let Some(promo) = product.promo_price {
        validate_price("promo_price", promo)?;
        if promo >= product.price {
            return Err(ValidationError::Inconsistent {
                field: "promo_price".to_string(),
                reason: "must be lower than price".to_string(),
            });
        }
    }

    if let (Some(start), Some(end)) = (product.promo_starts_on, product.promo_ends_on) {
        if start > end {
            return Err(ValidationError::Inconsistent {
                field: "promo_starts_on".to_string(),
                reason: "must not be after promo_ends_on".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a coupon before insert.
pub fn validate_new_coupon(coupon: &NewCoupon) -> ValidationResult<()> {
    validate_coupon_code(&coupon.code)?;
    require("label", &coupon.label, 200)?;
    validate_discount_bps(coupon.discount_bps)?;

    if coupon.remaining_uses < 0 {
        return Err(ValidationError::OutOfRange {
            field: "remaining_uses".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a customer before insert.
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    require("name", &customer.name, 200)?;
    validate_email(&customer.email)
}

// =============================================================================
// Unit Tests
// =============================================================================
