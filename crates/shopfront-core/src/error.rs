//! # Error Types
//!
//! Domain-specific error types for shopfront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopfront-core errors (this file)                                     │
//! │  ├── CouponError      - Why a coupon cannot be redeemed                │
//! │  ├── CoreError        - Cart / order rule violations                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopfront-db errors (separate crate)                                  │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  shopfront-service errors                                              │
//! │  └── ServiceError     - What the web layer sees (code + message)      │
//! │                                                                         │
//! │  Flow: CouponError → CoreError → DbError → ServiceError → Web layer    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable and request-local: the caller shows a
//! message and the cart is left as it was.

use thiserror::Error;

// =============================================================================
// Coupon Error
// =============================================================================

/// Reasons a coupon code cannot be applied to a cart.
///
/// Checked in this order: existence, active flag, expiry, remaining uses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    /// No coupon carries this exact (case-sensitive) code.
    #[error("Coupon not found: {0}")]
    NotFound(String),

    /// The coupon exists but has been switched off.
    #[error("Coupon {0} is not active")]
    Inactive(String),

    /// The coupon's expiry date is before the evaluation date.
    #[error("Coupon {code} expired on {expired_on}")]
    Expired {
        code: String,
        expired_on: chrono::NaiveDate,
    },

    /// Every use of the coupon has been redeemed.
    #[error("Coupon {0} has no remaining uses")]
    Exhausted(String),
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations in cart and order
/// handling. They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Quantity on a line-item mutation is zero or negative.
    ///
    /// ## When This Occurs
    /// - `add_to_cart` with quantity ≤ 0
    /// - `update_quantity` with a negative quantity
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: i64 },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is not published.
    #[error("Product {0} is not available")]
    ProductUnavailable(String),

    /// Not enough stock for the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Robe wax", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 left"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Cart has reached its maximum number of distinct products.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the per-item cap.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Checkout on a cart without line items.
    #[error("Cart {0} is empty")]
    EmptyCart(String),

    /// Cart belongs to a different customer.
    #[error("Cart {cart_id} does not belong to customer {customer_id}")]
    CartForbidden {
        cart_id: String,
        customer_id: String,
    },

    /// Order is not in a state that allows the requested transition.
    #[error("Order {order_id} is {current_status}, cannot become {requested}")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
        requested: String,
    },

    /// Coupon could not be applied.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields are inconsistent with each other.
    #[error("{field} {reason}")]
    Inconsistent { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
