//! # shopfront-core: Pure Pricing Logic for Shopfront
//!
//! This crate holds the storefront's cart arithmetic as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Web layer (external: routing, sessions)            │   │
//! │  │    add_to_cart ──► add_coupon ──► cart page ──► checkout        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shopfront-service                            │   │
//! │  │    CartService, OrderService, Clock, ShopConfig                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopfront-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │  │  types  │ │  money  │ │ promotion │ │ pricing │ │ coupon  │ │   │
//! │  │  │ Product │ │  Money  │ │  window   │ │  totals │ │  rules  │ │   │
//! │  │  └─────────┘ └─────────┘ └───────────┘ └─────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO WALL CLOCK • PURE FUNCTIONS         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                shopfront-db (Database Layer)                    │   │
//! │  │         SQLite queries, migrations, atomic redemption           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Cart, Coupon, Order, ...)
//! - [`money`] - Integer money and the floor-rounded coupon discount
//! - [`promotion`] - Promotion window evaluation
//! - [`pricing`] - Cart total aggregation
//! - [`coupon`] - Coupon usability rules
//! - [`cart`] - Line-item mutation rules (quantities, limits, stock)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfront_core::money::Money;
//! use shopfront_core::types::DiscountRate;
//!
//! let total = Money::from_amount(100_000);
//! let rate = DiscountRate::from_bps(1000); // 10%
//!
//! assert_eq!(total.discount_amount(rate).amount(), 10_000);
//! assert_eq!(total.apply_discount(rate).amount(), 90_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod coupon;
pub mod error;
pub mod money;
pub mod pricing;
pub mod promotion;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::CartLimits;
pub use error::{CoreError, CoreResult, CouponError, ValidationError};
pub use money::Money;
pub use pricing::{CartLine, CartTotals, LineTotal, PricedCart};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default maximum number of distinct products in one cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Default maximum quantity of a single product in one cart.
///
/// Guards against typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest catalogue price, in francs.
///
/// With the default cart limits the largest possible cart is about 10^14
/// francs, far inside `i64`.
pub const MAX_PRICE: i64 = 1_000_000_000;

/// Highest stock level of one product.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Basis points in 100%.
pub const BPS_SCALE: u32 = 10_000;
