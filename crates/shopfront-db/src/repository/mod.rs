//! # Repository Module
//!
//! Database repository implementations for Shopfront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartService                                                            │
//! │       │                                                                 │
//! │       │  db.carts().apply_coupon(customer, cart, "PROMO10", today)     │
//! │       ▼                                                                 │
//! │  CartRepository                                                         │
//! │  ├── add_item / update_quantity / remove_item / clear                  │
//! │  ├── apply_coupon / detach_coupon                                      │
//! │  └── load_priced                                                        │
//! │       │                                                                 │
//! │       │  SQL (one transaction per mutation)                             │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`customer::CustomerRepository`] - Customer accounts
//! - [`product::ProductRepository`] - Catalogue and stock
//! - [`coupon::CouponRepository`] - Coupon records
//! - [`cart::CartRepository`] - Carts, line items, coupon redemption
//! - [`order::OrderRepository`] - Checkout and order status

pub mod cart;
pub mod coupon;
pub mod customer;
pub mod order;
pub mod product;

use chrono::{DateTime, Utc};

/// Generates a new UUID v4 string id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Bookkeeping timestamp. Business dates are always passed in.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}
