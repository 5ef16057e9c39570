//! # Domain Types
//!
//! Core domain types used throughout Shopfront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │      Cart       │   │     Coupon      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  customer_id    │   │  code (unique)  │       │
//! │  │  email          │   │  coupon_id ─────┼──►│  discount_bps   │       │
//! │  └─────────────────┘   └────────▲────────┘   │  remaining_uses │       │
//! │                                 │            └─────────────────┘       │
//! │  ┌─────────────────┐   ┌────────┴────────┐                              │
//! │  │    Product      │◄──│  CartLineItem   │                              │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  price          │   │  quantity ≥ 1   │                              │
//! │  │  promo_price    │   └─────────────────┘                              │
//! │  │  promo window   │                                                    │
//! │  └─────────────────┘   Order / OrderItem: frozen checkout snapshot      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records carry database-generated identity and timestamps. The `New*`
//! drafts are what callers build before an insert.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::BPS_SCALE;

// =============================================================================
// Discount Rate
// =============================================================================

/// Coupon discount fraction in basis points (bps).
///
/// 1 basis point = 0.01%, so `1000` = 10%. A usable rate is strictly
/// between 0 and 10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a fraction (for display only).
    #[inline]
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / BPS_SCALE as f64
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A storefront customer account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Fields needed to register a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        NewCustomer {
            name: name.into(),
            email: email.into(),
            phone: None,
            city: None,
            address: None,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product listed in the catalogue.
///
/// ## Promotion fields
/// `promo_price` only applies between `promo_starts_on` and
/// `promo_ends_on`, both inclusive. If either date is missing the product
/// is treated as not on promotion.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the storefront and on orders.
    pub name: String,

    /// Base price.
    pub price: i64,

    /// Promotional price, strictly below `price` when set.
    pub promo_price: Option<i64>,

    /// First day of the promotion (inclusive).
    #[ts(as = "Option<String>")]
    pub promo_starts_on: Option<NaiveDate>,

    /// Last day of the promotion (inclusive).
    #[ts(as = "Option<String>")]
    pub promo_ends_on: Option<NaiveDate>,

    /// Units available for sale.
    pub stock: i64,

    /// Whether the product is published (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the base price as Money.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_amount(self.price)
    }

    /// Checks whether `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Fields needed to list a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: i64,
    pub promo_price: Option<i64>,
    pub promo_starts_on: Option<NaiveDate>,
    pub promo_ends_on: Option<NaiveDate>,
    pub stock: i64,
}

impl NewProduct {
    /// A product with no promotion and no stock.
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        NewProduct {
            name: name.into(),
            price,
            promo_price: None,
            promo_starts_on: None,
            promo_ends_on: None,
            stock: 0,
        }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    /// Sets a promotional price valid from `starts_on` to `ends_on` inclusive.
    pub fn with_promotion(mut self, promo_price: i64, starts_on: NaiveDate, ends_on: NaiveDate) -> Self {
        self.promo_price = Some(promo_price);
        self.promo_starts_on = Some(starts_on);
        self.promo_ends_on = Some(ends_on);
        self
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A limited-use, time-bounded discount code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Coupon {
    pub id: String,

    /// Code typed by the customer. Unique, matched case-sensitively.
    pub code: String,

    /// Marketing label ("Soldes d'été").
    pub label: String,

    pub is_active: bool,

    /// Last day the coupon can be redeemed.
    #[ts(as = "String")]
    pub expires_on: NaiveDate,

    /// Discount in basis points (1000 = 10%).
    pub discount_bps: u32,

    /// Redemptions left. Decremented atomically on apply.
    pub remaining_uses: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Returns the discount as a rate.
    #[inline]
    pub fn discount_rate(&self) -> DiscountRate {
        DiscountRate::from_bps(self.discount_bps)
    }
}

/// Fields needed to create a coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub label: String,
    pub is_active: bool,
    pub expires_on: NaiveDate,
    pub discount_bps: u32,
    pub remaining_uses: i64,
}

impl NewCoupon {
    /// An active coupon.
    pub fn new(
        code: impl Into<String>,
        discount: DiscountRate,
        expires_on: NaiveDate,
        remaining_uses: i64,
    ) -> Self {
        let code = code.into();
        NewCoupon {
            label: code.clone(),
            code,
            is_active: true,
            expires_on,
            discount_bps: discount.bps(),
            remaining_uses,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A customer's in-progress selection. The total is never stored; see
/// [`crate::pricing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Cart {
    pub id: String,
    pub customer_id: String,
    pub coupon_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Checks that `customer_id` owns this cart.
    pub fn is_owned_by(&self, customer_id: &str) -> bool {
        self.customer_id == customer_id
    }
}

/// One product-and-quantity entry of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLineItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order produced by checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, awaiting payment.
    #[default]
    Pending,
    /// Payment received.
    Paid,
    /// Abandoned or refused.
    Cancelled,
}

impl OrderStatus {
    /// Only pending orders move, and only forward.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid) | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order. Amounts are frozen at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    /// Code of the coupon that was attached, if any.
    pub coupon_code: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total_money(&self) -> Money {
        Money::from_amount(self.total)
    }
}

/// A line of an order.
/// Uses snapshot pattern to freeze product data at time of checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at checkout (frozen).
    pub name_snapshot: String,
    /// Effective unit price at checkout (frozen).
    pub unit_price: i64,
    pub quantity: i64,
    pub line_total: i64,
    /// Whether `unit_price` was the promotional price.
    pub promotional: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_rate_fraction() {
        assert_eq!(DiscountRate::from_bps(2500).bps(), 2500);
        assert!((DiscountRate::from_bps(1000).fraction() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_order_status_transitions() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Paid));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_order_status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn test_new_coupon_defaults() {
        let expires = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let coupon = NewCoupon::new("PROMO10", DiscountRate::from_bps(1000), expires, 10);
        assert!(coupon.is_active);
        assert_eq!(coupon.label, "PROMO10");
        assert!(!coupon.inactive().is_active);
    }
}
