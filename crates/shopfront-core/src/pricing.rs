//! # Cart Pricing
//!
//! Derives a cart's total from its line items and attached coupon.
//!
//! ## Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each line (single pass):                                           │
//! │      unit     = promo_price if promotion active on as_of else price    │
//! │      subtotal = unit × quantity                                        │
//! │                                                                         │
//! │  subtotal = Σ line subtotals                                           │
//! │  discount = floor(subtotal × coupon rate)   if coupon grants discount  │
//! │           = 0                               otherwise                  │
//! │  total    = subtotal − discount                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The total is never stored. It is recomputed from a [`PricedCart`],
//! which shopfront-db loads in a fixed number of queries regardless of the
//! number of lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::promotion::{effective_unit_price, is_promotion_active};
use crate::types::{Cart, Coupon, Product};

/// A cart line with the product data needed to price it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: String,
    pub product: Product,
    pub quantity: i64,
}

/// Everything needed to price a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedCart {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
    /// The attached coupon record, if `cart.coupon_id` is set.
    pub coupon: Option<Coupon>,
}

impl PricedCart {
    /// Quantity of `product_id` in the cart, if present.
    pub fn quantity_of(&self, product_id: &str) -> Option<i64> {
        self.lines
            .iter()
            .find(|l| l.product.id == product_id)
            .map(|l| l.quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Priced view of one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineTotal {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub subtotal: Money,
    /// True when `unit_price` is the promotional price.
    pub promotional: bool,
}

/// Cart totals summary for responses and checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub lines: Vec<LineTotal>,
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    /// Code of the coupon that produced `discount`.
    pub coupon_code: Option<String>,
}

/// Prices one line on `as_of`.
pub fn price_line(line: &CartLine, as_of: NaiveDate) -> LineTotal {
    let unit_price = effective_unit_price(&line.product, as_of);
    LineTotal {
        product_id: line.product.id.clone(),
        name: line.product.name.clone(),
        unit_price,
        quantity: line.quantity,
        subtotal: unit_price.multiply_quantity(line.quantity),
        promotional: is_promotion_active(&line.product, as_of),
    }
}

/// Discount an attached coupon grants on `subtotal`.
fn coupon_discount(coupon: Option<&Coupon>, subtotal: Money, as_of: NaiveDate) -> Money {
    match coupon {
        Some(c) if c.grants_discount(as_of) => subtotal.discount_amount(c.discount_rate()),
        _ => Money::zero(),
    }
}

/// Computes the amount due for a cart on `as_of`.
///
/// ## Example
/// ```rust,ignore
/// // 3 × 10000 with promo 8000 active → 24000
/// // + coupon 10% → 21600
/// let total = compute_total(&priced_cart, today);
/// ```
pub fn compute_total(cart: &PricedCart, as_of: NaiveDate) -> Money {
    let subtotal: Money = cart
        .lines
        .iter()
        .map(|line| effective_unit_price(&line.product, as_of).multiply_quantity(line.quantity))
        .sum();
    subtotal - coupon_discount(cart.coupon.as_ref(), subtotal, as_of)
}

/// Computes the full breakdown in one pass over the lines.
pub fn compute_totals(cart: &PricedCart, as_of: NaiveDate) -> CartTotals {
    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut subtotal = Money::zero();
    let mut total_quantity = 0;

    for line in &cart.lines {
        let priced = price_line(line, as_of);
        subtotal += priced.subtotal;
        total_quantity += priced.quantity;
        lines.push(priced);
    }

    let discount = coupon_discount(cart.coupon.as_ref(), subtotal, as_of);
    let coupon_code = cart
        .coupon
        .as_ref()
        .filter(|_| discount.is_positive())
        .map(|c| c.code.clone());

    CartTotals {
        item_count: lines.len(),
        lines,
        total_quantity,
        subtotal,
        discount,
        total: subtotal - discount,
        coupon_code,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
