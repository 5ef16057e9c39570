//! # Cart Service
//!
//! Cart calls made by the storefront pages.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /cart/add          add_to_cart(customer, product, qty)            │
//! │  POST /cart/{id}/coupon  apply_coupon(customer, cart, code)             │
//! │  GET  /cart/{id}         view(customer, cart)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  today = clock.today()        (read once per call)                      │
//! │  CartRepository mutation      (one transaction, owner checked)          │
//! │  load_priced + compute_totals (as_of = today)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  CartView { cart_id, attached_coupon, totals }                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use shopfront_core::cart::ensure_positive_quantity;
use shopfront_core::pricing::{compute_total, compute_totals};
use shopfront_core::{CartLimits, CartTotals, CoreError, Money, PricedCart};
use shopfront_db::Database;

use crate::clock::Clock;
use crate::error::ServiceResult;

/// A priced cart as returned to the web layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub cart_id: String,
    pub customer_id: String,
    /// Code of the attached coupon. Still shown when it no longer grants a
    /// discount; `totals.coupon_code` is only set when it does.
    pub attached_coupon: Option<String>,
    /// Date the totals were computed for.
    pub as_of: NaiveDate,
    pub totals: CartTotals,
}

impl CartView {
    fn new(priced: &PricedCart, as_of: NaiveDate) -> Self {
        CartView {
            cart_id: priced.cart.id.clone(),
            customer_id: priced.cart.customer_id.clone(),
            attached_coupon: priced.coupon.as_ref().map(|c| c.code.clone()),
            as_of,
            totals: compute_totals(priced, as_of),
        }
    }
}

/// Cart operations for one request.
#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
    limits: CartLimits,
    clock: Arc<dyn Clock>,
}

impl CartService {
    pub fn new(db: Database, limits: CartLimits, clock: Arc<dyn Clock>) -> Self {
        CartService { db, limits, clock }
    }

    /// The customer's cart, created if they have none yet.
    pub async fn cart(&self, customer_id: &str) -> ServiceResult<CartView> {
        let cart = self.db.carts().get_or_create(customer_id).await?;
        self.view_at(customer_id, &cart.id, self.clock.today()).await
    }

    /// A cart priced for today. Only its owner may read it.
    pub async fn view(&self, customer_id: &str, cart_id: &str) -> ServiceResult<CartView> {
        self.view_at(customer_id, cart_id, self.clock.today()).await
    }

    /// Amount payable for the cart today.
    pub async fn cart_total(&self, customer_id: &str, cart_id: &str) -> ServiceResult<Money> {
        let today = self.clock.today();
        let priced = self.owned_cart(customer_id, cart_id).await?;
        Ok(compute_total(&priced, today))
    }

    /// Adds to the customer's own cart, creating it on the first add.
    pub async fn add_to_cart(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> ServiceResult<CartView> {
        ensure_positive_quantity(quantity)?;
        let today = self.clock.today();

        let cart = self.db.carts().get_or_create(customer_id).await?;
        self.db
            .carts()
            .add_item(customer_id, &cart.id, product_id, quantity, self.limits)
            .await?;

        self.view_at(customer_id, &cart.id, today).await
    }

    /// Sets a line's quantity; zero removes it.
    pub async fn update_quantity(
        &self,
        customer_id: &str,
        cart_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> ServiceResult<CartView> {
        let today = self.clock.today();
        self.db
            .carts()
            .update_quantity(customer_id, cart_id, product_id, quantity, self.limits)
            .await?;

        self.view_at(customer_id, cart_id, today).await
    }

    pub async fn remove_item(&self, customer_id: &str, cart_id: &str, product_id: &str) -> ServiceResult<CartView> {
        let today = self.clock.today();
        self.db.carts().remove_item(customer_id, cart_id, product_id).await?;
        self.view_at(customer_id, cart_id, today).await
    }

    /// Empties the cart. An attached coupon stays attached.
    pub async fn clear_cart(&self, customer_id: &str, cart_id: &str) -> ServiceResult<CartView> {
        let today = self.clock.today();
        self.db.carts().clear(customer_id, cart_id).await?;
        self.view_at(customer_id, cart_id, today).await
    }

    /// Redeems `code` against the cart.
    ///
    /// ## Errors
    /// `COUPON_NOT_FOUND`, `COUPON_INACTIVE`, `COUPON_EXPIRED` or
    /// `COUPON_EXHAUSTED`; the cart and the coupon counter are unchanged.
    pub async fn apply_coupon(&self, customer_id: &str, cart_id: &str, code: &str) -> ServiceResult<CartView> {
        let today = self.clock.today();
        debug!(cart_id = %cart_id, code = %code, %today, "Applying coupon");

        self.db.carts().apply_coupon(customer_id, cart_id, code, today).await?;
        self.view_at(customer_id, cart_id, today).await
    }

    /// Detaches the coupon and gives its use back.
    pub async fn remove_coupon(&self, customer_id: &str, cart_id: &str) -> ServiceResult<CartView> {
        let today = self.clock.today();
        self.db.carts().detach_coupon(customer_id, cart_id).await?;
        self.view_at(customer_id, cart_id, today).await
    }

    async fn view_at(&self, customer_id: &str, cart_id: &str, as_of: NaiveDate) -> ServiceResult<CartView> {
        let priced = self.owned_cart(customer_id, cart_id).await?;
        Ok(CartView::new(&priced, as_of))
    }

    async fn owned_cart(&self, customer_id: &str, cart_id: &str) -> ServiceResult<PricedCart> {
        let priced = self.db.carts().load_priced(cart_id).await?;

        if !priced.cart.is_owned_by(customer_id) {
            return Err(CoreError::CartForbidden {
                cart_id: cart_id.to_string(),
                customer_id: customer_id.to_string(),
            }
            .into());
        }

        Ok(priced)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
