//! # Cart Repository
//!
//! Carts, their line items, and coupon attachment.
//!
//! ## Mutation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    UPDATE carts SET updated_at = now WHERE id = :cart   ← write lock   │
//! │    SELECT cart → owner check (CartForbidden)                           │
//! │    read product / line / coupon                                        │
//! │    shopfront-core decides (quantity rules, coupon rules)               │
//! │    write                                                                │
//! │  COMMIT          (any error: dropped transaction rolls back)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Taking the write lock first means a competing request waits instead of
//! working from a stale read.
//!
//! ## Loading for Pricing
//! [`CartRepository::load_priced`] issues at most three queries however many
//! lines the cart has: the cart row, one join of line items with their
//! products, and the attached coupon.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::coupon::{consume_use, fetch_by_id as fetch_coupon, restore_use};
use crate::repository::product::fetch_product;
use crate::repository::{new_id, now};
use shopfront_core::cart::{ensure_positive_quantity, quantity_after_add, quantity_after_update};
use shopfront_core::coupon::check_coupon;
use shopfront_core::{
    Cart, CartLimits, CartLine, CartLineItem, CoreError, CouponError, PricedCart, Product,
};

const CART_COLUMNS: &str = "id, customer_id, coupon_id, created_at, updated_at";

/// Line item joined with its product, as read for pricing.
#[derive(sqlx::FromRow)]
struct LineRow {
    line_id: String,
    quantity: i64,
    #[sqlx(flatten)]
    product: Product,
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Returns the customer's cart, creating it on first use.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Customer doesn't exist
    pub async fn get_or_create(&self, customer_id: &str) -> DbResult<Cart> {
        if let Some(cart) = self.get_for_customer(customer_id).await? {
            return Ok(cart);
        }

        let ts = now();
        let id = new_id();
        debug!(customer_id = %customer_id, cart_id = %id, "Creating cart");

        sqlx::query(
            r#"
            INSERT INTO carts (id, customer_id, coupon_id, created_at, updated_at)
            VALUES (?1, ?2, NULL, ?3, ?3)
            ON CONFLICT (customer_id) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(customer_id)
        .bind(ts)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::ForeignKeyViolation { .. } => DbError::not_found("Customer", customer_id),
            other => other,
        })?;

        // A concurrent request may have created it first
        self.get_for_customer(customer_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cart", customer_id))
    }

    /// Gets a cart by ID.
    pub async fn get_by_id(&self, cart_id: &str) -> DbResult<Option<Cart>> {
        let mut conn = self.pool.acquire().await?;
        fetch_cart(&mut conn, cart_id).await
    }

    /// Gets the customer's cart, if they have one.
    pub async fn get_for_customer(&self, customer_id: &str) -> DbResult<Option<Cart>> {
        let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE customer_id = ?1");
        let cart = sqlx::query_as::<_, Cart>(&sql)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(cart)
    }

    /// Raw line items, oldest first.
    pub async fn items(&self, cart_id: &str) -> DbResult<Vec<CartLineItem>> {
        let items = sqlx::query_as::<_, CartLineItem>(
            r#"
            SELECT id, cart_id, product_id, quantity, added_at
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY added_at, id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Loads a cart with everything needed to price it.
    pub async fn load_priced(&self, cart_id: &str) -> DbResult<PricedCart> {
        let mut conn = self.pool.acquire().await?;
        fetch_priced_cart(&mut conn, cart_id).await
    }

    /// Adds `quantity` of a product, merging into an existing line.
    ///
    /// ## Errors
    /// * `InvalidQuantity` - quantity ≤ 0
    /// * `CartForbidden` - cart belongs to another customer
    /// * `ProductNotFound` / `ProductUnavailable`
    /// * `CartTooLarge` / `QuantityTooLarge` / `InsufficientStock`
    pub async fn add_item(
        &self,
        customer_id: &str,
        cart_id: &str,
        product_id: &str,
        quantity: i64,
        limits: CartLimits,
    ) -> DbResult<CartLineItem> {
        ensure_positive_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, customer_id, cart_id).await?;

        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        let existing = line_quantity(&mut tx, cart_id, product_id).await?;
        let distinct_lines = line_count(&mut tx, cart_id).await?;

        let new_quantity = quantity_after_add(&product, existing, distinct_lines, quantity, limits)?;

        debug!(
            cart_id = %cart_id,
            product_id = %product_id,
            added = quantity,
            quantity = new_quantity,
            "Adding to cart"
        );

        let line = upsert_line(&mut tx, cart_id, product_id, new_quantity).await?;
        tx.commit().await?;
        Ok(line)
    }

    /// Sets a line's quantity. Zero removes the line.
    ///
    /// ## Returns
    /// * `Ok(Some(line))` - Updated line
    /// * `Ok(None)` - Line removed
    /// * `Err(CoreError::NotInCart)` - Product not in the cart
    pub async fn update_quantity(
        &self,
        customer_id: &str,
        cart_id: &str,
        product_id: &str,
        quantity: i64,
        limits: CartLimits,
    ) -> DbResult<Option<CartLineItem>> {
        if quantity < 0 {
            return Err(CoreError::InvalidQuantity { quantity }.into());
        }

        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, customer_id, cart_id).await?;

        if line_quantity(&mut tx, cart_id, product_id).await?.is_none() {
            return Err(CoreError::NotInCart(product_id.to_string()).into());
        }
        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let line = match quantity_after_update(&product, quantity, limits)? {
            Some(new_quantity) => {
                debug!(cart_id = %cart_id, product_id = %product_id, quantity = new_quantity, "Updating cart line");
                Some(upsert_line(&mut tx, cart_id, product_id, new_quantity).await?)
            }
            None => {
                debug!(cart_id = %cart_id, product_id = %product_id, "Removing cart line");
                delete_line(&mut tx, cart_id, product_id).await?;
                None
            }
        };

        tx.commit().await?;
        Ok(line)
    }

    /// Removes a product from the cart.
    pub async fn remove_item(&self, customer_id: &str, cart_id: &str, product_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, customer_id, cart_id).await?;

        if !delete_line(&mut tx, cart_id, product_id).await? {
            return Err(CoreError::NotInCart(product_id.to_string()).into());
        }

        debug!(cart_id = %cart_id, product_id = %product_id, "Removed from cart");
        tx.commit().await?;
        Ok(())
    }

    /// Removes every line. The attached coupon stays attached.
    pub async fn clear(&self, customer_id: &str, cart_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, customer_id, cart_id).await?;

        let removed = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        debug!(cart_id = %cart_id, removed, "Cart cleared");
        tx.commit().await?;
        Ok(())
    }

    /// Attaches a coupon and consumes one of its uses, atomically.
    ///
    /// ## Flow
    /// ```text
    /// same code already attached?  → still grants a discount? Ok(cart), no decrement
    ///                                otherwise the reason (Inactive / Expired)
    /// guarded decrement            → NotFound / Inactive / Expired / Exhausted
    /// other coupon attached?       → give its use back
    /// set carts.coupon_id
    /// ```
    ///
    /// On error the cart and every coupon counter are left as they were.
    pub async fn apply_coupon(
        &self,
        customer_id: &str,
        cart_id: &str,
        code: &str,
        as_of: NaiveDate,
    ) -> DbResult<Cart> {
        let mut tx = self.pool.begin().await?;
        let cart = lock_cart(&mut tx, customer_id, cart_id).await?;

        let attached = match cart.coupon_id.as_deref() {
            Some(id) => fetch_coupon(&mut tx, id).await?,
            None => None,
        };

        if let Some(current) = attached.as_ref().filter(|c| c.code == code) {
            if !current.grants_discount(as_of) {
                let err = check_coupon(current, as_of)
                    .err()
                    .unwrap_or_else(|| CouponError::Exhausted(code.to_string()));
                return Err(err.into());
            }
            debug!(cart_id = %cart_id, code = %code, "Coupon already attached");
            return Ok(cart);
        }

        let coupon = consume_use(&mut tx, code, as_of).await?;

        if let Some(previous) = attached {
            restore_use(&mut tx, &previous.id).await?;
            info!(cart_id = %cart_id, replaced = %previous.code, code = %code, "Coupon replaced");
        }

        let cart = set_coupon(&mut tx, cart_id, Some(&coupon.id)).await?;
        tx.commit().await?;

        info!(cart_id = %cart_id, code = %code, remaining = coupon.remaining_uses, "Coupon applied");
        Ok(cart)
    }

    /// Detaches the cart's coupon and gives its use back.
    ///
    /// Detaching from a cart without a coupon is a no-op.
    pub async fn detach_coupon(&self, customer_id: &str, cart_id: &str) -> DbResult<Cart> {
        let mut tx = self.pool.begin().await?;
        let cart = lock_cart(&mut tx, customer_id, cart_id).await?;

        let Some(coupon_id) = cart.coupon_id.clone() else {
            return Ok(cart);
        };

        restore_use(&mut tx, &coupon_id).await?;
        let cart = set_coupon(&mut tx, cart_id, None).await?;
        tx.commit().await?;

        info!(cart_id = %cart_id, coupon_id = %coupon_id, "Coupon detached");
        Ok(cart)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

pub(crate) async fn fetch_cart(conn: &mut SqliteConnection, cart_id: &str) -> DbResult<Option<Cart>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE id = ?1");
    let cart = sqlx::query_as::<_, Cart>(&sql)
        .bind(cart_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(cart)
}

/// Takes the write lock on a cart and checks who owns it.
///
/// Must be the first statement of the transaction.
pub(crate) async fn lock_cart(
    conn: &mut SqliteConnection,
    customer_id: &str,
    cart_id: &str,
) -> DbResult<Cart> {
    let result = sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
        .bind(cart_id)
        .bind(now())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Cart", cart_id));
    }

    let cart = fetch_cart(conn, cart_id)
        .await?
        .ok_or_else(|| DbError::not_found("Cart", cart_id))?;

    if !cart.is_owned_by(customer_id) {
        return Err(CoreError::CartForbidden {
            cart_id: cart_id.to_string(),
            customer_id: customer_id.to_string(),
        }
        .into());
    }

    Ok(cart)
}

/// Loads the cart, its lines joined with products, and its coupon.
pub(crate) async fn fetch_priced_cart(conn: &mut SqliteConnection, cart_id: &str) -> DbResult<PricedCart> {
    let cart = fetch_cart(conn, cart_id)
        .await?
        .ok_or_else(|| DbError::not_found("Cart", cart_id))?;

    let rows = sqlx::query_as::<_, LineRow>(
        r#"
        SELECT
            ci.id AS line_id,
            ci.quantity,
            p.id, p.name, p.price, p.promo_price, p.promo_starts_on, p.promo_ends_on,
            p.stock, p.is_active, p.created_at, p.updated_at
        FROM cart_items ci
        INNER JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = ?1
        ORDER BY ci.added_at, ci.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    let coupon = match cart.coupon_id.as_deref() {
        Some(id) => fetch_coupon(conn, id).await?,
        None => None,
    };

    let lines = rows
        .into_iter()
        .map(|row| CartLine {
            line_id: row.line_id,
            product: row.product,
            quantity: row.quantity,
        })
        .collect();

    Ok(PricedCart { cart, lines, coupon })
}

async fn line_quantity(conn: &mut SqliteConnection, cart_id: &str, product_id: &str) -> DbResult<Option<i64>> {
    let quantity: Option<i64> =
        sqlx::query_scalar("SELECT quantity FROM cart_items WHERE cart_id = ?1 AND product_id = ?2")
            .bind(cart_id)
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(quantity)
}

async fn line_count(conn: &mut SqliteConnection, cart_id: &str) -> DbResult<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?1")
        .bind(cart_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count.max(0) as usize)
}

async fn upsert_line(
    conn: &mut SqliteConnection,
    cart_id: &str,
    product_id: &str,
    quantity: i64,
) -> DbResult<CartLineItem> {
    let line = sqlx::query_as::<_, CartLineItem>(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, quantity, added_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = excluded.quantity
        RETURNING id, cart_id, product_id, quantity, added_at
        "#,
    )
    .bind(new_id())
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(line)
}

/// Returns whether a line was removed.
async fn delete_line(conn: &mut SqliteConnection, cart_id: &str, product_id: &str) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1 AND product_id = ?2")
        .bind(cart_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

async fn set_coupon(conn: &mut SqliteConnection, cart_id: &str, coupon_id: Option<&str>) -> DbResult<Cart> {
    let sql = format!(
        "UPDATE carts SET coupon_id = ?2, updated_at = ?3 WHERE id = ?1 RETURNING {CART_COLUMNS}"
    );
    let cart = sqlx::query_as::<_, Cart>(&sql)
        .bind(cart_id)
        .bind(coupon_id)
        .bind(now())
        .fetch_one(&mut *conn)
        .await?;

    Ok(cart)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures::{self, day};
    use shopfront_core::pricing::compute_total;
    use shopfront_core::{Money, NewProduct};

    async fn setup() -> (Database, Cart, String) {
        let db = fixtures::db().await;
        let customer = fixtures::customer(&db, "awa@example.sn").await;
        let cart = db.carts().get_or_create(&customer.id).await.unwrap();
        (db, cart, customer.id)
    }

    fn limits() -> CartLimits {
        CartLimits::default()
    }

    async fn remaining(db: &Database, code: &str) -> i64 {
        db.coupons().get_by_code(code).await.unwrap().unwrap().remaining_uses
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (db, cart, customer_id) = setup().await;
        let again = db.carts().get_or_create(&customer_id).await.unwrap();
        assert_eq!(cart.id, again.id);

        assert!(matches!(
            db.carts().get_or_create("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_merges_into_existing_line() {
        let (db, cart, customer_id) = setup().await;
        let product = fixtures::product(&db, "Pagne wax", 10_000, 10).await;

        db.carts().add_item(&customer_id, &cart.id, &product.id, 2, limits()).await.unwrap();
        let line = db.carts().add_item(&customer_id, &cart.id, &product.id, 3, limits()).await.unwrap();

        assert_eq!(line.quantity, 5);
        assert_eq!(db.carts().items(&cart.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_negative_quantity_leaves_cart_unchanged() {
        let (db, cart, customer_id) = setup().await;
        let product = fixtures::product(&db, "Pagne wax", 10_000, 10).await;

        let err = db
            .carts()
            .add_item(&customer_id, &cart.id, &product.id, -5, limits())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidQuantity { quantity: -5 })));
        assert!(db.carts().items(&cart.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_customers_cart_is_forbidden() {
        let (db, cart, _) = setup().await;
        let intruder = fixtures::customer(&db, "moussa@example.sn").await;
        let product = fixtures::product(&db, "Pagne wax", 10_000, 10).await;

        let err = db
            .carts()
            .add_item(&intruder.id, &cart.id, &product.id, 1, limits())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CartForbidden { .. })));
        assert!(db.carts().items(&cart.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_and_availability_checked() {
        let (db, cart, customer_id) = setup().await;
        let scarce = fixtures::product(&db, "Boubou brodé", 45_000, 1).await;
        let hidden = fixtures::product(&db, "Ancien modèle", 5_000, 9).await;
        db.products().set_active(&hidden.id, false).await.unwrap();

        assert!(matches!(
            db.carts().add_item(&customer_id, &cart.id, &scarce.id, 2, limits()).await,
            Err(DbError::Domain(CoreError::InsufficientStock { .. }))
        ));
        assert!(matches!(
            db.carts().add_item(&customer_id, &cart.id, &hidden.id, 1, limits()).await,
            Err(DbError::Domain(CoreError::ProductUnavailable(_)))
        ));
        assert!(matches!(
            db.carts().add_item(&customer_id, &cart.id, "missing", 1, limits()).await,
            Err(DbError::Domain(CoreError::ProductNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_quantity_zero_removes_line() {
        let (db, cart, customer_id) = setup().await;
        let product = fixtures::product(&db, "Pagne wax", 10_000, 10).await;
        db.carts().add_item(&customer_id, &cart.id, &product.id, 2, limits()).await.unwrap();

        let line = db
            .carts()
            .update_quantity(&customer_id, &cart.id, &product.id, 7, limits())
            .await
            .unwrap();
        assert_eq!(line.map(|l| l.quantity), Some(7));

        let removed = db
            .carts()
            .update_quantity(&customer_id, &cart.id, &product.id, 0, limits())
            .await
            .unwrap();
        assert!(removed.is_none());
        assert!(db.carts().items(&cart.id).await.unwrap().is_empty());

        assert!(matches!(
            db.carts().update_quantity(&customer_id, &cart.id, &product.id, 1, limits()).await,
            Err(DbError::Domain(CoreError::NotInCart(_)))
        ));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (db, cart, customer_id) = setup().await;
        let a = fixtures::product(&db, "Pagne wax", 10_000, 10).await;
        let b = fixtures::product(&db, "Sandales", 9_000, 10).await;
        db.carts().add_item(&customer_id, &cart.id, &a.id, 1, limits()).await.unwrap();
        db.carts().add_item(&customer_id, &cart.id, &b.id, 1, limits()).await.unwrap();

        db.carts().remove_item(&customer_id, &cart.id, &a.id).await.unwrap();
        assert_eq!(db.carts().items(&cart.id).await.unwrap().len(), 1);
        assert!(matches!(
            db.carts().remove_item(&customer_id, &cart.id, &a.id).await,
            Err(DbError::Domain(CoreError::NotInCart(_)))
        ));

        db.carts().clear(&customer_id, &cart.id).await.unwrap();
        assert!(db.carts().items(&cart.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_priced_joins_every_line() {
        let (db, cart, customer_id) = setup().await;
        let promo = db
            .products()
            .insert(
                &NewProduct::new("Pagne wax", 10_000)
                    .with_stock(10)
                    .with_promotion(8_000, day(0), day(2)),
            )
            .await
            .unwrap();
        db.carts().add_item(&customer_id, &cart.id, &promo.id, 3, limits()).await.unwrap();

        let mut expected = 24_000;
        for i in 0..40 {
            let p = fixtures::product(&db, &format!("Article {i}"), 1_000 + i, 5).await;
            db.carts().add_item(&customer_id, &cart.id, &p.id, 1, limits()).await.unwrap();
            expected += 1_000 + i;
        }

        let priced = db.carts().load_priced(&cart.id).await.unwrap();
        assert_eq!(priced.lines.len(), 41);
        assert_eq!(priced.quantity_of(&promo.id), Some(3));
        assert_eq!(compute_total(&priced, day(1)), Money::from_amount(expected));
    }

    #[tokio::test]
    async fn test_apply_coupon_discounts_and_decrements() {
        // total 100000, 10%, remaining 10 → 90000, remaining 9
        let (db, cart, customer_id) = setup().await;
        let product = fixtures::product(&db, "Boubou brodé", 100_000, 5).await;
        fixtures::coupon(&db, "PROMO10", 1000, 10).await;
        db.carts().add_item(&customer_id, &cart.id, &product.id, 1, limits()).await.unwrap();

        let updated = db
            .carts()
            .apply_coupon(&customer_id, &cart.id, "PROMO10", day(0))
            .await
            .unwrap();
        assert!(updated.coupon_id.is_some());

        let priced = db.carts().load_priced(&cart.id).await.unwrap();
        assert_eq!(compute_total(&priced, day(0)).amount(), 90_000);
        assert_eq!(remaining(&db, "PROMO10").await, 9);
    }

    #[tokio::test]
    async fn test_expired_coupon_leaves_cart_unchanged() {
        let (db, cart, customer_id) = setup().await;
        let product = fixtures::product(&db, "Boubou brodé", 100_000, 5).await;
        db.carts().add_item(&customer_id, &cart.id, &product.id, 1, limits()).await.unwrap();
        db.coupons()
            .insert(&shopfront_core::NewCoupon::new(
                "OLD",
                shopfront_core::DiscountRate::from_bps(1000),
                day(0),
                5,
            ))
            .await
            .unwrap();

        let err = db
            .carts()
            .apply_coupon(&customer_id, &cart.id, "OLD", day(1))
            .await
            .unwrap_err();
        assert!(matches!(err.as_coupon_error(), Some(CouponError::Expired { .. })));

        let priced = db.carts().load_priced(&cart.id).await.unwrap();
        assert!(priced.cart.coupon_id.is_none());
        assert_eq!(compute_total(&priced, day(1)).amount(), 100_000);
        assert_eq!(remaining(&db, "OLD").await, 5);
    }

    #[tokio::test]
    async fn test_reapply_same_coupon_is_idempotent() {
        let (db, cart, customer_id) = setup().await;
        fixtures::coupon(&db, "PROMO10", 1000, 10).await;

        db.carts().apply_coupon(&customer_id, &cart.id, "PROMO10", day(0)).await.unwrap();
        db.carts().apply_coupon(&customer_id, &cart.id, "PROMO10", day(0)).await.unwrap();

        assert_eq!(remaining(&db, "PROMO10").await, 9);
    }

    #[tokio::test]
    async fn test_replacing_coupon_restores_previous_use() {
        let (db, cart, customer_id) = setup().await;
        fixtures::coupon(&db, "PROMO10", 1000, 10).await;
        let second = fixtures::coupon(&db, "PROMO20", 2000, 3).await;

        db.carts().apply_coupon(&customer_id, &cart.id, "PROMO10", day(0)).await.unwrap();
        let cart = db.carts().apply_coupon(&customer_id, &cart.id, "PROMO20", day(0)).await.unwrap();

        assert_eq!(cart.coupon_id.as_deref(), Some(second.id.as_str()));
        assert_eq!(remaining(&db, "PROMO10").await, 10);
        assert_eq!(remaining(&db, "PROMO20").await, 2);
    }

    #[tokio::test]
    async fn test_failed_replacement_keeps_current_coupon() {
        let (db, cart, customer_id) = setup().await;
        let first = fixtures::coupon(&db, "PROMO10", 1000, 10).await;
        fixtures::coupon(&db, "EMPTY", 1000, 0).await;

        db.carts().apply_coupon(&customer_id, &cart.id, "PROMO10", day(0)).await.unwrap();
        let err = db
            .carts()
            .apply_coupon(&customer_id, &cart.id, "EMPTY", day(0))
            .await
            .unwrap_err();
        assert_eq!(err.as_coupon_error(), Some(&CouponError::Exhausted("EMPTY".to_string())));

        let current = db.carts().get_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(current.coupon_id.as_deref(), Some(first.id.as_str()));
        assert_eq!(remaining(&db, "PROMO10").await, 9);
    }

    #[tokio::test]
    async fn test_detach_restores_use() {
        let (db, cart, customer_id) = setup().await;
        fixtures::coupon(&db, "PROMO10", 1000, 1).await;

        db.carts().apply_coupon(&customer_id, &cart.id, "PROMO10", day(0)).await.unwrap();
        assert_eq!(remaining(&db, "PROMO10").await, 0);

        let cart = db.carts().detach_coupon(&customer_id, &cart.id).await.unwrap();
        assert!(cart.coupon_id.is_none());
        assert_eq!(remaining(&db, "PROMO10").await, 1);

        // No-op the second time
        db.carts().detach_coupon(&customer_id, &cart.id).await.unwrap();
        assert_eq!(remaining(&db, "PROMO10").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redemption_across_connections() {
        let path = std::env::temp_dir().join(format!("shopfront-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();

        let mut carts = Vec::new();
        for i in 0..4 {
            let customer = fixtures::customer(&db, &format!("c{i}@example.sn")).await;
            let cart = db.carts().get_or_create(&customer.id).await.unwrap();
            carts.push((customer.id, cart.id));
        }
        fixtures::coupon(&db, "DUO", 1000, 2).await;

        let handles: Vec<_> = carts
            .into_iter()
            .map(|(customer_id, cart_id)| {
                let repo = db.carts();
                tokio::spawn(async move { repo.apply_coupon(&customer_id, &cart_id, "DUO", day(0)).await })
            })
            .collect();

        let mut successes = 0;
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) if e.as_coupon_error() == Some(&CouponError::Exhausted("DUO".to_string())) => {
                    exhausted += 1
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 2);
        assert_eq!(exhausted, 2);
        assert_eq!(remaining(&db, "DUO").await, 0);

        db.close().await;
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }

    #[tokio::test]
    async fn test_deleting_customer_cascades_to_cart() {
        let (db, cart, customer_id) = setup().await;
        let product = fixtures::product(&db, "Pagne wax", 10_000, 10).await;
        db.carts().add_item(&customer_id, &cart.id, &product.id, 2, limits()).await.unwrap();

        db.customers().delete(&customer_id).await.unwrap();

        assert!(db.carts().get_by_id(&cart.id).await.unwrap().is_none());
        assert!(db.carts().items(&cart.id).await.unwrap().is_empty());
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_some());
    }
}
