//! # Order Repository
//!
//! Checkout and order status.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    lock cart, check owner                                               │
//! │    load priced cart (cart + joined lines + coupon)                      │
//! │    empty?                                   → EmptyCart                 │
//! │    compute_totals(as_of)                                                │
//! │    INSERT orders                                                        │
//! │    for each line:                                                       │
//! │        INSERT order_items (name, unit price, quantity frozen)           │
//! │        UPDATE products SET stock = stock - qty                          │
//! │            WHERE stock - qty >= 0           → InsufficientStock         │
//! │    DELETE cart_items; carts.coupon_id = NULL                            │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The coupon use taken when the coupon was attached stays consumed.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::cart::{fetch_priced_cart, lock_cart};
use crate::repository::product::adjust_stock;
use crate::repository::{new_id, now};
use shopfront_core::pricing::compute_totals;
use shopfront_core::{CoreError, Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str =
    "id, customer_id, status, subtotal, discount, total, coupon_code, created_at, updated_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Turns the cart into a pending order priced on `as_of`.
    ///
    /// ## Errors
    /// * `EmptyCart` - No line items
    /// * `CartForbidden` - Cart belongs to another customer
    /// * `ProductUnavailable` - A product was unpublished since it was added
    /// * `InsufficientStock` - Stock moved since the product was added
    ///
    /// Any error rolls the whole checkout back.
    pub async fn checkout(&self, customer_id: &str, cart_id: &str, as_of: NaiveDate) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, customer_id, cart_id).await?;

        let priced = fetch_priced_cart(&mut tx, cart_id).await?;
        if priced.is_empty() {
            return Err(CoreError::EmptyCart(cart_id.to_string()).into());
        }
        if let Some(line) = priced.lines.iter().find(|l| !l.product.is_active) {
            return Err(CoreError::ProductUnavailable(line.product.id.clone()).into());
        }

        let totals = compute_totals(&priced, as_of);
        let ts = now();
        let order = Order {
            id: new_id(),
            customer_id: customer_id.to_string(),
            status: OrderStatus::Pending,
            subtotal: totals.subtotal.amount(),
            discount: totals.discount.amount(),
            total: totals.total.amount(),
            coupon_code: totals.coupon_code.clone(),
            created_at: ts,
            updated_at: ts,
        };

        debug!(order_id = %order.id, cart_id = %cart_id, total = order.total, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_id, status, subtotal, discount, total, coupon_code, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.customer_id)
        .bind(order.status)
        .bind(order.subtotal)
        .bind(order.discount)
        .bind(order.total)
        .bind(&order.coupon_code)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in &totals.lines {
            let item = OrderItem {
                id: new_id(),
                order_id: order.id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: line.name.clone(),
                unit_price: line.unit_price.amount(),
                quantity: line.quantity,
                line_total: line.subtotal.amount(),
                promotional: line.promotional,
                created_at: ts,
            };
            insert_item(&mut tx, &item).await?;
            adjust_stock(&mut tx, &line.product_id, -line.quantity).await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE carts SET coupon_id = NULL, updated_at = ?2 WHERE id = ?1")
            .bind(cart_id)
            .bind(now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            customer_id = %customer_id,
            lines = totals.item_count,
            total = order.total,
            "Order placed"
        );
        Ok(order)
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// Items of an order in checkout order.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, name_snapshot, unit_price, quantity,
                   line_total, promotional, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// A customer's orders, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Moves an order to `next`.
    ///
    /// Only `pending → paid` and `pending → cancelled` are allowed. The
    /// update is guarded on the current status so two concurrent
    /// transitions cannot both succeed.
    pub async fn set_status(&self, order_id: &str, next: OrderStatus) -> DbResult<Order> {
        let mut conn = self.pool.acquire().await?;

        let current = fetch_order(&mut conn, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if !current.status.can_transition_to(next) {
            return Err(invalid_transition(order_id, current.status, next));
        }

        debug!(order_id = %order_id, from = %current.status, to = %next, "Updating order status");

        let result = sqlx::query(
            "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(order_id)
        .bind(next)
        .bind(now())
        .bind(current.status)
        .execute(&mut *conn)
        .await?;

        let updated = fetch_order(&mut conn, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if result.rows_affected() == 0 {
            return Err(invalid_transition(order_id, updated.status, next));
        }

        Ok(updated)
    }
}

fn invalid_transition(order_id: &str, current: OrderStatus, next: OrderStatus) -> DbError {
    CoreError::InvalidOrderStatus {
        order_id: order_id.to_string(),
        current_status: current.to_string(),
        requested: next.to_string(),
    }
    .into()
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(order)
}

async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, name_snapshot, unit_price, quantity,
            line_total, promotional, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.unit_price)
    .bind(item.quantity)
    .bind(item.line_total)
    .bind(item.promotional)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::fixtures::{self, day};
    use shopfront_core::{Cart, CartLimits, NewProduct};

    async fn setup() -> (Database, Cart, String) {
        let db = fixtures::db().await;
        let customer = fixtures::customer(&db, "awa@example.sn").await;
        let cart = db.carts().get_or_create(&customer.id).await.unwrap();
        (db, cart, customer.id)
    }

    #[tokio::test]
    async fn test_checkout_snapshots_prices_and_empties_cart() {
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
        let plain = fixtures::product(&db, "Sandales", 6_000, 4).await;
        fixtures::coupon(&db, "PROMO10", 1000, 5).await;

        let limits = CartLimits::default();
        db.carts().add_item(&customer_id, &cart.id, &promo.id, 3, limits).await.unwrap();
        db.carts().add_item(&customer_id, &cart.id, &plain.id, 1, limits).await.unwrap();
        db.carts().apply_coupon(&customer_id, &cart.id, "PROMO10", day(1)).await.unwrap();

        let order = db.orders().checkout(&customer_id, &cart.id, day(1)).await.unwrap();

        // 3 × 8000 + 6000 = 30000, minus 10%
        assert_eq!(order.subtotal, 30_000);
        assert_eq!(order.discount, 3_000);
        assert_eq!(order.total, 27_000);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.coupon_code.as_deref(), Some("PROMO10"));

        let items = db.orders().items(&order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        let wax = items.iter().find(|i| i.product_id == promo.id).unwrap();
        assert_eq!(wax.unit_price, 8_000);
        assert_eq!(wax.line_total, 24_000);
        assert!(wax.promotional);
        assert_eq!(wax.name_snapshot, "Pagne wax");

        let stock = db.products().get_by_id(&promo.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 7);

        let after = db.carts().load_priced(&cart.id).await.unwrap();
        assert!(after.is_empty());
        assert!(after.cart.coupon_id.is_none());
        // The use stays consumed
        let coupon = db.coupons().get_by_code("PROMO10").await.unwrap().unwrap();
        assert_eq!(coupon.remaining_uses, 4);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_rejected() {
        let (db, cart, customer_id) = setup().await;
        assert!(matches!(
            db.orders().checkout(&customer_id, &cart.id, day(0)).await,
            Err(DbError::Domain(CoreError::EmptyCart(_)))
        ));
    }

    #[tokio::test]
    async fn test_stock_shortage_rolls_back_checkout() {
        let (db, cart, customer_id) = setup().await;
        let a = fixtures::product(&db, "Pagne wax", 10_000, 5).await;
        let b = fixtures::product(&db, "Sandales", 6_000, 2).await;
        let limits = CartLimits::default();
        db.carts().add_item(&customer_id, &cart.id, &a.id, 2, limits).await.unwrap();
        db.carts().add_item(&customer_id, &cart.id, &b.id, 2, limits).await.unwrap();

        // Someone else bought the sandals meanwhile
        db.products().update_stock(&b.id, -1).await.unwrap();

        let err = db.orders().checkout(&customer_id, &cart.id, day(0)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        assert!(db.orders().list_for_customer(&customer_id).await.unwrap().is_empty());
        assert_eq!(db.products().get_by_id(&a.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(db.carts().items(&cart.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let (db, cart, customer_id) = setup().await;
        let p = fixtures::product(&db, "Pagne wax", 10_000, 5).await;
        db.carts()
            .add_item(&customer_id, &cart.id, &p.id, 1, CartLimits::default())
            .await
            .unwrap();
        let order = db.orders().checkout(&customer_id, &cart.id, day(0)).await.unwrap();

        let paid = db.orders().set_status(&order.id, OrderStatus::Paid).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);

        let err = db
            .orders()
            .set_status(&order.id, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidOrderStatus { .. })));
    }

    #[tokio::test]
    async fn test_deleting_customer_removes_orders() {
        let (db, cart, customer_id) = setup().await;
        let p = fixtures::product(&db, "Pagne wax", 10_000, 5).await;
        db.carts()
            .add_item(&customer_id, &cart.id, &p.id, 1, CartLimits::default())
            .await
            .unwrap();
        let order = db.orders().checkout(&customer_id, &cart.id, day(0)).await.unwrap();

        db.customers().delete(&customer_id).await.unwrap();

        assert!(db.orders().get_by_id(&order.id).await.unwrap().is_none());
        assert!(db.orders().items(&order.id).await.unwrap().is_empty());
    }
}
