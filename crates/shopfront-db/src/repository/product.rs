//! # Product Repository
//!
//! Catalogue records: prices, promotion windows and stock.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ Absolute: UPDATE products SET stock = 7 WHERE id = ?            │
//! │     (two checkouts reading 10 both write 7)                         │
//! │                                                                     │
//! │  ✅ Delta + guard:                                                  │
//! │     UPDATE products SET stock = stock + ?delta                      │
//! │     WHERE id = ? AND stock + ?delta BETWEEN 0 AND MAX_STOCK         │
//! │     rows_affected == 0  →  not enough stock (or over the ceiling)   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{new_id, now};
use shopfront_core::validation::validate_new_product;
use shopfront_core::{CoreError, NewProduct, Product, ValidationError, MAX_STOCK};

const PRODUCT_COLUMNS: &str = "id, name, price, promo_price, promo_starts_on, promo_ends_on, \
     stock, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists a product.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(Validation))` - e.g. promo price not below price
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        validate_new_product(new)?;

        let ts = now();
        let product = Product {
            id: new_id(),
            name: new.name.trim().to_string(),
            price: new.price,
            promo_price: new.promo_price,
            promo_starts_on: new.promo_starts_on,
            promo_ends_on: new.promo_ends_on,
            stock: new.stock,
            is_active: true,
            created_at: ts,
            updated_at: ts,
        };

        debug!(id = %product.id, name = %product.name, price = product.price, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price, promo_price, promo_starts_on, promo_ends_on,
                stock, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.promo_price)
        .bind(product.promo_starts_on)
        .bind(product.promo_ends_on)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Lists published products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Products whose promotion is running on `as_of`.
    pub async fn list_on_promotion(&self, as_of: NaiveDate) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active = 1
              AND promo_price IS NOT NULL
              AND promo_starts_on <= ?1
              AND promo_ends_on >= ?1
            ORDER BY name
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(as_of)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Sets or clears the promotion of a product.
    ///
    /// `None` removes the promotional price and both dates.
    pub async fn set_promotion(
        &self,
        id: &str,
        promotion: Option<(i64, NaiveDate, NaiveDate)>,
    ) -> DbResult<()> {
        let (price, starts_on, ends_on) = match promotion {
            Some((price, start, end)) => (Some(price), Some(start), Some(end)),
            None => (None, None, None),
        };

        if let Some(current) = self.get_by_id(id).await? {
            let mut draft = NewProduct::new(current.name, current.price);
            draft.promo_price = price;
            draft.promo_starts_on = starts_on;
            draft.promo_ends_on = ends_on;
            validate_new_product(&draft)?;
        }

        debug!(id = %id, promo_price = ?price, "Updating promotion");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                promo_price = ?2,
                promo_starts_on = ?3,
                promo_ends_on = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(price)
        .bind(starts_on)
        .bind(ends_on)
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Adjusts stock by `delta` (positive to restock, negative to take).
    ///
    /// ## Returns
    /// * `Err(CoreError::InsufficientStock)` - Stock would go negative
    /// * `Err(CoreError::Validation)` - Stock would exceed `MAX_STOCK`
    pub async fn update_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        adjust_stock(&mut conn, id, delta).await
    }

    /// Publishes or unpublishes a product. Unpublished products stay in
    /// existing carts but cannot be added again.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting product visibility");

        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Total number of products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Loads one product on an existing connection or transaction.
pub(crate) async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Guarded stock delta. Used by `update_stock` and by checkout.
pub(crate) async fn adjust_stock(conn: &mut SqliteConnection, id: &str, delta: i64) -> DbResult<()> {
    debug!(id = %id, delta, "Updating stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2, updated_at = ?3
        WHERE id = ?1 AND stock + ?2 BETWEEN 0 AND ?4
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(now())
    .bind(MAX_STOCK)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return match fetch_product(conn, id).await? {
            Some(product) if delta > 0 => Err(ValidationError::OutOfRange {
                field: format!("stock of {}", product.name),
                min: 0,
                max: MAX_STOCK,
            }
            .into()),
            Some(product) => Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: -delta,
            }
            .into()),
            None => Err(DbError::not_found("Product", id)),
        };
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, day};

    #[tokio::test]
    async fn test_insert_and_get_with_promotion() {
        let db = fixtures::db().await;
        let new = NewProduct::new("Pagne wax", 10_000)
            .with_stock(5)
            .with_promotion(8_000, day(0), day(2));

        let inserted = db.products().insert(&new).await.unwrap();
        let fetched = db.products().get_by_id(&inserted.id).await.unwrap().unwrap();

        assert_eq!(fetched.promo_price, Some(8_000));
        assert_eq!(fetched.promo_starts_on, Some(day(0)));
        assert_eq!(fetched.promo_ends_on, Some(day(2)));
        assert_eq!(fetched.stock, 5);
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn test_promo_price_must_be_below_price() {
        let db = fixtures::db().await;
        let new = NewProduct::new("Pagne wax", 10_000).with_promotion(12_000, day(0), day(2));

        assert!(matches!(
            db.products().insert(&new).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_on_promotion_uses_inclusive_window() {
        let db = fixtures::db().await;
        let promo = fixtures::product(&db, "Sac en cuir", 25_000, 3).await;
        fixtures::product(&db, "Sandales", 9_000, 3).await;
        db.products()
            .set_promotion(&promo.id, Some((20_000, day(0), day(2))))
            .await
            .unwrap();

        assert_eq!(db.products().list_on_promotion(day(0)).await.unwrap().len(), 1);
        assert_eq!(db.products().list_on_promotion(day(2)).await.unwrap().len(), 1);
        assert!(db.products().list_on_promotion(day(3)).await.unwrap().is_empty());

        db.products().set_promotion(&promo.id, None).await.unwrap();
        assert!(db.products().list_on_promotion(day(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_cannot_go_negative() {
        let db = fixtures::db().await;
        let product = fixtures::product(&db, "Boubou", 30_000, 2).await;

        db.products().update_stock(&product.id, -2).await.unwrap();
        let err = db.products().update_stock(&product.id, -1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 0, requested: 1, .. })
        ));

        db.products().update_stock(&product.id, 4).await.unwrap();
        let fetched = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, 4);
    }

    #[tokio::test]
    async fn test_stock_and_price_ceilings() {
        let db = fixtures::db().await;
        let product = fixtures::product(&db, "Boubou", 30_000, MAX_STOCK - 1).await;

        let err = db.products().update_stock(&product.id, 2).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        let err = db.products().update_stock(&product.id, i64::MAX).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        db.products().update_stock(&product.id, 1).await.unwrap();
        let fetched = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, MAX_STOCK);

        let err = db
            .products()
            .insert(&NewProduct::new("Lot", i64::MAX / 2).with_stock(10))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_inactive_products_are_not_listed() {
        let db = fixtures::db().await;
        let product = fixtures::product(&db, "Boubou", 30_000, 2).await;
        db.products().set_active(&product.id, false).await.unwrap();

        assert!(db.products().list_active(10).await.unwrap().is_empty());
        assert!(matches!(
            db.products().set_active("missing", true).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
