//! # Coupon Repository
//!
//! Coupon records and the guarded use counter.
//!
//! ## Atomic Redemption
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two carts apply "LAST1" (remaining_uses = 1) at the same time          │
//! │                                                                         │
//! │  Cart A                              Cart B                             │
//! │  UPDATE coupons                      UPDATE coupons                     │
//! │    SET remaining_uses = uses - 1       (waits for A's write lock)      │
//! │  WHERE code = 'LAST1'                       │                           │
//! │    AND is_active = 1                        │                           │
//! │    AND expires_on >= :as_of                 │                           │
//! │    AND remaining_uses > 0                   │                           │
//! │  → 1 row, attach, COMMIT  ─────────────────►│                           │
//! │                                       → 0 rows (uses = 0)               │
//! │                                       → re-read → CouponExhausted      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The check and the decrement are one statement, so no interleaving can
//! take the counter below zero.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{new_id, now};
use shopfront_core::coupon::check_coupon;
use shopfront_core::validation::validate_new_coupon;
use shopfront_core::{Coupon, CouponError, NewCoupon};

const COUPON_COLUMNS: &str =
    "id, code, label, is_active, expires_on, discount_bps, remaining_uses, created_at";

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Creates a coupon.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, new: &NewCoupon) -> DbResult<Coupon> {
        validate_new_coupon(new)?;

        let coupon = Coupon {
            id: new_id(),
            code: new.code.clone(),
            label: new.label.trim().to_string(),
            is_active: new.is_active,
            expires_on: new.expires_on,
            discount_bps: new.discount_bps,
            remaining_uses: new.remaining_uses,
            created_at: now(),
        };

        debug!(code = %coupon.code, bps = coupon.discount_bps, uses = coupon.remaining_uses, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, label, is_active, expires_on, discount_bps, remaining_uses, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(&coupon.label)
        .bind(coupon.is_active)
        .bind(coupon.expires_on)
        .bind(coupon.discount_bps)
        .bind(coupon.remaining_uses)
        .bind(coupon.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &coupon.code),
            other => other,
        })?;

        Ok(coupon)
    }

    /// Gets a coupon by its exact, case-sensitive code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_code(&mut conn, code).await
    }

    /// Gets a coupon by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Switches a coupon on or off.
    pub async fn set_active(&self, code: &str, active: bool) -> DbResult<()> {
        debug!(code = %code, active, "Setting coupon state");

        let result = sqlx::query("UPDATE coupons SET is_active = ?2 WHERE code = ?1")
            .bind(code)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CouponError::NotFound(code.to_string()).into());
        }

        Ok(())
    }
}

pub(crate) async fn fetch_by_code(conn: &mut SqliteConnection, code: &str) -> DbResult<Option<Coupon>> {
    let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE code = ?1");
    let coupon = sqlx::query_as::<_, Coupon>(&sql)
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(coupon)
}

pub(crate) async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Coupon>> {
    let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE id = ?1");
    let coupon = sqlx::query_as::<_, Coupon>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(coupon)
}

/// Takes one use of `code` if it is redeemable on `as_of`.
///
/// Must run inside the caller's transaction. On failure nothing is
/// written and the precise reason is returned.
pub(crate) async fn consume_use(
    conn: &mut SqliteConnection,
    code: &str,
    as_of: NaiveDate,
) -> DbResult<Coupon> {
    let result = sqlx::query(
        r#"
        UPDATE coupons
        SET remaining_uses = remaining_uses - 1
        WHERE code = ?1
          AND is_active = 1
          AND expires_on >= ?2
          AND remaining_uses > 0
        "#,
    )
    .bind(code)
    .bind(as_of)
    .execute(&mut *conn)
    .await?;

    let coupon = fetch_by_code(conn, code).await?;

    if result.rows_affected() == 0 {
        let err = match coupon {
            None => CouponError::NotFound(code.to_string()),
            Some(ref c) => check_coupon(c, as_of)
                .err()
                .unwrap_or_else(|| CouponError::Exhausted(code.to_string())),
        };
        warn!(code = %code, %as_of, reason = %err, "Coupon redemption rejected");
        return Err(err.into());
    }

    let coupon = coupon.ok_or_else(|| DbError::not_found("Coupon", code))?;
    debug!(code = %code, remaining = coupon.remaining_uses, "Coupon use consumed");
    Ok(coupon)
}

/// Gives back one use of the coupon with `coupon_id`.
pub(crate) async fn restore_use(conn: &mut SqliteConnection, coupon_id: &str) -> DbResult<()> {
    debug!(coupon_id = %coupon_id, "Restoring coupon use");

    sqlx::query("UPDATE coupons SET remaining_uses = remaining_uses + 1 WHERE id = ?1")
        .bind(coupon_id)
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
    use crate::repository::fixtures::{self, day};
    use shopfront_core::DiscountRate;

    async fn redeem(db: &crate::Database, code: &str, as_of: NaiveDate) -> DbResult<Coupon> {
        let mut tx = db.pool().begin().await.unwrap();
        let coupon = consume_use(&mut tx, code, as_of).await?;
        tx.commit().await.unwrap();
        Ok(coupon)
    }

    #[tokio::test]
    async fn test_insert_and_lookup_is_case_sensitive() {
        let db = fixtures::db().await;
        fixtures::coupon(&db, "PROMO10", 1000, 10).await;

        assert!(db.coupons().get_by_code("PROMO10").await.unwrap().is_some());
        assert!(db.coupons().get_by_code("promo10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = fixtures::db().await;
        fixtures::coupon(&db, "PROMO10", 1000, 10).await;

        let err = db
            .coupons()
            .insert(&NewCoupon::new("PROMO10", DiscountRate::from_bps(500), day(9), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_consume_decrements_once() {
        let db = fixtures::db().await;
        fixtures::coupon(&db, "PROMO10", 1000, 10).await;

        let coupon = redeem(&db, "PROMO10", day(0)).await.unwrap();
        assert_eq!(coupon.remaining_uses, 9);
    }

    #[tokio::test]
    async fn test_consume_reports_precise_reason() {
        let db = fixtures::db().await;
        fixtures::coupon(&db, "LAST", 1000, 0).await;
        fixtures::coupon(&db, "OFF", 1000, 5).await;
        db.coupons().set_active("OFF", false).await.unwrap();

        let reason = |r: DbResult<Coupon>| r.unwrap_err().as_coupon_error().cloned();

        assert_eq!(
            reason(redeem(&db, "NOPE", day(0)).await),
            Some(CouponError::NotFound("NOPE".to_string()))
        );
        assert_eq!(
            reason(redeem(&db, "LAST", day(0)).await),
            Some(CouponError::Exhausted("LAST".to_string()))
        );
        assert_eq!(
            reason(redeem(&db, "OFF", day(0)).await),
            Some(CouponError::Inactive("OFF".to_string()))
        );
        assert!(matches!(
            reason(redeem(&db, "LAST", day(31)).await),
            Some(CouponError::Expired { .. })
        ));

        // Nothing was written by the failures
        let off = db.coupons().get_by_code("OFF").await.unwrap().unwrap();
        assert_eq!(off.remaining_uses, 5);
    }

    #[tokio::test]
    async fn test_restore_use() {
        let db = fixtures::db().await;
        let coupon = fixtures::coupon(&db, "PROMO10", 1000, 1).await;
        redeem(&db, "PROMO10", day(0)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        restore_use(&mut conn, &coupon.id).await.unwrap();
        drop(conn);

        let fetched = db.coupons().get_by_id(&coupon.id).await.unwrap().unwrap();
        assert_eq!(fetched.remaining_uses, 1);
    }
}
