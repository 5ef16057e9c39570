//! # Customer Repository
//!
//! Customer accounts. Deleting a customer removes everything they own
//! through `ON DELETE CASCADE`:
//!
//! ```text
//! customers ──► carts ──► cart_items
//!     └───────► orders ──► order_items
//! ```

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{new_id, now};
use shopfront_core::validation::validate_new_customer;
use shopfront_core::{Customer, NewCustomer};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Registers a customer.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn insert(&self, new: &NewCustomer) -> DbResult<Customer> {
        validate_new_customer(new)?;

        let customer = Customer {
            id: new_id(),
            name: new.name.trim().to_string(),
            email: new.email.trim().to_string(),
            phone: new.phone.clone(),
            city: new.city.clone(),
            address: new.address.clone(),
            created_at: now(),
        };

        debug!(id = %customer.id, email = %customer.email, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, city, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.city)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &customer.email),
            other => other,
        })?;

        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, city, address, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by email (exact match).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, city, address, created_at
            FROM customers
            WHERE email = ?1
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Deletes a customer and, by cascade, their cart, line items and orders.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id = %id, "Customer deleted");
        Ok(())
    }

    /// Total number of customers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
