//! # Service Error Type
//!
//! The one error the web layer sees.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CouponError ──┐                                                        │
//! │                ├──► CoreError ──► DbError ──► ServiceError ──► web      │
//! │  ValidationError┘                               { code, message }       │
//! │                                                                         │
//! │  Storage failures are logged here with their detail and reach the      │
//! │  caller as a generic DATABASE_ERROR.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "COUPON_EXPIRED",
//!   "message": "Coupon SOLDES expired on 2026-03-01"
//! }
//! ```

use serde::Serialize;
use shopfront_core::{CoreError, CouponError};
use shopfront_db::DbError;

use crate::config::ConfigError;

/// Error returned by every service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for service responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Cart or order of another customer (403)
    Forbidden,

    /// No coupon with this code (404)
    CouponNotFound,

    /// Coupon switched off (422)
    CouponInactive,

    /// Coupon past its expiry date (422)
    CouponExpired,

    /// Coupon has no uses left (409)
    CouponExhausted,

    /// Not enough stock (409)
    InsufficientStock,

    /// Cart limits or unavailable product (422)
    CartError,

    /// Checkout of an empty cart (422)
    EmptyCart,

    /// Disallowed order status change (409)
    InvalidOrderStatus,

    /// Database operation failed (500)
    DatabaseError,

    /// Configuration could not be loaded (500)
    ConfigError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status the web layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound | ErrorCode::CouponNotFound => 404,
            ErrorCode::CouponExhausted | ErrorCode::InsufficientStock | ErrorCode::InvalidOrderStatus => {
                409
            }
            ErrorCode::CouponInactive
            | ErrorCode::CouponExpired
            | ErrorCode::CartError
            | ErrorCode::EmptyCart => 422,
            ErrorCode::DatabaseError | ErrorCode::ConfigError | ErrorCode::Internal => 500,
        }
    }
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ServiceError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Forbidden, message)
    }
}

impl From<CouponError> for ServiceError {
    fn from(err: CouponError) -> Self {
        let code = match err {
            CouponError::NotFound(_) => ErrorCode::CouponNotFound,
            CouponError::Inactive(_) => ErrorCode::CouponInactive,
            CouponError::Expired { .. } => ErrorCode::CouponExpired,
            CouponError::Exhausted(_) => ErrorCode::CouponExhausted,
        };
        ServiceError::new(code, err.to_string())
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Coupon(coupon) => return coupon.clone().into(),
            CoreError::Validation(_)
            | CoreError::InvalidQuantity { .. }
            | CoreError::QuantityTooLarge { .. } => ErrorCode::ValidationError,
            CoreError::ProductNotFound(_) | CoreError::NotInCart(_) => ErrorCode::NotFound,
            CoreError::ProductUnavailable(_) | CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::EmptyCart(_) => ErrorCode::EmptyCart,
            CoreError::CartForbidden { .. } => ErrorCode::Forbidden,
            CoreError::InvalidOrderStatus { .. } => ErrorCode::InvalidOrderStatus,
        };
        ServiceError::new(code, err.to_string())
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { entity, id } => ServiceError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ServiceError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ServiceError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ServiceError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ConfigError> for ServiceError {
    fn from(err: ConfigError) -> Self {
        ServiceError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

pub type ServiceResult<T> = Result<T, ServiceError>;
