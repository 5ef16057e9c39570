//! # shopfront-db: Database Layer for Shopfront
//!
//! SQLite storage for the storefront, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Data Flow                              │
//! │                                                                         │
//! │  CartService::apply_coupon (shopfront-service)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  shopfront-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ CustomerRepo   │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo    │   │ 001_initial  │   │   │
//! │  │   │ WAL, FK on    │    │ CouponRepo     │   │ _schema.sql  │   │   │
//! │  │   │               │    │ CartRepo       │   │              │   │   │
//! │  │   │               │    │ OrderRepo      │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shopfront.db")).await?;
//!
//! let cart = db.carts().get_or_create(&customer_id).await?;
//! db.carts().add_item(&customer_id, &cart.id, &product_id, 2, limits).await?;
//! let priced = db.carts().load_priced(&cart.id).await?;
//! ```
//!
//! Every operation that depends on "today" takes `as_of: NaiveDate`.
//! Timestamps such as `created_at` are bookkeeping and use the wall clock.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::coupon::CouponRepository;
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
