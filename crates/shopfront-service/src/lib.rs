//! # shopfront-service: Storefront Services
//!
//! The entry point the web layer calls into: one method per request, each
//! returning a serializable view or a [`ServiceError`].
//!
//! ## Module Organization
//! ```text
//! shopfront_service/
//! ├── lib.rs      ◄─── Shop handle & tracing setup
//! ├── cart.rs     ◄─── CartService: lines, coupons, totals
//! ├── order.rs    ◄─── OrderService: checkout, order status
//! ├── clock.rs    ◄─── Clock trait (system / fixed)
//! ├── config.rs   ◄─── ShopConfig (TOML + env)
//! └── error.rs    ◄─── ServiceError (code + message)
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let config = ShopConfig::load(None)?;
//! shopfront_service::init_tracing(&config.logging.filter);
//!
//! let shop = Shop::open(config).await?;
//! let view = shop.carts().add_to_cart(&customer_id, &product_id, 2).await?;
//! let view = shop.carts().apply_coupon(&customer_id, &view.cart_id, "PROMO10").await?;
//! let order = shop.orders().checkout(&customer_id, &view.cart_id).await?;
//! ```

pub mod cart;
pub mod clock;
pub mod config;
pub mod error;
pub mod order;

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopfront_db::Database;

pub use cart::{CartService, CartView};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, ShopConfig};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use order::{OrderService, OrderView};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this twice
/// keeps the first subscriber.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Shared handle: database, configuration and clock.
///
/// Cheap to clone. Services are created per request.
#[derive(Debug, Clone)]
pub struct Shop {
    db: Database,
    config: ShopConfig,
    clock: Arc<dyn Clock>,
}

impl Shop {
    /// Connects to the configured database (running migrations) with the
    /// system clock.
    pub async fn open(config: ShopConfig) -> ServiceResult<Self> {
        config.validate()?;
        let db = Database::new(config.db_config()).await?;

        info!(path = ?config.database.path, "Shop opened");
        Ok(Self::with_clock(db, config, Arc::new(SystemClock)))
    }

    pub fn with_clock(db: Database, config: ShopConfig, clock: Arc<dyn Clock>) -> Self {
        Shop { db, config, clock }
    }

    pub fn carts(&self) -> CartService {
        CartService::new(self.db.clone(), self.config.cart_limits(), self.clock.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.db.clone(), self.clock.clone())
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    /// The business date services are using right now.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}
