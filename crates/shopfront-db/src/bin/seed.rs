//! # Seed Data Generator
//!
//! Populates the database with a demo catalogue for development.
//!
//! ## Usage
//! ```bash
//! # 200 products (default)
//! cargo run -p shopfront-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p shopfront-db --bin seed -- --count 1000 --db ./data/shopfront.db
//! ```
//!
//! ## Generated Data
//! - Products across a few categories. Every fifth product runs a
//!   promotion (20% off) starting today for a week.
//! - Demo customers.
//! - Coupons: `BIENVENUE10` (10%, 100 uses), `FLASH25` (25%, 5 uses),
//!   `EXPIRE` (already expired) and `PAUSE` (inactive).

use chrono::{Duration, Utc};
use serde_json::json;
use shopfront_core::{DiscountRate, NewCoupon, NewCustomer, NewProduct};
use shopfront_db::{Database, DbConfig};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Product families for realistic demo data
const CATEGORIES: &[(&str, &[(&str, i64)])] = &[
    (
        "Mode",
        &[
            ("Pagne wax", 10_000),
            ("Boubou brodé", 45_000),
            ("Chemise en bazin", 18_000),
            ("Robe kaftan", 32_000),
            ("Sandales en cuir", 9_000),
            ("Sac tressé", 15_000),
        ],
    ),
    (
        "Tech",
        &[
            ("Écouteurs sans fil", 25_000),
            ("Chargeur solaire", 22_000),
            ("Batterie externe", 12_000),
            ("Téléphone reconditionné", 85_000),
            ("Clé USB 64 Go", 6_000),
        ],
    ),
    (
        "Maison",
        &[
            ("Panier en osier", 7_500),
            ("Nappe imprimée", 11_000),
            ("Théière en inox", 8_500),
            ("Lampe en calebasse", 19_000),
        ],
    ),
];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Awa Diop", "awa.diop@example.sn", "Dakar"),
    ("Moussa Ndiaye", "moussa.ndiaye@example.sn", "Thiès"),
    ("Fatou Sow", "fatou.sow@example.sn", "Saint-Louis"),
    ("Ibrahima Fall", "ibrahima.fall@example.sn", "Ziguinchor"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./shopfront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopfront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopfront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products; skipping seed.", existing);
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let start = std::time::Instant::now();

    let variants: Vec<(&str, &str, i64)> = CATEGORIES
        .iter()
        .flat_map(|(category, items)| items.iter().map(move |(name, price)| (*category, *name, *price)))
        .collect();

    let mut on_promotion = 0;
    for n in 0..count {
        let (category, name, price) = variants[n % variants.len()];
        let batch = n / variants.len();
        let label = if batch == 0 {
            name.to_string()
        } else {
            format!("{} #{}", name, batch + 1)
        };

        let mut product = NewProduct::new(format!("{} ({})", label, category), price + (batch as i64) * 500)
            .with_stock(((n * 7) % 40) as i64);

        if n % 5 == 0 {
            let promo_price = product.price * 8 / 10;
            product = product.with_promotion(promo_price, today, today + Duration::days(7));
            on_promotion += 1;
        }

        db.products().insert(&product).await?;
    }

    for (name, email, city) in CUSTOMERS {
        let mut customer = NewCustomer::new(*name, *email);
        customer.city = Some(city.to_string());
        db.customers().insert(&customer).await?;
    }

    let coupons = [
        NewCoupon::new("BIENVENUE10", DiscountRate::from_bps(1000), today + Duration::days(90), 100)
            .with_label("Bienvenue"),
        NewCoupon::new("FLASH25", DiscountRate::from_bps(2500), today + Duration::days(2), 5)
            .with_label("Vente flash"),
        NewCoupon::new("EXPIRE", DiscountRate::from_bps(1500), today - Duration::days(1), 50)
            .with_label("Soldes passées"),
        NewCoupon::new("PAUSE", DiscountRate::from_bps(500), today + Duration::days(30), 50)
            .with_label("Suspendu")
            .inactive(),
    ];
    for coupon in &coupons {
        db.coupons().insert(coupon).await?;
    }

    let summary = json!({
        "database": db_path,
        "products": count,
        "on_promotion": on_promotion,
        "customers": CUSTOMERS.len(),
        "coupons": coupons.iter().map(|c| c.code.as_str()).collect::<Vec<_>>(),
        "elapsed_ms": start.elapsed().as_millis() as u64,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    db.close().await;
    Ok(())
}
