//! # Demo Coupon Seeder
//!
//! Populates the coupon registry with a demo set for local development.
//!
//! ## Usage
//! ```bash
//! # Seed ./pawmart_dev.db
//! cargo run -p pawmart-db --bin seed
//!
//! # Specify database path
//! cargo run -p pawmart-db --bin seed -- --db ./data/pawmart.db
//!
//! # Overwrite definitions of coupons that already exist
//! cargo run -p pawmart-db --bin seed -- --update
//! ```
//!
//! ## Seeded Coupons
//! One of each lifecycle state, so the storefront can be tried against all
//! rejection kinds:
//! - `WOOF10`    10% off, capped at $5.00
//! - `MEOW500`   $5.00 off orders of $25.00 or more
//! - `FIRSTPAW`  20% off, single use
//! - `SPRING`    expired yesterday
//! - `RETIRED`   deactivated

use chrono::{Duration, Utc};
use pawmart_core::{CouponDefinition, DiscountType, Money};
use pawmart_db::{Database, DbConfig, DbError};
use std::env;

/// Demo coupon set.
fn demo_coupons() -> Vec<CouponDefinition> {
    let now = Utc::now();

    vec![
        CouponDefinition {
            code: "WOOF10".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            min_order_amount: Money::zero(),
            max_discount: Some(Money::from_cents(500)),
            usage_limit: None,
            expires_at: Some(now + Duration::days(90)),
            is_active: true,
        },
        CouponDefinition {
            code: "MEOW500".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 500,
            min_order_amount: Money::from_cents(2500),
            max_discount: None,
            usage_limit: Some(1000),
            expires_at: None,
            is_active: true,
        },
        CouponDefinition {
            code: "FIRSTPAW".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 20,
            min_order_amount: Money::from_cents(1000),
            max_discount: None,
            usage_limit: Some(1),
            expires_at: None,
            is_active: true,
        },
        CouponDefinition {
            code: "SPRING".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 15,
            min_order_amount: Money::zero(),
            max_discount: None,
            usage_limit: None,
            expires_at: Some(now - Duration::days(1)),
            is_active: true,
        },
        CouponDefinition {
            code: "RETIRED".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 300,
            min_order_amount: Money::zero(),
            max_discount: None,
            usage_limit: None,
            expires_at: None,
            is_active: false,
        },
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./pawmart_dev.db");
    let mut update = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--update" | "-u" => update = true,
            "--help" | "-h" => {
                println!("PawMart Demo Coupon Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./pawmart_dev.db)");
                println!("  -u, --update       Overwrite definitions of existing coupons");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🐾 PawMart Demo Coupon Seeder");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    let now = Utc::now();
    let mut created = 0;
    let mut updated = 0;
    let mut skipped = 0;

    for def in demo_coupons() {
        match db.coupons().create(&def, now).await {
            Ok(coupon) => {
                println!("  + {} ({:?})", coupon.code, coupon.lifecycle(now));
                created += 1;
            }
            Err(DbError::UniqueViolation { .. }) if update => {
                let coupon = db.coupons().update_definition(&def, now).await?;
                println!("  ~ {} ({:?}, used {} times)", coupon.code, coupon.lifecycle(now), coupon.used_count);
                updated += 1;
            }
            Err(DbError::UniqueViolation { .. }) => {
                println!("  = {} already exists, skipped", def.code);
                skipped += 1;
            }
            Err(e) => {
                eprintln!("Failed to seed {}: {}", def.code, e);
            }
        }
    }

    let active = db.coupons().list_active(now).await?;

    println!();
    println!("✓ Created {}, updated {}, skipped {}", created, updated, skipped);
    println!("  Active coupons: {}", active.len());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
