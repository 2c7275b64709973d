//! # PawMart Checkout API
//!
//! HTTP server for coupon preview and server-authoritative order submission.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout API                                     │
//! │                                                                         │
//! │  Storefront ──► axum Router ──► handlers (routes.rs)                   │
//! │                                    │                                    │
//! │                  ┌─────────────────┼─────────────────┐                  │
//! │                  ▼                 ▼                 ▼                  │
//! │          PricingEngine     CouponRepository   OrderRepository          │
//! │          (pawmart-core)    (pawmart-db)       (pawmart-db)             │
//! │                                    │                 │                  │
//! │                                    └──────┬──────────┘                  │
//! │                                           ▼                             │
//! │                                        SQLite                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! - `PAWMART_CONFIG` - TOML file (default: pawmart.toml)
//! - `PAWMART_PORT` - HTTP port (default: 8080)
//! - `PAWMART_DB_PATH` - SQLite file (default: pawmart.db)
//! - `PAWMART_PLATFORM_FEE` - Platform fee in cents (default: 200)
//! - `RUST_LOG` - Log filter (default: info,pawmart=debug,sqlx=warn)

pub mod config;
pub mod error;
pub mod routes;

// Re-exports
pub use crate::config::{CheckoutConfig, ConfigError};
pub use crate::error::ApiError;
pub use crate::routes::{router, AppState};
