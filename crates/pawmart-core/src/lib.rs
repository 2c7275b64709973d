//! # pawmart-core: Pure Checkout Logic for PawMart
//!
//! This crate is the **heart** of PawMart checkout. It prices orders and
//! judges coupons as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     PawMart Checkout Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront (advisory preview)                   │   │
//! │  │    Cart UI ──► CheckoutSession ──► PricingEngine (same code)   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 checkout-api (axum handlers)                    │   │
//! │  │    /coupons/active, /coupons/validate, /orders                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pawmart-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │ shipping │ │  coupon  │ │ pricing  │ │ checkout session │  │   │
//! │  │   │ Tariff   │ │ validate │ │ Engine   │ │ recompute on     │  │   │
//! │  │   │ weight   │ │ lifecycle│ │ Breakdown│ │ every cart edit  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 pawmart-db (Database Layer)                     │   │
//! │  │      Coupon registry, atomic redemption, order persistence      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CartItem, Coupon, Order, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`shipping`] - Tariff table and shipping cost calculation
//! - [`coupon`] - Coupon eligibility, discount computation, lifecycle
//! - [`pricing`] - Pricing engine producing the canonical breakdown
//! - [`checkout`] - Client-side checkout session with explicit recompute
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use pawmart_core::money::Money;
//! use pawmart_core::pricing::{CouponLookup, PricingEngine};
//! use pawmart_core::shipping::{ShippingRegion, TariffTable};
//! use pawmart_core::CartItem;
//!
//! let tariff = TariffTable::new([ShippingRegion::new(
//!     "metro",
//!     Money::from_cents(100),
//!     Money::from_cents(20),
//! )]);
//! let engine = PricingEngine::new(tariff, Money::from_cents(10));
//!
//! let items = vec![CartItem::new("kibble-5kg", 2, Money::from_cents(500), 750)];
//! let quote = engine
//!     .quote(&items, "metro", CouponLookup::None, chrono::Utc::now())
//!     .unwrap();
//!
//! // 1500 g ships as 1 kg base + 1 extra kg
//! assert_eq!(quote.breakdown.shipping_cost.cents(), 120);
//! assert_eq!(quote.breakdown.total.cents(), 1000 + 120 + 10);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod coupon;
pub mod error;
pub mod money;
pub mod pricing;
pub mod shipping;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use coupon::{AppliedCoupon, CouponLifecycle, CouponRejection};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{PricingBreakdown, PricingEngine, Quote};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a cart.
///
/// Guards against typing 1000 instead of 10 on the quantity stepper.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted for a cart line ($100,000.00).
///
/// Keeps `unit_price × quantity` summed over a full cart well inside i64.
pub const MAX_UNIT_PRICE: Money = Money::from_cents(10_000_000);

/// Heaviest unit accepted for a cart line (1,000 kg).
pub const MAX_UNIT_WEIGHT_GRAMS: i64 = 1_000_000;

/// Flat platform fee charged on every order unless configured otherwise.
pub const DEFAULT_PLATFORM_FEE: Money = Money::from_cents(200);
