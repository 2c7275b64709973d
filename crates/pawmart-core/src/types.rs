//! # Domain Types
//!
//! Core domain types used throughout PawMart checkout.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartItem     │   │     Coupon      │   │      Order      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  quantity       │   │  code (business)│   │  order_number   │       │
//! │  │  unit_price     │   │  discount_type  │   │  items snapshot │       │
//! │  │  weight (g)     │   │  used_count     │   │  totals         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountType   │   │ CouponSummary   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Percentage     │   │  public view,   │   │  CashOnDelivery │       │
//! │  │  Fixed          │   │  no counters    │   │  Online         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every persisted entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (coupon code, order number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Cart Item
// =============================================================================

/// A product line in a cart, as priced at checkout.
///
/// The client sends these on submission; the server re-prices from them and
/// ignores any totals the client computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Catalog product identifier.
    pub product_id: String,

    /// Number of units (positive).
    pub quantity: i64,

    /// Price per unit in cents (non-negative).
    pub unit_price: Money,

    /// Shipping weight per unit in grams (non-negative).
    pub unit_weight_grams: i64,
}

impl CartItem {
    /// Creates a cart line.
    pub fn new(
        product_id: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        unit_weight_grams: i64,
    ) -> Self {
        CartItem {
            product_id: product_id.into(),
            quantity,
            unit_price,
            unit_weight_grams,
        }
    }

    /// `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// `unit_weight_grams × quantity`.
    #[inline]
    pub fn line_weight_grams(&self) -> i64 {
        self.unit_weight_grams * self.quantity
    }
}

// =============================================================================
// Discount Type
// =============================================================================

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Whole percent of the subtotal, 0-100.
    Percentage,
    /// Flat amount in cents.
    Fixed,
}

impl DiscountType {
    /// Returns the stored/wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A promotional discount rule, as stored in the coupon registry.
///
/// `used_count` is only ever changed by the atomic redemption in pawmart-db.
/// Coupons are deactivated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Normalized code (trimmed, upper-case). Unique.
    pub code: String,

    pub discount_type: DiscountType,

    /// Percent (0-100) or cents, depending on `discount_type`.
    pub discount_value: i64,

    /// Subtotal must be at least this much.
    pub min_order_amount: Money,

    /// Cap on a percentage discount. Ignored for fixed coupons.
    pub max_discount: Option<Money>,

    /// `None` means unlimited.
    pub usage_limit: Option<i64>,

    pub used_count: i64,

    /// Coupon is usable strictly before this instant.
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The admin-editable part of a coupon.
///
/// Used to create coupons and to update them. It has no `used_count`, so an
/// edit can never rewind the redemption counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponDefinition {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_amount: Money,
    pub max_discount: Option<Money>,
    pub usage_limit: Option<i64>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Public view of a coupon, as listed to shoppers.
///
/// Deliberately omits `used_count`, `usage_limit` and `is_active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_amount: Money,
    pub max_discount: Option<Money>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Coupon> for CouponSummary {
    fn from(coupon: &Coupon) -> Self {
        CouponSummary {
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value,
            min_order_amount: coupon.min_order_amount,
            max_discount: coupon.max_discount,
            expires_at: coupon.expires_at,
        }
    }
}

impl CouponSummary {
    /// Builds an advisory coupon for client-side previews.
    ///
    /// The storefront only ever sees the public view, so the preview assumes
    /// the coupon is active with redemptions left. The server re-checks
    /// everything at submission.
    pub fn to_preview(&self, now: DateTime<Utc>) -> Coupon {
        Coupon {
            id: String::new(),
            code: self.code.clone(),
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            min_order_amount: self.min_order_amount,
            max_discount: self.max_discount,
            usage_limit: None,
            used_count: 0,
            expires_at: self.expires_at,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid to the courier on delivery.
    CashOnDelivery,
    /// Paid through the external payment gateway after the order is placed.
    Online,
}

// =============================================================================
// Shipping Address
// =============================================================================

/// Delivery address captured with the order. Stored as a JSON snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub recipient_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
}

// =============================================================================
// Order
// =============================================================================

/// A placed order. Every monetary field was computed by the server.
///
/// Invariant: `total_amount = subtotal + shipping_cost + platform_fee - discount ≥ 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Human-readable number, e.g. `PM-20260301-1A2B3C4D`.
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub region_id: String,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub platform_fee: Money,
    pub coupon_code: Option<String>,
    pub discount: Money,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze the priced cart line at time of order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Unit price at time of order (frozen).
    pub unit_price: Money,
    pub quantity: i64,
    /// Unit weight at time of order (frozen).
    pub unit_weight_grams: i64,
    /// unit_price × quantity.
    pub line_total: Money,
}

impl OrderItem {
    /// Freezes a cart line into an order line.
    pub fn snapshot(order_id: &str, item: &CartItem) -> Self {
        OrderItem {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: item.product_id.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            unit_weight_grams: item.unit_weight_grams,
            line_total: item.line_total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
