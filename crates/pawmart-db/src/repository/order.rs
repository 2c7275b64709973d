//! # Order Repository
//!
//! Server-authoritative order submission.
//!
//! ## place_order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Submission                                  │
//! │                                                                         │
//! │  1. VALIDATE   items, region, address, coupon code format              │
//! │                                                                         │
//! │  2. QUOTE      read coupon (no lock) → PricingEngine::quote            │
//! │     └── rejected coupon → CheckoutError::Coupon, nothing written       │
//! │                                                                         │
//! │  3. BEGIN                                                              │
//! │     ├── redeem_in_tx()   conditional UPDATE, first write in the tx     │
//! │     │   └── rejected → RedemptionConflict, ROLLBACK                    │
//! │     ├── re-price with the redeemed row                                 │
//! │     ├── INSERT orders                                                  │
//! │     └── INSERT order_items (one per cart line)                         │
//! │  4. COMMIT                                                             │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: no order row and no    │
//! │  counter change.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Client-supplied totals never reach this module; [`NewOrder`] has no field
//! for them.

use chrono::{DateTime, Utc};
use pawmart_core::pricing::{CouponLookup, Quote};
use pawmart_core::validation::{
    validate_coupon_code, validate_order_items, validate_region_id, validate_shipping_address,
};
use pawmart_core::{CartItem, Money, Order, OrderItem, PaymentMethod, PricingEngine, ShippingAddress};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CheckoutError, DbError, DbResult};
use crate::repository::coupon::{CouponRepository, Redemption};

// =============================================================================
// Input
// =============================================================================

/// What the shopper submits. Prices are recomputed from these fields only.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<CartItem>,
    pub region_id: String,
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRecord {
    id: String,
    order_number: String,
    region_id: String,
    subtotal_cents: i64,
    shipping_cents: i64,
    platform_fee_cents: i64,
    coupon_code: Option<String>,
    discount_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    shipping_address: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRecord {
    id: String,
    order_id: String,
    product_id: String,
    unit_price_cents: i64,
    quantity: i64,
    unit_weight_grams: i64,
    line_total_cents: i64,
}

impl From<OrderItemRecord> for OrderItem {
    fn from(r: OrderItemRecord) -> Self {
        OrderItem {
            id: r.id,
            order_id: r.order_id,
            product_id: r.product_id,
            unit_price: Money::from_cents(r.unit_price_cents),
            quantity: r.quantity,
            unit_weight_grams: r.unit_weight_grams,
            line_total: Money::from_cents(r.line_total_cents),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order submission and lookup.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Prices a submission without redeeming or persisting anything.
    ///
    /// A rejected coupon is reported in the quote's coupon outcome.
    pub async fn quote(
        &self,
        engine: &PricingEngine,
        order: &NewOrder,
        now: DateTime<Utc>,
    ) -> Result<Quote, CheckoutError> {
        validate_order_items(&order.items)?;
        validate_region_id(&order.region_id)?;

        let code = normalized_coupon_code(order.coupon_code.as_deref());
        let coupon = match &code {
            Some(Ok(code)) => CouponRepository::new(self.pool.clone())
                .get_by_code(code)
                .await?,
            _ => None,
        };

        let lookup = match (&code, &coupon) {
            (None, _) => CouponLookup::None,
            (Some(_), Some(found)) => CouponLookup::Found(found),
            (Some(Ok(code)), None) => CouponLookup::NotFound(code),
            (Some(Err(raw)), None) => CouponLookup::NotFound(raw),
        };

        Ok(engine.quote(&order.items, &order.region_id, lookup, now)?)
    }

    /// Places an order.
    ///
    /// ## Errors
    /// - `Validation` for malformed input
    /// - `Pricing` for an unknown region or a broken pricing invariant
    /// - `Coupon(kind)` if the coupon fails validation
    /// - `RedemptionConflict(kind)` if the coupon was valid when read but
    ///   another order consumed its last use first
    pub async fn place_order(
        &self,
        engine: &PricingEngine,
        order: &NewOrder,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        validate_shipping_address(&order.shipping_address)?;

        let preview = self.quote(engine, order, now).await?;
        if let Some(reason) = preview.coupon.rejection() {
            debug!(reason = reason.reason_code(), "Order refused: coupon rejected");
            return Err(CheckoutError::Coupon(reason));
        }

        let mut tx = self.pool.begin().await?;

        let quote = match preview.coupon.applied().map(|a| a.code.clone()) {
            None => preview,
            Some(code) => {
                let subtotal = preview.breakdown.subtotal;
                match CouponRepository::redeem_in_tx(&mut tx, &code, subtotal, now).await? {
                    Redemption::Redeemed(coupon) => engine.quote(
                        &order.items,
                        &order.region_id,
                        CouponLookup::Redeemed(&coupon),
                        now,
                    )?,
                    Redemption::Rejected(kind) => {
                        return Err(CheckoutError::RedemptionConflict(kind));
                    }
                }
            }
        };

        let placed = insert_order(&mut tx, order, &quote, now).await?;
        tx.commit().await?;

        info!(
            order_number = %placed.order_number,
            total = placed.total_amount.cents(),
            coupon = placed.coupon_code.as_deref().unwrap_or("-"),
            "Order placed"
        );

        Ok(placed)
    }

    /// Gets an order and its items by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let record = sqlx::query_as::<_, OrderRecord>(
            r#"
            SELECT
                id, order_number, region_id,
                subtotal_cents, shipping_cents, platform_fee_cents,
                coupon_code, discount_cents, total_cents,
                payment_method, shipping_address, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(r) = record else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRecord>(
            r#"
            SELECT
                id, order_id, product_id,
                unit_price_cents, quantity, unit_weight_grams, line_total_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let shipping_address: ShippingAddress = serde_json::from_str(&r.shipping_address)
            .map_err(|e| DbError::Internal(format!("order {} has unreadable address: {}", r.id, e)))?;

        Ok(Some(Order {
            id: r.id,
            order_number: r.order_number,
            items: items.into_iter().map(OrderItem::from).collect(),
            region_id: r.region_id,
            subtotal: Money::from_cents(r.subtotal_cents),
            shipping_cost: Money::from_cents(r.shipping_cents),
            platform_fee: Money::from_cents(r.platform_fee_cents),
            coupon_code: r.coupon_code,
            discount: Money::from_cents(r.discount_cents),
            total_amount: Money::from_cents(r.total_cents),
            payment_method: r.payment_method,
            shipping_address,
            created_at: r.created_at,
        }))
    }
}

/// `None` when the shopper entered nothing. `Err(raw)` when the entry can
/// never match a registry code; it is priced as not found.
fn normalized_coupon_code(raw: Option<&str>) -> Option<Result<String, String>> {
    let raw = raw.map(str::trim).filter(|c| !c.is_empty())?;
    Some(validate_coupon_code(raw).map_err(|_| raw.to_string()))
}

async fn insert_order(
    conn: &mut SqliteConnection,
    order: &NewOrder,
    quote: &Quote,
    now: DateTime<Utc>,
) -> DbResult<Order> {
    let id = Uuid::new_v4().to_string();
    let order_number = generate_order_number(now);
    let b = &quote.breakdown;
    let coupon_code = quote.coupon.applied().map(|a| a.code.clone());

    let address_json = serde_json::to_string(&order.shipping_address)
        .map_err(|e| DbError::Internal(format!("cannot encode address: {}", e)))?;

    debug!(id = %id, order_number = %order_number, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, region_id,
            subtotal_cents, shipping_cents, platform_fee_cents,
            coupon_code, discount_cents, total_cents,
            payment_method, shipping_address, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&id)
    .bind(&order_number)
    .bind(&order.region_id)
    .bind(b.subtotal.cents())
    .bind(b.shipping_cost.cents())
    .bind(b.platform_fee.cents())
    .bind(&coupon_code)
    .bind(b.discount.cents())
    .bind(b.total.cents())
    .bind(order.payment_method)
    .bind(&address_json)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(order.items.len());
    for (line_no, cart_item) in order.items.iter().enumerate() {
        let item = OrderItem::snapshot(&id, cart_item);

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, line_no, product_id,
                unit_price_cents, quantity, unit_weight_grams, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(line_no as i64)
        .bind(&item.product_id)
        .bind(item.unit_price.cents())
        .bind(item.quantity)
        .bind(item.unit_weight_grams)
        .bind(item.line_total.cents())
        .execute(&mut *conn)
        .await?;

        items.push(item);
    }

    Ok(Order {
        id,
        order_number,
        items,
        region_id: order.region_id.clone(),
        subtotal: b.subtotal,
        shipping_cost: b.shipping_cost,
        platform_fee: b.platform_fee,
        coupon_code,
        discount: b.discount,
        total_amount: b.total,
        payment_method: order.payment_method,
        shipping_address: order.shipping_address.clone(),
        created_at: now,
    })
}

/// Generates an order number in format: PM-YYYYMMDD-XXXXXXXX
///
/// ## Format
/// - YYYYMMDD: Date the order was placed (UTC)
/// - XXXXXXXX: First 8 hex digits of a random UUID, upper-case
///
/// ## Example
/// `PM-20260301-1A2B3C4D`
fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("PM-{}-{}", now.format("%Y%m%d"), suffix.to_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================
