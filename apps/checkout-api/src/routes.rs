//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  /health            database health                               │
//! │  GET  /coupons/active    public view of redeemable coupons             │
//! │  POST /coupons/validate  {code, subtotal} → discount preview           │
//! │  POST /orders/quote      non-binding server quote                      │
//! │  POST /orders            price, redeem, persist → 201                  │
//! │  GET  /orders/:id        persisted order snapshot                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Request bodies carry no totals. Extra fields such as `discount` or
//! `totalAmount` are dropped by deserialization and never read.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use pawmart_core::pricing::Quote;
use pawmart_core::validation::{validate_amount, validate_coupon_code, validate_uuid};
use pawmart_core::{
    coupon, CartItem, CouponRejection, CouponSummary, Money, Order, PaymentMethod,
    PricingEngine, ShippingAddress,
};
use pawmart_db::{Database, NewOrder};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiError;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: Arc<PricingEngine>,
}

impl AppState {
    pub fn new(db: Database, engine: PricingEngine) -> Self {
        AppState {
            db,
            engine: Arc::new(engine),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/coupons/active", get(list_active_coupons))
        .route("/coupons/validate", post(validate_coupon))
        .route("/orders/quote", post(quote_order))
        .route("/orders", post(place_order))
        .route("/orders/:id", get(get_order))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    pub subtotal: Money,
}

#[derive(Debug, Serialize)]
pub struct ValidateCouponResponse {
    pub success: bool,
    pub coupon: CouponSummary,
    pub discount: Money,
}

/// Order submission body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<CartItem>,
    pub region_id: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
}

impl From<OrderRequest> for NewOrder {
    fn from(req: OrderRequest) -> Self {
        NewOrder {
            items: req.items,
            region_id: req.region_id,
            coupon_code: req.coupon_code,
            payment_method: req.payment_method,
            shipping_address: req.shipping_address,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: String,
    pub order_number: String,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub platform_fee: Money,
    pub discount: Money,
    pub total_amount: Money,
    pub coupon_code: Option<String>,
}

impl From<&Order> for OrderConfirmation {
    fn from(order: &Order) -> Self {
        OrderConfirmation {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            subtotal: order.subtotal,
            shipping_cost: order.shipping_cost,
            platform_fee: order.platform_fee,
            discount: order.discount,
            total_amount: order.total_amount,
            coupon_code: order.coupon_code.clone(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    };
    (status, Json(body))
}

async fn list_active_coupons(
    State(state): State<AppState>,
) -> Result<Json<Vec<CouponSummary>>, ApiError> {
    let coupons = state.db.coupons().list_active(Utc::now()).await?;
    Ok(Json(coupons.iter().map(CouponSummary::from).collect()))
}

async fn validate_coupon(
    State(state): State<AppState>,
    Json(req): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, ApiError> {
    validate_amount("subtotal", req.subtotal)?;

    // A code that can never be registered is simply not found
    let code = validate_coupon_code(&req.code).map_err(|_| ApiError::Coupon(CouponRejection::NotFound))?;

    let found = state
        .db
        .coupons()
        .get_by_code(&code)
        .await?
        .ok_or(ApiError::Coupon(CouponRejection::NotFound))?;

    let discount = coupon::validate(&found, req.subtotal, Utc::now()).map_err(ApiError::Coupon)?;

    debug!(code = %found.code, discount = discount.cents(), "Coupon validated");

    Ok(Json(ValidateCouponResponse {
        success: true,
        coupon: CouponSummary::from(&found),
        discount,
    }))
}

async fn quote_order(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<Json<Quote>, ApiError> {
    let order = NewOrder::from(req);
    let quote = state.db.orders().quote(&state.engine, &order, Utc::now()).await?;
    Ok(Json(quote))
}

async fn place_order(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderConfirmation>), ApiError> {
    let order = NewOrder::from(req);
    let placed = state
        .db
        .orders()
        .place_order(&state.engine, &order, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(OrderConfirmation::from(&placed))))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    validate_uuid(&id)?;
    state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {}", id)))
}

// =============================================================================
// Unit Tests
// =============================================================================
