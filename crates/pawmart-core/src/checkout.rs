//! # Checkout Session
//!
//! The shopper's cart plus applied coupon, as held by the storefront.
//!
//! ## Explicit Recompute
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Operations                                   │
//! │                                                                         │
//! │  Storefront Action        Session Method          After the change      │
//! │  ─────────────────        ──────────────          ────────────────      │
//! │                                                                         │
//! │  Add to cart ────────────► add_item() ──────────┐                       │
//! │  Change quantity ────────► update_quantity() ───┼──► revalidate coupon  │
//! │  Remove line ────────────► remove_item() ───────┘    (may detach it)    │
//! │                                                                         │
//! │  Enter code ─────────────► apply_coupon() ──────► validate now          │
//! │  Pick region ────────────► set_region()                                 │
//! │  Review order ───────────► quote() ─────────────► advisory breakdown    │
//! │                                                                         │
//! │  Every edit that changes the subtotal re-runs the coupon validator      │
//! │  before returning. A coupon that stops qualifying is removed and a      │
//! │  CouponNotice tells the shopper why.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The quote produced here is advisory. The server prices the order again
//! from the items alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coupon::{self, AppliedCoupon, CouponRejection, Recomputed};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{CouponLookup, PricingEngine, Quote};
use crate::types::{CartItem, Coupon};
use crate::validation;

/// Tells the shopper that an applied coupon was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponNotice {
    pub code: String,
    pub reason: CouponRejection,
}

impl CouponNotice {
    /// Shopper-facing message.
    pub fn message(&self) -> String {
        format!("Coupon {} was removed: {}", self.code, self.reason)
    }
}

/// A cart being checked out.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product increases quantity)
/// - Quantity must be > 0 (setting it to 0 removes the line)
/// - An applied coupon is always valid for the current subtotal
#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    items: Vec<CartItem>,
    region_id: Option<String>,
    coupon: Option<(Coupon, AppliedCoupon)>,
}

impl CheckoutSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn region_id(&self) -> Option<&str> {
        self.region_id.as_deref()
    }

    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref().map(|(_, applied)| applied)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `Σ unit_price × quantity` over the current lines.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Adds a line, or increases the quantity if the product is already in the cart.
    ///
    /// Merging requires the same unit price and weight as the existing line;
    /// a repriced product must be removed and added again.
    pub fn add_item(&mut self, item: CartItem, now: DateTime<Utc>) -> CoreResult<Option<CouponNotice>> {
        validation::validate_cart_item(&item)?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            if existing.unit_price != item.unit_price
                || existing.unit_weight_grams != item.unit_weight_grams
            {
                return Err(CoreError::LineMismatch {
                    product_id: item.product_id,
                });
            }
            let new_qty = existing.quantity + item.quantity;
            if new_qty > crate::MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: crate::MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = new_qty;
        } else {
            validation::validate_cart_size(self.items.len())?;
            self.items.push(item);
        }

        Ok(self.revalidate(now))
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<CouponNotice>> {
        if quantity == 0 {
            return self.remove_item(product_id, now);
        }
        validation::validate_quantity(quantity)?;

        let line = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::ItemNotInCart(product_id.to_string()))?;
        line.quantity = quantity;

        Ok(self.revalidate(now))
    }

    /// Removes a line by product ID.
    pub fn remove_item(&mut self, product_id: &str, now: DateTime<Utc>) -> CoreResult<Option<CouponNotice>> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(CoreError::ItemNotInCart(product_id.to_string()));
        }

        Ok(self.revalidate(now))
    }

    /// Empties the cart and drops any coupon.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
    }

    pub fn set_region(&mut self, region_id: impl Into<String>) {
        self.region_id = Some(region_id.into());
    }

    /// Applies a coupon against the current subtotal.
    ///
    /// On rejection any previously applied coupon stays in place.
    pub fn apply_coupon(
        &mut self,
        coupon: Coupon,
        now: DateTime<Utc>,
    ) -> Result<AppliedCoupon, CouponRejection> {
        let applied = coupon::apply(&coupon, self.subtotal(), now)?;
        self.coupon = Some((coupon, applied.clone()));
        Ok(applied)
    }

    pub fn remove_coupon(&mut self) -> Option<AppliedCoupon> {
        self.coupon.take().map(|(_, applied)| applied)
    }

    /// Advisory breakdown for the review screen.
    ///
    /// ## Errors
    /// - `Validation` if no region has been picked
    /// - anything [`PricingEngine::quote`] returns
    pub fn quote(&self, engine: &PricingEngine, now: DateTime<Utc>) -> CoreResult<Quote> {
        let region_id = self.region_id.as_deref().ok_or_else(|| ValidationError::Required {
            field: "regionId".to_string(),
        })?;
        let lookup = match &self.coupon {
            Some((coupon, _)) => CouponLookup::Found(coupon),
            None => CouponLookup::None,
        };
        engine.quote(&self.items, region_id, lookup, now)
    }

    fn revalidate(&mut self, now: DateTime<Utc>) -> Option<CouponNotice> {
        let (coupon, applied) = self.coupon.take()?;
        match coupon::recompute(&applied, &coupon, self.subtotal(), now) {
            Recomputed::Kept(fresh) => {
                self.coupon = Some((coupon, fresh));
                None
            }
            Recomputed::Detached { code, reason } => Some(CouponNotice { code, reason }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::{ShippingRegion, TariffTable};
    use crate::types::{CouponSummary, DiscountType};

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    fn min_100_coupon() -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "c1".to_string(),
            code: "WOOF10".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            min_order_amount: cents(100),
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            expires_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_same_product_increases_quantity() {
        let now = Utc::now();
        let mut session = CheckoutSession::new();
        session.add_item(CartItem::new("p1", 2, cents(999), 100), now).unwrap();
        session.add_item(CartItem::new("p1", 3, cents(999), 100), now).unwrap();

        assert_eq!(session.items().len(), 1);
        assert_eq!(session.items()[0].quantity, 5);
        assert_eq!(session.subtotal(), cents(4995));
    }

    #[test]
    fn test_add_rejects_quantity_overflow() {
        let now = Utc::now();
        let mut session = CheckoutSession::new();
        session.add_item(CartItem::new("p1", 900, cents(1), 0), now).unwrap();
        let err = session
            .add_item(CartItem::new("p1", 100, cents(1), 0), now)
            .unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { requested: 1000, .. }));
    }

    #[test]
    fn test_add_same_product_at_new_price_is_rejected() {
        let now = Utc::now();
        let mut session = CheckoutSession::new();
        session.add_item(CartItem::new("p1", 1, cents(999), 100), now).unwrap();

        let err = session
            .add_item(CartItem::new("p1", 1, cents(1), 100), now)
            .unwrap_err();
        assert!(matches!(err, CoreError::LineMismatch { ref product_id } if product_id == "p1"));

        let err = session
            .add_item(CartItem::new("p1", 1, cents(999), 5000), now)
            .unwrap_err();
        assert!(matches!(err, CoreError::LineMismatch { .. }));

        assert_eq!(session.items()[0].quantity, 1);
        assert_eq!(session.subtotal(), cents(999));
    }

    #[test]
    fn test_add_rejects_full_cart() {
        let now = Utc::now();
        let mut session = CheckoutSession::new();
        for i in 0..crate::MAX_CART_ITEMS {
            session
                .add_item(CartItem::new(format!("p{}", i), 1, cents(1), 0), now)
                .unwrap();
        }

        let err = session
            .add_item(CartItem::new("one-more", 1, cents(1), 0), now)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
        assert_eq!(session.items().len(), crate::MAX_CART_ITEMS);

        // an existing line can still grow
        session.add_item(CartItem::new("p0", 1, cents(1), 0), now).unwrap();
    }

    #[test]
    fn test_add_rejects_oversized_unit_price() {
        let now = Utc::now();
        let mut session = CheckoutSession::new();
        let err = session
            .add_item(CartItem::new("p1", 2, Money::from_cents(i64::MAX / 2 + 1), 0), now)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(session.is_empty());
    }

    #[test]
    fn test_preview_from_public_listing() {
        let now = Utc::now();
        let summary = CouponSummary::from(&min_100_coupon());
        let preview = summary.to_preview(now);
        assert!(preview.is_active);
        assert_eq!(preview.used_count, 0);
        assert_eq!(preview.usage_limit, None);

        let mut session = CheckoutSession::new();
        session.add_item(CartItem::new("toy", 3, cents(100), 100), now).unwrap();
        let applied = session.apply_coupon(preview, now).unwrap();
        assert_eq!(applied.code, "WOOF10");
        assert_eq!(applied.computed_discount, cents(30));
    }

    #[test]
    fn test_shrinking_cart_detaches_coupon() {
        let now = Utc::now();
        let mut session = CheckoutSession::new();
        session.add_item(CartItem::new("toy", 1, cents(80), 100), now).unwrap();
        session.add_item(CartItem::new("leash", 1, cents(120), 100), now).unwrap();

        let applied = session.apply_coupon(min_100_coupon(), now).unwrap();
        assert_eq!(applied.computed_discount, cents(20));

        // 200 → 80, below the 100 minimum
        let notice = session.remove_item("leash", now).unwrap();
        assert_eq!(
            notice,
            Some(CouponNotice {
                code: "WOOF10".to_string(),
                reason: CouponRejection::BelowMinimum,
            })
        );
        assert!(session.applied_coupon().is_none());
    }

    #[test]
    fn test_growing_cart_refreshes_discount() {
        let now = Utc::now();
        let mut session = CheckoutSession::new();
        session.add_item(CartItem::new("toy", 2, cents(100), 100), now).unwrap();
        session.apply_coupon(min_100_coupon(), now).unwrap();

        let notice = session.update_quantity("toy", 5, now).unwrap();
        assert!(notice.is_none());
        assert_eq!(session.applied_coupon().unwrap().computed_discount, cents(50));
    }

    #[test]
    fn test_rejected_apply_keeps_cart_unchanged() {
        let now = Utc::now();
        let mut session = CheckoutSession::new();
        session.add_item(CartItem::new("toy", 1, cents(50), 100), now).unwrap();

        assert_eq!(
            session.apply_coupon(min_100_coupon(), now),
            Err(CouponRejection::BelowMinimum)
        );
        assert!(session.applied_coupon().is_none());
    }

    #[test]
    fn test_update_zero_removes_line() {
        let now = Utc::now();
        let mut session = CheckoutSession::new();
        session.add_item(CartItem::new("toy", 1, cents(50), 100), now).unwrap();
        session.update_quantity("toy", 0, now).unwrap();
        assert!(session.is_empty());

        assert!(matches!(
            session.update_quantity("toy", 2, now),
            Err(CoreError::ItemNotInCart(_))
        ));
    }

    #[test]
    fn test_quote_matches_engine() {
        let now = Utc::now();
        let engine = PricingEngine::new(
            TariffTable::new([ShippingRegion::new("metro", cents(100), cents(20))]),
            cents(10),
        );
        let mut session = CheckoutSession::new();
        session.add_item(CartItem::new("kibble", 2, cents(500), 750), now).unwrap();

        assert!(session.quote(&engine, now).is_err());

        session.set_region("metro");
        session.apply_coupon(min_100_coupon(), now).unwrap();
        let quote = session.quote(&engine, now).unwrap();

        assert_eq!(quote.breakdown.subtotal, cents(1000));
        assert_eq!(quote.breakdown.shipping_cost, cents(120));
        assert_eq!(quote.breakdown.discount, cents(100));
        assert_eq!(quote.breakdown.total, cents(1030));
    }

    #[test]
    fn test_notice_message() {
        let notice = CouponNotice {
            code: "WOOF10".to_string(),
            reason: CouponRejection::Expired,
        };
        assert_eq!(notice.message(), "Coupon WOOF10 was removed: This coupon has expired");
    }
}
