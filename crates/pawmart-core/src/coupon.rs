//! # Coupon Module
//!
//! Coupon eligibility, discount computation and derived lifecycle.
//!
//! ## Validation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate(coupon, subtotal, now)                                        │
//! │                                                                         │
//! │  1. Eligibility, first failure wins:                                    │
//! │       expires_at ≤ now              → Expired                           │
//! │       !is_active                    → Inactive                          │
//! │       used_count ≥ usage_limit      → UsageExceeded                     │
//! │       subtotal < min_order_amount   → BelowMinimum                      │
//! │                                                                         │
//! │  2. Raw discount:                                                       │
//! │       percentage → round_half_up(subtotal × value / 100)                │
//! │                    then min(raw, max_discount) if a cap is set          │
//! │       fixed      → value                                                │
//! │                                                                         │
//! │  3. Clamp: discount = min(raw, subtotal)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The storefront preview and the server run this exact code, so a coupon
//! that previews at $1.50 off is charged at $1.50 off. `NotFound` is never
//! produced here; it belongs to whoever performs the lookup.
//!
//! ## Stale coupons
//! An applied coupon is only valid for the subtotal it was computed against.
//! Every cart edit must call [`recompute`]. A coupon that no longer qualifies
//! is detached and the reason handed back for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Coupon, DiscountType};

// =============================================================================
// Rejection Kinds
// =============================================================================

/// Why a coupon cannot be applied.
///
/// Serialized as the stable reason code the storefront switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Error)]
#[ts(export)]
pub enum CouponRejection {
    #[serde(rename = "COUPON_NOT_FOUND")]
    #[error("Coupon code not found")]
    NotFound,

    #[serde(rename = "COUPON_INACTIVE")]
    #[error("This coupon is not active")]
    Inactive,

    #[serde(rename = "COUPON_EXPIRED")]
    #[error("This coupon has expired")]
    Expired,

    #[serde(rename = "COUPON_BELOW_MINIMUM")]
    #[error("Order subtotal is below the minimum for this coupon")]
    BelowMinimum,

    #[serde(rename = "COUPON_USAGE_EXCEEDED")]
    #[error("This coupon has reached its usage limit")]
    UsageExceeded,
}

impl CouponRejection {
    /// Stable machine-readable code, identical to the serialized form.
    pub const fn reason_code(&self) -> &'static str {
        match self {
            CouponRejection::NotFound => "COUPON_NOT_FOUND",
            CouponRejection::Inactive => "COUPON_INACTIVE",
            CouponRejection::Expired => "COUPON_EXPIRED",
            CouponRejection::BelowMinimum => "COUPON_BELOW_MINIMUM",
            CouponRejection::UsageExceeded => "COUPON_USAGE_EXCEEDED",
        }
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Lifecycle state, derived from stored fields. Never stored itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CouponLifecycle {
    Active,
    Inactive,
    Expired,
    LimitReached,
}

impl Coupon {
    /// Derives the lifecycle state at `now`.
    ///
    /// Precedence: Inactive, then Expired, then LimitReached.
    pub fn lifecycle(&self, now: DateTime<Utc>) -> CouponLifecycle {
        if !self.is_active {
            CouponLifecycle::Inactive
        } else if self.is_expired_at(now) {
            CouponLifecycle::Expired
        } else if !self.has_uses_left() {
            CouponLifecycle::LimitReached
        } else {
            CouponLifecycle::Active
        }
    }

    /// True once `now` has reached `expires_at`.
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if now >= expires_at)
    }

    /// True if unlimited or `used_count < usage_limit`.
    #[inline]
    pub fn has_uses_left(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.used_count < limit,
            None => true,
        }
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Checks the validity predicate, reporting the first failing rule.
pub fn check_eligibility(
    coupon: &Coupon,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<(), CouponRejection> {
    if coupon.is_expired_at(now) {
        return Err(CouponRejection::Expired);
    }
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    if !coupon.has_uses_left() {
        return Err(CouponRejection::UsageExceeded);
    }
    if subtotal < coupon.min_order_amount {
        return Err(CouponRejection::BelowMinimum);
    }
    Ok(())
}

/// Discount before clamping to the subtotal.
///
/// `max_discount` only caps percentage coupons.
pub fn raw_discount(coupon: &Coupon, subtotal: Money) -> Money {
    match coupon.discount_type {
        DiscountType::Percentage => {
            let raw = subtotal.percent_half_up(coupon.discount_value);
            match coupon.max_discount {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
        DiscountType::Fixed => Money::from_cents(coupon.discount_value),
    }
}

/// Validates `coupon` against `subtotal` and returns the discount.
///
/// ## Example
/// ```rust
/// # use chrono::Utc;
/// # use pawmart_core::{Coupon, DiscountType, Money};
/// # let now = Utc::now();
/// let coupon = Coupon {
///     id: "c1".into(),
///     code: "TREATS20".into(),
///     discount_type: DiscountType::Percentage,
///     discount_value: 20,
///     min_order_amount: Money::zero(),
///     max_discount: Some(Money::from_cents(150)),
///     usage_limit: None,
///     used_count: 0,
///     expires_at: None,
///     is_active: true,
///     created_at: now,
///     updated_at: now,
/// };
/// // 20% of $10.00 is $2.00, capped at $1.50
/// let discount = pawmart_core::coupon::validate(&coupon, Money::from_cents(1000), now).unwrap();
/// assert_eq!(discount.cents(), 150);
/// ```
pub fn validate(
    coupon: &Coupon,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<Money, CouponRejection> {
    check_eligibility(coupon, subtotal, now)?;
    Ok(raw_discount(coupon, subtotal).min(subtotal))
}

// =============================================================================
// Applied Coupon
// =============================================================================

/// A coupon attached to a cart, with the discount it produced.
///
/// Only meaningful for the subtotal it was computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub computed_discount: Money,
}

/// Validates and wraps the result as an [`AppliedCoupon`].
pub fn apply(
    coupon: &Coupon,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, CouponRejection> {
    let computed_discount = validate(coupon, subtotal, now)?;
    Ok(AppliedCoupon {
        code: coupon.code.clone(),
        discount_type: coupon.discount_type,
        discount_value: coupon.discount_value,
        computed_discount,
    })
}

/// Result of re-checking an applied coupon after the subtotal changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recomputed {
    /// Still valid; carries the freshly computed discount.
    Kept(AppliedCoupon),
    /// No longer valid; the coupon must be removed from the cart.
    Detached {
        code: String,
        reason: CouponRejection,
    },
}

/// Re-runs the predicate and discount for an applied coupon.
///
/// ```text
/// subtotal 200 ──(remove item)──► 80, coupon min 100
///      │
///      ▼
/// recompute(...) = Detached { code: "WOOF10", reason: BelowMinimum }
/// ```
pub fn recompute(
    applied: &AppliedCoupon,
    coupon: &Coupon,
    new_subtotal: Money,
    now: DateTime<Utc>,
) -> Recomputed {
    match apply(coupon, new_subtotal, now) {
        Ok(fresh) => Recomputed::Kept(fresh),
        Err(reason) => Recomputed::Detached {
            code: applied.code.clone(),
            reason,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(discount_type: DiscountType, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "c1".to_string(),
            code: "WOOF10".to_string(),
            discount_type,
            discount_value: value,
            min_order_amount: Money::zero(),
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            expires_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_percentage_capped() {
        let mut c = coupon(DiscountType::Percentage, 20);
        c.max_discount = Some(cents(150));
        assert_eq!(validate(&c, cents(1000), Utc::now()), Ok(cents(150)));
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let c = coupon(DiscountType::Percentage, 15);
        // 1999 × 15% = 299.85 → 300
        assert_eq!(validate(&c, cents(1999), Utc::now()), Ok(cents(300)));
        // 25 × 10% = 2.5 → 3
        let c = coupon(DiscountType::Percentage, 10);
        assert_eq!(validate(&c, cents(25), Utc::now()), Ok(cents(3)));
    }

    #[test]
    fn test_fixed_clamped_to_subtotal() {
        let c = coupon(DiscountType::Fixed, 200);
        assert_eq!(validate(&c, cents(50), Utc::now()), Ok(cents(50)));
    }

    #[test]
    fn test_cap_ignored_for_fixed() {
        let mut c = coupon(DiscountType::Fixed, 500);
        c.max_discount = Some(cents(100));
        assert_eq!(validate(&c, cents(1000), Utc::now()), Ok(cents(500)));
    }

    #[test]
    fn test_below_minimum() {
        let mut c = coupon(DiscountType::Fixed, 10);
        c.min_order_amount = cents(100);
        assert_eq!(
            validate(&c, cents(99), Utc::now()),
            Err(CouponRejection::BelowMinimum)
        );
        assert_eq!(validate(&c, cents(100), Utc::now()), Ok(cents(10)));
    }

    #[test]
    fn test_expired_regardless_of_active_flag() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, 10);
        c.expires_at = Some(now - Duration::hours(1));

        c.is_active = true;
        assert_eq!(validate(&c, cents(1000), now), Err(CouponRejection::Expired));
        c.is_active = false;
        assert_eq!(validate(&c, cents(1000), now), Err(CouponRejection::Expired));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, 10);

        c.expires_at = Some(now);
        assert_eq!(validate(&c, cents(1000), now), Err(CouponRejection::Expired));

        c.expires_at = Some(now + Duration::milliseconds(1));
        assert!(validate(&c, cents(1000), now).is_ok());
    }

    #[test]
    fn test_inactive() {
        let mut c = coupon(DiscountType::Fixed, 10);
        c.is_active = false;
        assert_eq!(
            validate(&c, cents(1000), Utc::now()),
            Err(CouponRejection::Inactive)
        );
    }

    #[test]
    fn test_usage_exceeded() {
        let mut c = coupon(DiscountType::Fixed, 10);
        c.usage_limit = Some(3);
        c.used_count = 2;
        assert!(validate(&c, cents(1000), Utc::now()).is_ok());
        c.used_count = 3;
        assert_eq!(
            validate(&c, cents(1000), Utc::now()),
            Err(CouponRejection::UsageExceeded)
        );
    }

    #[test]
    fn test_check_order_reports_first_failure() {
        let mut c = coupon(DiscountType::Fixed, 10);
        c.is_active = false;
        c.usage_limit = Some(0);
        c.min_order_amount = cents(1000);
        assert_eq!(
            validate(&c, cents(1), Utc::now()),
            Err(CouponRejection::Inactive)
        );

        c.is_active = true;
        assert_eq!(
            validate(&c, cents(1), Utc::now()),
            Err(CouponRejection::UsageExceeded)
        );
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        let now = Utc::now();
        for subtotal in [0, 1, 99, 100, 101, 5000] {
            for c in [
                coupon(DiscountType::Percentage, 100),
                coupon(DiscountType::Fixed, 100),
                coupon(DiscountType::Fixed, 0),
            ] {
                let d = validate(&c, cents(subtotal), now).unwrap();
                assert!(d >= Money::zero() && d <= cents(subtotal));
            }
        }
    }

    #[test]
    fn test_lifecycle() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, 10);
        assert_eq!(c.lifecycle(now), CouponLifecycle::Active);

        c.usage_limit = Some(1);
        c.used_count = 1;
        assert_eq!(c.lifecycle(now), CouponLifecycle::LimitReached);

        c.expires_at = Some(now);
        assert_eq!(c.lifecycle(now), CouponLifecycle::Expired);

        c.is_active = false;
        assert_eq!(c.lifecycle(now), CouponLifecycle::Inactive);
    }

    #[test]
    fn test_recompute_detaches_on_shrink() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Percentage, 10);
        c.min_order_amount = cents(100);

        let applied = apply(&c, cents(200), now).unwrap();
        assert_eq!(applied.computed_discount, cents(20));

        assert_eq!(
            recompute(&applied, &c, cents(80), now),
            Recomputed::Detached {
                code: "WOOF10".to_string(),
                reason: CouponRejection::BelowMinimum,
            }
        );
    }

    #[test]
    fn test_recompute_refreshes_discount() {
        let now = Utc::now();
        let c = coupon(DiscountType::Percentage, 10);
        let applied = apply(&c, cents(200), now).unwrap();

        match recompute(&applied, &c, cents(500), now) {
            Recomputed::Kept(fresh) => assert_eq!(fresh.computed_discount, cents(50)),
            other => panic!("expected Kept, got {:?}", other),
        }
    }

    #[test]
    fn test_reason_codes_match_serde() {
        for kind in [
            CouponRejection::NotFound,
            CouponRejection::Inactive,
            CouponRejection::Expired,
            CouponRejection::BelowMinimum,
            CouponRejection::UsageExceeded,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.reason_code()));
        }
    }
}
