//! # Pricing Engine
//!
//! Produces the canonical checkout breakdown. Pure: same inputs, same cents.
//!
//! ## Breakdown
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  items ──► subtotal = Σ unit_price × qty ───────────┐                   │
//! │    │                                                │                   │
//! │    └──► weight ──► TariffTable[region] ──► shipping ┤                   │
//! │                                                     │                   │
//! │  configured platform fee ───────────────────────────┤                   │
//! │                                                     │                   │
//! │  coupon lookup ──► validate(coupon, subtotal) ──► discount (subtract)  │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │          total = subtotal + shipping + fee - discount                   │
//! │                                                                         │
//! │  Coupons discount the subtotal only. Shipping and fee pass through.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A breakdown that breaks `0 ≤ discount ≤ subtotal` or `total ≥ 0` is
//! returned as [`CoreError::InvariantViolation`] and never corrected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coupon::{self, AppliedCoupon, CouponRejection};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::shipping::{self, TariffTable};
use crate::types::{CartItem, Coupon};

// =============================================================================
// Inputs
// =============================================================================

/// What the caller found when it looked the coupon code up.
#[derive(Debug, Clone, Copy)]
pub enum CouponLookup<'a> {
    /// Shopper did not enter a code.
    None,
    /// Code resolved to this coupon; eligibility is checked by the engine.
    Found(&'a Coupon),
    /// Code did not resolve to any coupon.
    NotFound(&'a str),
    /// Coupon was already consumed by the atomic redemption, which checked
    /// eligibility itself. Only the discount is computed.
    Redeemed(&'a Coupon),
}

// =============================================================================
// Outputs
// =============================================================================

/// The canonical breakdown. Every field in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub platform_fee: Money,
    pub discount: Money,
    pub total: Money,
}

/// What happened to the coupon during pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CouponOutcome {
    NoCoupon,
    Applied { coupon: AppliedCoupon },
    Rejected { code: String, reason: CouponRejection },
}

impl CouponOutcome {
    pub fn applied(&self) -> Option<&AppliedCoupon> {
        match self {
            CouponOutcome::Applied { coupon } => Some(coupon),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<CouponRejection> {
        match self {
            CouponOutcome::Rejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// A priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub breakdown: PricingBreakdown,
    pub coupon: CouponOutcome,
}

// =============================================================================
// Engine
// =============================================================================

/// Prices carts against a tariff table and a flat platform fee.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    tariff: TariffTable,
    platform_fee: Money,
}

impl PricingEngine {
    pub fn new(tariff: TariffTable, platform_fee: Money) -> Self {
        PricingEngine {
            tariff,
            platform_fee,
        }
    }

    pub fn tariff(&self) -> &TariffTable {
        &self.tariff
    }

    pub fn platform_fee(&self) -> Money {
        self.platform_fee
    }

    /// `Σ unit_price × quantity`.
    pub fn subtotal(&self, items: &[CartItem]) -> Money {
        items.iter().map(CartItem::line_total).sum()
    }

    /// Prices `items` shipped to `region_id`.
    ///
    /// A rejected coupon does not fail the quote: the breakdown carries no
    /// discount and the outcome carries the reason. Callers that must not
    /// proceed without the coupon (order submission) check the outcome.
    ///
    /// ## Errors
    /// - `UnknownRegion` if the region is not in the tariff table
    /// - `InvariantViolation` if the assembled numbers are inconsistent
    pub fn quote(
        &self,
        items: &[CartItem],
        region_id: &str,
        lookup: CouponLookup<'_>,
        now: DateTime<Utc>,
    ) -> CoreResult<Quote> {
        let subtotal = self.subtotal(items);
        let shipping_cost = shipping::shipping_cost(&self.tariff, items, region_id)?;

        let outcome = match lookup {
            CouponLookup::None => CouponOutcome::NoCoupon,
            CouponLookup::NotFound(code) => CouponOutcome::Rejected {
                code: code.to_string(),
                reason: CouponRejection::NotFound,
            },
            CouponLookup::Found(found) => match coupon::apply(found, subtotal, now) {
                Ok(applied) => CouponOutcome::Applied { coupon: applied },
                Err(reason) => CouponOutcome::Rejected {
                    code: found.code.clone(),
                    reason,
                },
            },
            CouponLookup::Redeemed(redeemed) => CouponOutcome::Applied {
                coupon: AppliedCoupon {
                    code: redeemed.code.clone(),
                    discount_type: redeemed.discount_type,
                    discount_value: redeemed.discount_value,
                    computed_discount: coupon::raw_discount(redeemed, subtotal).min(subtotal),
                },
            },
        };

        let discount = outcome
            .applied()
            .map(|a| a.computed_discount)
            .unwrap_or_default();

        let breakdown = self.assemble(subtotal, shipping_cost, discount)?;
        Ok(Quote {
            breakdown,
            coupon: outcome,
        })
    }

    /// Assembles and checks a breakdown.
    pub fn assemble(
        &self,
        subtotal: Money,
        shipping_cost: Money,
        discount: Money,
    ) -> CoreResult<PricingBreakdown> {
        if discount.is_negative() || discount > subtotal {
            return Err(CoreError::discount_out_of_range(discount, subtotal));
        }

        let total = subtotal + shipping_cost + self.platform_fee - discount;
        if total.is_negative() {
            return Err(CoreError::InvariantViolation {
                detail: format!(
                    "negative total {} (subtotal {}, shipping {}, fee {}, discount {})",
                    total, subtotal, shipping_cost, self.platform_fee, discount
                ),
            });
        }

        Ok(PricingBreakdown {
            subtotal,
            shipping_cost,
            platform_fee: self.platform_fee,
            discount,
            total,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::ShippingRegion;
    use crate::types::DiscountType;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    fn engine() -> PricingEngine {
        let tariff = TariffTable::new([ShippingRegion::new("metro", cents(100), cents(20))]);
        PricingEngine::new(tariff, cents(10))
    }

    fn coupon(discount_type: DiscountType, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "c1".to_string(),
            code: "WOOF".to_string(),
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

    fn kibble() -> Vec<CartItem> {
        // subtotal 1000, weight 1500 g
        vec![CartItem::new("kibble", 2, cents(500), 750)]
    }

    #[test]
    fn test_total_without_coupon() {
        let quote = engine()
            .quote(&kibble(), "metro", CouponLookup::None, Utc::now())
            .unwrap();
        assert_eq!(
            quote.breakdown,
            PricingBreakdown {
                subtotal: cents(1000),
                shipping_cost: cents(120),
                platform_fee: cents(10),
                discount: Money::zero(),
                total: cents(1130),
            }
        );
        assert_eq!(quote.coupon, CouponOutcome::NoCoupon);
    }

    #[test]
    fn test_total_with_capped_coupon() {
        let mut c = coupon(DiscountType::Percentage, 20);
        c.max_discount = Some(cents(150));
        let quote = engine()
            .quote(&kibble(), "metro", CouponLookup::Found(&c), Utc::now())
            .unwrap();

        let b = quote.breakdown;
        assert_eq!(b.discount, cents(150));
        assert_eq!(b.total, b.subtotal + b.shipping_cost + b.platform_fee - b.discount);
        assert_eq!(b.total, cents(980));
    }

    #[test]
    fn test_coupon_never_discounts_shipping_or_fee() {
        // Fixed coupon far larger than the whole order
        let c = coupon(DiscountType::Fixed, 1_000_000);
        let quote = engine()
            .quote(&kibble(), "metro", CouponLookup::Found(&c), Utc::now())
            .unwrap();

        assert_eq!(quote.breakdown.discount, cents(1000));
        assert_eq!(quote.breakdown.total, cents(120 + 10));
    }

    #[test]
    fn test_rejected_coupon_priced_without_discount() {
        let mut c = coupon(DiscountType::Fixed, 100);
        c.min_order_amount = cents(5000);
        let quote = engine()
            .quote(&kibble(), "metro", CouponLookup::Found(&c), Utc::now())
            .unwrap();

        assert_eq!(quote.breakdown.discount, Money::zero());
        assert_eq!(quote.coupon.rejection(), Some(CouponRejection::BelowMinimum));
    }

    #[test]
    fn test_not_found_lookup() {
        let quote = engine()
            .quote(&kibble(), "metro", CouponLookup::NotFound("NOPE"), Utc::now())
            .unwrap();
        assert_eq!(
            quote.coupon,
            CouponOutcome::Rejected {
                code: "NOPE".to_string(),
                reason: CouponRejection::NotFound,
            }
        );
    }

    #[test]
    fn test_redeemed_coupon_skips_eligibility() {
        // Redemption just used the last slot; the discount still applies.
        let mut c = coupon(DiscountType::Percentage, 10);
        c.usage_limit = Some(1);
        c.used_count = 1;
        let quote = engine()
            .quote(&kibble(), "metro", CouponLookup::Redeemed(&c), Utc::now())
            .unwrap();
        assert_eq!(quote.breakdown.discount, cents(100));
    }

    #[test]
    fn test_unknown_region() {
        let err = engine()
            .quote(&kibble(), "moon", CouponLookup::None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownRegion(_)));
    }

    #[test]
    fn test_assemble_rejects_bad_discount() {
        let e = engine();
        assert!(matches!(
            e.assemble(cents(100), cents(0), cents(101)),
            Err(CoreError::InvariantViolation { .. })
        ));
        assert!(matches!(
            e.assemble(cents(100), cents(0), cents(-1)),
            Err(CoreError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_assemble_rejects_negative_total() {
        let tariff = TariffTable::new([ShippingRegion::new("odd", cents(-5000), cents(0))]);
        let e = PricingEngine::new(tariff, cents(10));
        let err = e
            .quote(&kibble(), "odd", CouponLookup::None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolation { .. }));
    }

    #[test]
    fn test_outcome_wire_format() {
        let outcome = CouponOutcome::Rejected {
            code: "WOOF".to_string(),
            reason: CouponRejection::Expired,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "COUPON_EXPIRED");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn item() -> impl Strategy<Value = CartItem> {
            (1i64..=50, 0i64..=100_000, 0i64..=20_000)
                .prop_map(|(qty, price, grams)| CartItem::new("sku", qty, cents(price), grams))
        }

        fn any_coupon() -> impl Strategy<Value = Coupon> {
            (
                prop_oneof![Just(DiscountType::Percentage), Just(DiscountType::Fixed)],
                0i64..=200_000,
                0i64..=500_000,
                proptest::option::of(0i64..=50_000),
            )
                .prop_map(|(discount_type, value, min_order, cap)| {
                    let value = match discount_type {
                        DiscountType::Percentage => value % 101,
                        DiscountType::Fixed => value,
                    };
                    let mut c = coupon(discount_type, value);
                    c.min_order_amount = cents(min_order);
                    c.max_discount = cap.map(cents);
                    c
                })
        }

        fn tariff_engine(base: i64, per_kg: i64, fee: i64) -> PricingEngine {
            let tariff = TariffTable::new([ShippingRegion::new("zone", cents(base), cents(per_kg))]);
            PricingEngine::new(tariff, cents(fee))
        }

        proptest! {
            #[test]
            fn breakdown_adds_up(
                items in proptest::collection::vec(item(), 1..10),
                c in any_coupon(),
                base in 0i64..=5_000,
                per_kg in 0i64..=1_000,
                fee in 1i64..=1_000,
            ) {
                let engine = tariff_engine(base, per_kg, fee);
                let quote = engine
                    .quote(&items, "zone", CouponLookup::Found(&c), Utc::now())
                    .unwrap();
                let b = quote.breakdown;

                prop_assert_eq!(b.subtotal, engine.subtotal(&items));
                prop_assert_eq!(b.total, b.subtotal + b.shipping_cost + b.platform_fee - b.discount);
                prop_assert!(!b.discount.is_negative());
                prop_assert!(b.discount <= b.subtotal);
                prop_assert!(!b.total.is_negative());
                if quote.coupon.rejection().is_some() {
                    prop_assert_eq!(b.discount, Money::zero());
                }
            }

            #[test]
            fn discount_ignores_shipping(
                items in proptest::collection::vec(item(), 1..10),
                c in any_coupon(),
                near in (0i64..=500, 0i64..=100),
                far in (0i64..=50_000, 0i64..=10_000),
            ) {
                let now = Utc::now();
                let cheap = tariff_engine(near.0, near.1, 10)
                    .quote(&items, "zone", CouponLookup::Found(&c), now)
                    .unwrap();
                let costly = tariff_engine(far.0, far.1, 10)
                    .quote(&items, "zone", CouponLookup::Found(&c), now)
                    .unwrap();

                prop_assert_eq!(cheap.breakdown.discount, costly.breakdown.discount);
                prop_assert_eq!(cheap.coupon, costly.coupon);
            }
        }
    }
}
