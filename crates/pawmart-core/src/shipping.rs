//! # Shipping Module
//!
//! Weight-based shipping tariffs.
//!
//! ## Tariff Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_weight = Σ (unit_weight_grams × quantity)                        │
//! │                                                                         │
//! │  weight ≤ 1000 g   →  base_cost                                         │
//! │  weight > 1000 g   →  base_cost + (ceil(weight / 1000) - 1) × per_kg    │
//! │                                                                         │
//! │  metro: base $1.00, +$0.20/kg                                           │
//! │     0 g  → $1.00     1000 g → $1.00                                     │
//! │  1500 g  → $1.20     2001 g → $1.40                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Coupons never touch shipping; the cost computed here passes through the
//! pricing engine unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::CartItem;

/// Grams covered by the base cost, and the size of each extra step.
pub const GRAMS_PER_KG: i64 = 1000;

// =============================================================================
// Shipping Region
// =============================================================================

/// A delivery region and its tariff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRegion {
    pub region_id: String,
    /// Cost of the first kilogram (or any lighter parcel).
    pub base_cost: Money,
    /// Cost of each additional started kilogram.
    pub per_kg_increment: Money,
}

impl ShippingRegion {
    pub fn new(region_id: impl Into<String>, base_cost: Money, per_kg_increment: Money) -> Self {
        ShippingRegion {
            region_id: region_id.into(),
            base_cost,
            per_kg_increment,
        }
    }

    /// Shipping cost for a parcel of `weight_grams` in this region.
    ///
    /// ## Example
    /// ```rust
    /// use pawmart_core::money::Money;
    /// use pawmart_core::shipping::ShippingRegion;
    ///
    /// let metro = ShippingRegion::new("metro", Money::from_cents(100), Money::from_cents(20));
    /// assert_eq!(metro.cost_for_weight(1500).cents(), 120);
    /// ```
    pub fn cost_for_weight(&self, weight_grams: i64) -> Money {
        if weight_grams <= GRAMS_PER_KG {
            return self.base_cost;
        }
        // ceil(w / 1000) - 1 without floats
        let started_kg = (weight_grams + GRAMS_PER_KG - 1) / GRAMS_PER_KG;
        self.base_cost + self.per_kg_increment * (started_kg - 1)
    }
}

// =============================================================================
// Tariff Table
// =============================================================================

/// Immutable region → tariff mapping, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TariffTable {
    regions: BTreeMap<String, ShippingRegion>,
}

impl TariffTable {
    /// Builds a table. A later region with the same id replaces an earlier one.
    pub fn new(regions: impl IntoIterator<Item = ShippingRegion>) -> Self {
        TariffTable {
            regions: regions
                .into_iter()
                .map(|r| (r.region_id.clone(), r))
                .collect(),
        }
    }

    /// Looks up a region.
    ///
    /// ## Errors
    /// `CoreError::UnknownRegion` if the id is not in the table.
    pub fn lookup(&self, region_id: &str) -> CoreResult<&ShippingRegion> {
        self.regions
            .get(region_id)
            .ok_or_else(|| CoreError::UnknownRegion(region_id.to_string()))
    }

    /// All regions, ordered by id.
    pub fn regions(&self) -> impl Iterator<Item = &ShippingRegion> {
        self.regions.values()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }
}

impl Default for TariffTable {
    /// The standard PawMart regions.
    fn default() -> Self {
        TariffTable::new([
            ShippingRegion::new("metro", Money::from_cents(100), Money::from_cents(20)),
            ShippingRegion::new("regional", Money::from_cents(250), Money::from_cents(50)),
            ShippingRegion::new("remote", Money::from_cents(500), Money::from_cents(120)),
        ])
    }
}

// =============================================================================
// Shipping Cost Calculator
// =============================================================================

/// Total cart weight in grams.
pub fn cart_weight_grams(items: &[CartItem]) -> i64 {
    items.iter().map(CartItem::line_weight_grams).sum()
}

/// Shipping cost for `items` delivered to `region_id`.
///
/// Zero-weight carts (gift cards, digital items) still pay the base cost.
pub fn shipping_cost(tariff: &TariffTable, items: &[CartItem], region_id: &str) -> CoreResult<Money> {
    let region = tariff.lookup(region_id)?;
    Ok(region.cost_for_weight(cart_weight_grams(items)))
}

// =============================================================================
// Unit Tests
// =============================================================================
