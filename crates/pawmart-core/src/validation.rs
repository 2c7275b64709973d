//! # Validation Module
//!
//! Input validation utilities for PawMart checkout.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront (TypeScript)                                      │
//! │  ├── Basic format checks (empty code, quantity stepper bounds)         │
//! │  └── Immediate shopper feedback                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler / CheckoutSession (Rust)                        │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE(code) on coupons                                           │
//! │  ├── CHECK(used_count >= 0)                                            │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pawmart_core::validation::{validate_coupon_code, validate_quantity};
//!
//! // Codes are normalized before lookup
//! assert_eq!(validate_coupon_code("  woof10 ").unwrap(), "WOOF10");
//!
//! // Validate quantity before cart operation
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CartItem, CouponDefinition, DiscountType, ShippingAddress};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE, MAX_UNIT_WEIGHT_GRAMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted coupon code.
pub const MAX_COUPON_CODE_LEN: usize = 32;

// =============================================================================
// String Validators
// =============================================================================

/// Validates and normalizes a coupon code.
///
/// ## Rules
/// - Surrounding whitespace is ignored, matching is case-insensitive
/// - Must not be empty, at most 32 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ## Returns
/// The normalized (trimmed, upper-case) code used as the registry key.
///
/// ## Example
/// ```rust
/// use pawmart_core::validation::validate_coupon_code;
///
/// assert_eq!(validate_coupon_code("puppy-love").unwrap(), "PUPPY-LOVE");
/// assert!(validate_coupon_code("").is_err());
/// assert!(validate_coupon_code("two words").is_err());
/// ```
pub fn validate_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > MAX_COUPON_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_COUPON_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_uppercase())
}

/// Validates a shipping region identifier (non-empty).
///
/// Whether the region exists is the tariff table's call, not this one.
pub fn validate_region_id(region_id: &str) -> ValidationResult<()> {
    if region_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "regionId".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  Shopper picks quantity: 5                                             │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → Proceed with add_item, then recompute coupon            │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative amount. Zero is allowed (free items, no minimum).
///
/// ## Example
/// ```rust
/// use pawmart_core::money::Money;
/// use pawmart_core::validation::validate_amount;
///
/// assert!(validate_amount("unitPrice", Money::from_cents(1099)).is_ok());
/// assert!(validate_amount("unitPrice", Money::zero()).is_ok());
/// assert!(validate_amount("unitPrice", Money::from_cents(-100)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price: non-negative and at most MAX_UNIT_PRICE.
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    validate_amount("unitPrice", price)?;

    if price > MAX_UNIT_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "unitPrice".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE.cents(),
        });
    }

    Ok(())
}

/// Validates a per-unit weight in grams (0..=MAX_UNIT_WEIGHT_GRAMS).
pub fn validate_weight_grams(grams: i64) -> ValidationResult<()> {
    if grams < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "unitWeightGrams".to_string(),
        });
    }

    if grams > MAX_UNIT_WEIGHT_GRAMS {
        return Err(ValidationError::OutOfRange {
            field: "unitWeightGrams".to_string(),
            min: 0,
            max: MAX_UNIT_WEIGHT_GRAMS,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size before adding another distinct product.
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (100)
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates a single cart line.
pub fn validate_cart_item(item: &CartItem) -> ValidationResult<()> {
    if item.product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "productId".to_string(),
        });
    }
    validate_quantity(item.quantity)?;
    validate_unit_price(item.unit_price)?;
    validate_weight_grams(item.unit_weight_grams)?;
    Ok(())
}

/// Validates the full item list of an order submission.
///
/// ## Rules
/// - At least one item
/// - At most MAX_CART_ITEMS lines
/// - Every line passes [`validate_cart_item`]
pub fn validate_order_items(items: &[CartItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if items.len() > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    items.iter().try_for_each(validate_cart_item)
}

// =============================================================================
// Coupon Definition Validator
// =============================================================================

/// Validates an admin-supplied coupon definition.
///
/// ## Rules
/// - Code passes [`validate_coupon_code`] (and is returned normalized)
/// - `discount_value` ≥ 0, and ≤ 100 for percentage coupons
/// - `min_order_amount` ≥ 0, `max_discount` ≥ 0 when set
/// - `usage_limit` ≥ 0 when set
///
/// ## Returns
/// A copy of the definition with the code normalized.
pub fn validate_coupon_definition(def: &CouponDefinition) -> ValidationResult<CouponDefinition> {
    let code = validate_coupon_code(&def.code)?;

    match def.discount_type {
        DiscountType::Percentage if !(0..=100).contains(&def.discount_value) => {
            return Err(ValidationError::OutOfRange {
                field: "discountValue".to_string(),
                min: 0,
                max: 100,
            });
        }
        DiscountType::Fixed if def.discount_value < 0 => {
            return Err(ValidationError::MustNotBeNegative {
                field: "discountValue".to_string(),
            });
        }
        _ => {}
    }

    validate_amount("minOrderAmount", def.min_order_amount)?;
    if let Some(cap) = def.max_discount {
        validate_amount("maxDiscount", cap)?;
    }

    if matches!(def.usage_limit, Some(limit) if limit < 0) {
        return Err(ValidationError::MustNotBeNegative {
            field: "usageLimit".to_string(),
        });
    }

    Ok(CouponDefinition {
        code,
        ..def.clone()
    })
}

/// Longest accepted free-text address field.
pub const MAX_ADDRESS_FIELD_LEN: usize = 200;

/// Validates the delivery address of an order submission.
///
/// Every field except `line2` is required.
pub fn validate_shipping_address(address: &ShippingAddress) -> ValidationResult<()> {
    let required = [
        ("recipientName", address.recipient_name.as_str()),
        ("phone", address.phone.as_str()),
        ("line1", address.line1.as_str()),
        ("city", address.city.as_str()),
        ("postalCode", address.postal_code.as_str()),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
    }

    let all = required
        .iter()
        .copied()
        .chain(address.line2.as_deref().map(|l| ("line2", l)));
    for (field, value) in all {
        if value.chars().count() > MAX_ADDRESS_FIELD_LEN {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: MAX_ADDRESS_FIELD_LEN,
            });
        }
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use pawmart_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(discount_type: DiscountType, value: i64) -> CouponDefinition {
        CouponDefinition {
            code: " treats20 ".to_string(),
            discount_type,
            discount_value: value,
            min_order_amount: Money::from_cents(1000),
            max_discount: None,
            usage_limit: Some(100),
            expires_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_validate_coupon_code() {
        assert_eq!(validate_coupon_code("WOOF10").unwrap(), "WOOF10");
        assert_eq!(validate_coupon_code(" woof10\n").unwrap(), "WOOF10");
        assert_eq!(validate_coupon_code("cat_nap-5").unwrap(), "CAT_NAP-5");

        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("   ").is_err());
        assert!(validate_coupon_code("has space").is_err());
        assert!(validate_coupon_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_coupon_code_rejects_non_ascii_letters() {
        // "ß" upper-cases to "SS" and "Ｗ" is a full-width letter
        assert!(matches!(
            validate_coupon_code("straße"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(validate_coupon_code("ＷOOF10").is_err());
        assert!(validate_coupon_code("café").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cart_item() {
        let good = CartItem::new("p1", 1, Money::from_cents(100), 0);
        assert!(validate_cart_item(&good).is_ok());

        let free = CartItem::new("sample", 1, Money::zero(), 10);
        assert!(validate_cart_item(&free).is_ok());

        let negative_price = CartItem::new("p1", 1, Money::from_cents(-1), 0);
        assert!(validate_cart_item(&negative_price).is_err());

        let negative_weight = CartItem::new("p1", 1, Money::from_cents(1), -5);
        assert!(validate_cart_item(&negative_weight).is_err());

        let no_product = CartItem::new(" ", 1, Money::from_cents(1), 0);
        assert!(validate_cart_item(&no_product).is_err());
    }

    #[test]
    fn test_validate_cart_item_upper_bounds() {
        let priciest = CartItem::new("p1", MAX_ITEM_QUANTITY, MAX_UNIT_PRICE, MAX_UNIT_WEIGHT_GRAMS);
        assert!(validate_cart_item(&priciest).is_ok());

        let huge_price = CartItem::new("p1", 2, Money::from_cents(i64::MAX / 2 + 1), 0);
        assert!(matches!(
            validate_cart_item(&huge_price),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "unitPrice"
        ));

        let huge_weight = CartItem::new("p1", 2, Money::from_cents(100), i64::MAX / 2 + 1);
        assert!(matches!(
            validate_cart_item(&huge_weight),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "unitWeightGrams"
        ));
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }

    #[test]
    fn test_validate_order_items() {
        assert!(matches!(
            validate_order_items(&[]),
            Err(ValidationError::Required { .. })
        ));

        let items = vec![CartItem::new("p1", 2, Money::from_cents(500), 750)];
        assert!(validate_order_items(&items).is_ok());

        let too_many: Vec<CartItem> = (0..=MAX_CART_ITEMS)
            .map(|i| CartItem::new(format!("p{i}"), 1, Money::from_cents(1), 1))
            .collect();
        assert!(validate_order_items(&too_many).is_err());
    }

    #[test]
    fn test_validate_shipping_address() {
        let mut address = ShippingAddress {
            recipient_name: "Rex Owner".to_string(),
            phone: "555-0100".to_string(),
            line1: "1 Bark St".to_string(),
            line2: None,
            city: "Dogtown".to_string(),
            postal_code: "12345".to_string(),
        };
        assert!(validate_shipping_address(&address).is_ok());

        address.line2 = Some("x".repeat(MAX_ADDRESS_FIELD_LEN + 1));
        assert!(matches!(
            validate_shipping_address(&address),
            Err(ValidationError::TooLong { ref field, .. }) if field == "line2"
        ));

        address.line2 = None;
        address.city = "  ".to_string();
        assert!(matches!(
            validate_shipping_address(&address),
            Err(ValidationError::Required { ref field }) if field == "city"
        ));
    }

    #[test]
    fn test_validate_coupon_definition_normalizes_code() {
        let def = validate_coupon_definition(&definition(DiscountType::Percentage, 20)).unwrap();
        assert_eq!(def.code, "TREATS20");
        assert_eq!(def.discount_value, 20);
    }

    #[test]
    fn test_validate_coupon_definition_bounds() {
        assert!(validate_coupon_definition(&definition(DiscountType::Percentage, 0)).is_ok());
        assert!(validate_coupon_definition(&definition(DiscountType::Percentage, 100)).is_ok());
        assert!(validate_coupon_definition(&definition(DiscountType::Percentage, 101)).is_err());
        assert!(validate_coupon_definition(&definition(DiscountType::Fixed, 5000)).is_ok());
        assert!(validate_coupon_definition(&definition(DiscountType::Fixed, -1)).is_err());

        let mut def = definition(DiscountType::Fixed, 100);
        def.usage_limit = Some(-1);
        assert!(validate_coupon_definition(&def).is_err());

        let mut def = definition(DiscountType::Percentage, 10);
        def.max_discount = Some(Money::from_cents(-10));
        assert!(validate_coupon_definition(&def).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
