//! # Error Types
//!
//! Domain-specific error types for pawmart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pawmart-core errors (this file + coupon.rs)                           │
//! │  ├── CoreError        - Pricing / cart domain errors                   │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── CouponRejection  - Why a coupon cannot be applied (coupon.rs)     │
//! │                                                                         │
//! │  pawmart-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CheckoutError    - Order submission failures                      │
//! │                                                                         │
//! │  HTTP API errors (in app)                                              │
//! │  └── ApiError         - What the storefront sees (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Storefront   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (region, product ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or pricing failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Region is not present in the tariff table.
    ///
    /// ## When This Occurs
    /// - Storefront sent a stale region list
    /// - Address form posted a free-text region
    #[error("Unknown shipping region: {0}")]
    UnknownRegion(String),

    /// A computed breakdown broke one of the pricing invariants.
    ///
    /// ## When This Occurs
    /// Never, if the validator and engine are correct. Callers must log this
    /// at error level and reject the request; the numbers are never
    /// silently corrected.
    ///
    /// ```text
    /// subtotal=1000 shipping=100 fee=10 discount=1200
    ///      │
    ///      ▼
    /// InvariantViolation { detail: "discount $12.00 exceeds subtotal $10.00" }
    ///      │
    ///      ▼
    /// HTTP 500 "internal pricing error"
    /// ```
    #[error("Pricing invariant violated: {detail}")]
    InvariantViolation { detail: String },

    /// Product is not in the checkout session.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// The same product was added again with a different price or weight.
    #[error("Product {product_id} is already in the cart at a different price or weight")]
    LineMismatch { product_id: String },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Builds an invariant violation for a discount outside `[0, subtotal]`.
    pub(crate) fn discount_out_of_range(discount: Money, subtotal: Money) -> Self {
        CoreError::InvariantViolation {
            detail: format!("discount {} outside [0, subtotal {}]", discount, subtotal),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid coupon code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
