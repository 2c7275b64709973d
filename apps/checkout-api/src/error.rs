//! Error types for the Checkout API.
//!
//! ```text
//! CheckoutError / DbError / CoreError
//!      │
//!      ▼
//! ApiError ──► (StatusCode, {"success": false, "reason": CODE, "message": ...})
//! ```
//!
//! Internal failures are logged here with their detail and answered with a
//! generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pawmart_core::{CoreError, CouponRejection, ValidationError};
use pawmart_db::{CheckoutError, DbError};
use serde::Serialize;
use tracing::error;

/// Checkout API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unknown shipping region: {0}")]
    UnknownRegion(String),

    #[error("{0}")]
    Coupon(CouponRejection),

    #[error("This coupon just became unavailable")]
    RedemptionConflict(CouponRejection),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Pricing invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    reason: &'static str,
    message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::UnknownRegion(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Coupon(CouponRejection::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Coupon(_) => StatusCode::BAD_REQUEST,
            ApiError::RedemptionConflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvariantViolation(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => "VALIDATION_ERROR",
            ApiError::UnknownRegion(_) => "UNKNOWN_REGION",
            ApiError::Coupon(kind) => kind.reason_code(),
            ApiError::RedemptionConflict(_) => "REDEMPTION_CONFLICT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvariantViolation(_) => "INTERNAL_PRICING_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn response_message(&self) -> String {
        match self {
            ApiError::InvariantViolation(_) => "Internal pricing error".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::InvariantViolation(detail) => error!(%detail, "Pricing invariant violated"),
            ApiError::Internal(detail) => error!(%detail, "Internal error"),
            _ => {}
        }

        let body = ErrorBody {
            success: false,
            reason: self.reason(),
            message: self.response_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownRegion(region) => ApiError::UnknownRegion(region),
            CoreError::InvariantViolation { detail } => ApiError::InvariantViolation(detail),
            CoreError::Validation(e) => ApiError::Validation(e),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::NotFound(format!("{} {}", entity, id)),
            DbError::Validation(e) => ApiError::Validation(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(e) => ApiError::Validation(e),
            CheckoutError::Pricing(e) => e.into(),
            CheckoutError::Coupon(kind) => ApiError::Coupon(kind),
            CheckoutError::RedemptionConflict(kind) => ApiError::RedemptionConflict(kind),
            CheckoutError::Db(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Coupon(CouponRejection::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Coupon(CouponRejection::Expired).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::RedemptionConflict(CouponRejection::UsageExceeded).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(CoreError::UnknownRegion("moon".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_invariant_violation_hides_detail() {
        let err = ApiError::from(CheckoutError::Pricing(CoreError::InvariantViolation {
            detail: "discount $12.00 outside [0, subtotal $10.00]".to_string(),
        }));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.reason(), "INTERNAL_PRICING_ERROR");
        assert_eq!(err.response_message(), "Internal pricing error");
    }

    #[test]
    fn test_coupon_reason_codes() {
        let err = ApiError::from(CheckoutError::Coupon(CouponRejection::BelowMinimum));
        assert_eq!(err.reason(), "COUPON_BELOW_MINIMUM");
        assert_eq!(
            err.response_message(),
            "Order subtotal is below the minimum for this coupon"
        );
    }
}
