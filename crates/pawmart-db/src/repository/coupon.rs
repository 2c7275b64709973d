//! # Coupon Repository
//!
//! The coupon registry and the atomic redemption.
//!
//! ## Redemption: one conditional UPDATE
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Check-then-act (WRONG)              Conditional update (THIS MODULE)   │
//! │  ──────────────────────              ────────────────────────────────   │
//! │  A: SELECT used_count → 0            A: UPDATE ... SET used_count + 1   │
//! │  B: SELECT used_count → 0               WHERE used_count < limit ...    │
//! │  A: UPDATE used_count = 1               → 1 row, redeemed               │
//! │  B: UPDATE used_count = 2  ❌         B: same UPDATE (waits for A)       │
//! │                                         → 0 rows, re-read, classify    │
//! │                                           as UsageExceeded             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The WHERE clause restates the validity predicate from
//! `pawmart_core::coupon::check_eligibility`. When no row matches, the row
//! is re-read and classified with that same function so callers get the
//! same rejection kinds the preview uses.

use chrono::{DateTime, Utc};
use pawmart_core::coupon::{self, CouponLifecycle};
use pawmart_core::validation::validate_coupon_definition;
use pawmart_core::{Coupon, CouponDefinition, CouponRejection, DiscountType, Money};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Column list matching [`CouponRecord`].
const COUPON_COLUMNS: &str = r#"
    id, code, discount_type, discount_value,
    min_order_cents, max_discount_cents,
    usage_limit, used_count, expires_at_ms, is_active,
    created_at, updated_at
"#;

// =============================================================================
// Records
// =============================================================================

/// Row shape of the `coupons` table.
#[derive(Debug, sqlx::FromRow)]
struct CouponRecord {
    id: String,
    code: String,
    discount_type: DiscountType,
    discount_value: i64,
    min_order_cents: i64,
    max_discount_cents: Option<i64>,
    usage_limit: Option<i64>,
    used_count: i64,
    expires_at_ms: Option<i64>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CouponRecord> for Coupon {
    type Error = DbError;

    fn try_from(r: CouponRecord) -> DbResult<Self> {
        let expires_at = match r.expires_at_ms {
            Some(ms) => Some(DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
                DbError::Internal(format!("coupon {} has out-of-range expiry {}", r.code, ms))
            })?),
            None => None,
        };

        Ok(Coupon {
            id: r.id,
            code: r.code,
            discount_type: r.discount_type,
            discount_value: r.discount_value,
            min_order_amount: Money::from_cents(r.min_order_cents),
            max_discount: r.max_discount_cents.map(Money::from_cents),
            usage_limit: r.usage_limit,
            used_count: r.used_count,
            expires_at,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Outcome of an atomic redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// Counter incremented. Carries the row as it is after the increment.
    Redeemed(Coupon),
    /// Nothing changed. Carries why the coupon could not be redeemed.
    Rejected(CouponRejection),
}

/// Trimmed, upper-cased registry key.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the coupon registry.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Creates a coupon with `used_count = 0`.
    ///
    /// ## Errors
    /// - `Validation` if the definition is malformed
    /// - `UniqueViolation` if the code already exists
    pub async fn create(&self, def: &CouponDefinition, now: DateTime<Utc>) -> DbResult<Coupon> {
        let def = validate_coupon_definition(def)?;
        let id = Uuid::new_v4().to_string();

        debug!(code = %def.code, discount_type = def.discount_type.as_str(), "Creating coupon");

        let sql = format!(
            r#"
            INSERT INTO coupons (
                id, code, discount_type, discount_value,
                min_order_cents, max_discount_cents,
                usage_limit, used_count, expires_at_ms, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10, ?10)
            RETURNING {COUPON_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, CouponRecord>(&sql)
            .bind(&id)
            .bind(&def.code)
            .bind(def.discount_type)
            .bind(def.discount_value)
            .bind(def.min_order_amount.cents())
            .bind(def.max_discount.map(|m| m.cents()))
            .bind(def.usage_limit)
            .bind(def.expires_at.map(|t| t.timestamp_millis()))
            .bind(def.is_active)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("code", def.code.clone()),
                other => other,
            })?;

        info!(code = %def.code, id = %id, "Coupon created");
        record.try_into()
    }

    /// Replaces the editable fields of an existing coupon.
    ///
    /// `used_count` is never touched. Lowering `usage_limit` below the
    /// current `used_count` is refused by the schema (`CheckViolation`).
    pub async fn update_definition(&self, def: &CouponDefinition, now: DateTime<Utc>) -> DbResult<Coupon> {
        let def = validate_coupon_definition(def)?;

        debug!(code = %def.code, "Updating coupon definition");

        let sql = format!(
            r#"
            UPDATE coupons SET
                discount_type = ?2,
                discount_value = ?3,
                min_order_cents = ?4,
                max_discount_cents = ?5,
                usage_limit = ?6,
                expires_at_ms = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE code = ?1
            RETURNING {COUPON_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, CouponRecord>(&sql)
            .bind(&def.code)
            .bind(def.discount_type)
            .bind(def.discount_value)
            .bind(def.min_order_amount.cents())
            .bind(def.max_discount.map(|m| m.cents()))
            .bind(def.usage_limit)
            .bind(def.expires_at.map(|t| t.timestamp_millis()))
            .bind(def.is_active)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Coupon", def.code.clone()))?;

        record.try_into()
    }

    /// Looks a coupon up by code (case-insensitive, surrounding whitespace ignored).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_code(&mut conn, &normalize_code(code)).await
    }

    /// Coupons whose lifecycle is `Active` at `now`, ordered by code.
    pub async fn list_active(&self, now: DateTime<Utc>) -> DbResult<Vec<Coupon>> {
        let sql = format!(
            r#"
            SELECT {COUPON_COLUMNS}
            FROM coupons
            WHERE is_active = 1
              AND (expires_at_ms IS NULL OR expires_at_ms > ?1)
              AND (usage_limit IS NULL OR used_count < usage_limit)
            ORDER BY code
            "#
        );

        let records = sqlx::query_as::<_, CouponRecord>(&sql)
            .bind(now.timestamp_millis())
            .fetch_all(&self.pool)
            .await?;

        let coupons = records
            .into_iter()
            .map(Coupon::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        // SQL and the core lifecycle must agree; the core one is authoritative.
        Ok(coupons
            .into_iter()
            .filter(|c| c.lifecycle(now) == CouponLifecycle::Active)
            .collect())
    }

    /// Atomically redeems a coupon outside any caller transaction.
    pub async fn redeem(&self, code: &str, subtotal: Money, now: DateTime<Utc>) -> DbResult<Redemption> {
        let mut conn = self.pool.acquire().await?;
        Self::redeem_in_tx(&mut conn, code, subtotal, now).await
    }

    /// Atomically redeems a coupon on `conn`.
    ///
    /// Pass the connection of an open transaction (`&mut *tx`) to make the
    /// increment commit or roll back together with the caller's other writes.
    ///
    /// ## Returns
    /// - `Redeemed(coupon)` if exactly one row matched the validity predicate
    /// - `Rejected(kind)` otherwise, with `kind` from re-reading the row
    pub async fn redeem_in_tx(
        conn: &mut SqliteConnection,
        code: &str,
        subtotal: Money,
        now: DateTime<Utc>,
    ) -> DbResult<Redemption> {
        let code = normalize_code(code);
        debug!(code = %code, subtotal = subtotal.cents(), "Redeeming coupon");

        let sql = format!(
            r#"
            UPDATE coupons SET
                used_count = used_count + 1,
                updated_at = ?1
            WHERE code = ?2
              AND is_active = 1
              AND (expires_at_ms IS NULL OR expires_at_ms > ?3)
              AND min_order_cents <= ?4
              AND (usage_limit IS NULL OR used_count < usage_limit)
            RETURNING {COUPON_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, CouponRecord>(&sql)
            .bind(now)
            .bind(&code)
            .bind(now.timestamp_millis())
            .bind(subtotal.cents())
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(record) = updated {
            let coupon: Coupon = record.try_into()?;
            info!(code = %code, used_count = coupon.used_count, "Coupon redeemed");
            return Ok(Redemption::Redeemed(coupon));
        }

        let kind = match fetch_by_code(conn, &code).await? {
            None => CouponRejection::NotFound,
            Some(current) => match coupon::check_eligibility(&current, subtotal, now) {
                Err(kind) => kind,
                // Row changed between the UPDATE and the re-read
                Ok(()) => CouponRejection::UsageExceeded,
            },
        };

        warn!(code = %code, reason = kind.reason_code(), "Coupon redemption rejected");
        Ok(Redemption::Rejected(kind))
    }
}

async fn fetch_by_code(conn: &mut SqliteConnection, code: &str) -> DbResult<Option<Coupon>> {
    let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE code = ?1");

    sqlx::query_as::<_, CouponRecord>(&sql)
        .bind(code)
        .fetch_optional(conn)
        .await?
        .map(Coupon::try_from)
        .transpose()
}

// =============================================================================
// Unit Tests
// =============================================================================
