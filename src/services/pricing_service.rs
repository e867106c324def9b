use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::coupon::{Coupon, DiscountType};
use crate::models::plan::{plan_applies, PlanType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountResult {
    pub discount_amount: Decimal,
    pub final_price: Decimal,
}

/// Applies a coupon discount to `price`.
///
/// The discount is rounded to the nearest whole unit (halves away from zero)
/// and clamped to `[0, price]`, so the final price is never negative.
pub fn calculate_discount(price: Decimal, discount_type: DiscountType, value: Decimal) -> DiscountResult {
    let price = price.max(Decimal::ZERO);
    let raw = match discount_type {
        DiscountType::Percentage => price * value / Decimal::ONE_HUNDRED,
        DiscountType::Fixed => value,
    };
    let discount_amount = raw
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .max(Decimal::ZERO)
        .min(price);
    DiscountResult {
        discount_amount,
        final_price: price - discount_amount,
    }
}

/// Why a coupon cannot be used right now, or `None` when it can.
pub fn coupon_rejection(coupon: &Coupon, plan: PlanType, now: DateTime<Utc>) -> Option<String> {
    if !coupon.status.eq_ignore_ascii_case("active") {
        return Some("This coupon is no longer active".to_string());
    }
    if coupon.expires_at.map(|exp| exp <= now).unwrap_or(false) {
        return Some("This coupon has expired".to_string());
    }
    if let Some(limit) = coupon.usage_limit {
        if coupon.usage_count >= limit {
            return Some("This coupon has reached its usage limit".to_string());
        }
    }
    if !plan_applies(&coupon.applicable_plans, plan) {
        return Some(format!("This coupon does not apply to the {} plan", plan));
    }
    if DiscountType::parse(&coupon.discount_type).is_none() {
        return Some("This coupon is misconfigured".to_string());
    }
    None
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponQuote {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub original_price: Decimal,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
}

#[derive(Clone)]
pub struct CouponService {
    pool: PgPool,
}

impl CouponService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"SELECT * FROM coupons WHERE UPPER(code) = UPPER($1)"#,
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(coupon)
    }

    /// Validates `code` for `plan` and prices it against `price`.
    pub async fn quote(&self, code: &str, plan: PlanType, price: Decimal) -> Result<CouponQuote> {
        let coupon = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| Error::NotFound("Coupon not found".into()))?;

        if let Some(reason) = coupon_rejection(&coupon, plan, Utc::now()) {
            return Err(Error::BadRequest(reason));
        }
        let discount_type = DiscountType::parse(&coupon.discount_type)
            .ok_or_else(|| Error::BadRequest("This coupon is misconfigured".into()))?;
        let result = calculate_discount(price, discount_type, coupon.discount_value);

        Ok(CouponQuote {
            code: coupon.code,
            discount_type,
            discount_value: coupon.discount_value,
            original_price: price,
            discount_amount: result.discount_amount,
            final_price: result.final_price,
        })
    }

    /// Counts one use of the coupon unless its limit is already reached.
    ///
    /// Returns `false` when the coupon is exhausted or unknown.
    pub async fn redeem(&self, code: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET usage_count = usage_count + 1
            WHERE UPPER(code) = UPPER($1)
              AND (usage_limit IS NULL OR usage_count < usage_limit)
            "#,
        )
        .bind(code.trim())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dec(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn coupon() -> Coupon {
        Coupon {
            id: uuid::Uuid::new_v4(),
            code: "SAVE20".into(),
            discount_type: "percentage".into(),
            discount_value: dec("20"),
            status: "active".into(),
            expires_at: None,
            usage_limit: Some(10),
            usage_count: 0,
            applicable_plans: vec![],
            created_at: None,
        }
    }

    #[test]
    fn twenty_percent_of_999() {
        let r = calculate_discount(dec("999"), DiscountType::Percentage, dec("20"));
        assert_eq!(r.discount_amount, dec("200"));
        assert_eq!(r.final_price, dec("799"));
    }

    #[test]
    fn halves_round_away_from_zero() {
        // 2.5% of 100 = 2.5 -> 3
        let r = calculate_discount(dec("100"), DiscountType::Percentage, dec("2.5"));
        assert_eq!(r.discount_amount, dec("3"));
        assert_eq!(r.final_price, dec("97"));
    }

    #[test]
    fn discount_is_clamped_to_price() {
        let fixed = calculate_discount(dec("499"), DiscountType::Fixed, dec("1000"));
        assert_eq!(fixed.discount_amount, dec("499"));
        assert_eq!(fixed.final_price, Decimal::ZERO);

        let pct = calculate_discount(dec("499"), DiscountType::Percentage, dec("150"));
        assert_eq!(pct.final_price, Decimal::ZERO);
    }

    #[test]
    fn discount_bounds_hold_across_inputs() {
        for price in [0i64, 1, 99, 999, 1999, 2999] {
            for value in [0i64, 1, 5, 33, 50, 99, 100, 250, 5000] {
                let price = Decimal::from(price);
                let value = Decimal::from(value);
                for kind in [DiscountType::Percentage, DiscountType::Fixed] {
                    let r = calculate_discount(price, kind, value);
                    assert!(r.discount_amount >= Decimal::ZERO);
                    assert!(r.discount_amount <= price);
                    assert_eq!(r.final_price, price - r.discount_amount);
                    assert!(r.final_price >= Decimal::ZERO);
                }
            }
        }
    }

    #[test]
    fn negative_values_never_increase_price() {
        let r = calculate_discount(dec("999"), DiscountType::Fixed, dec("-50"));
        assert_eq!(r.discount_amount, Decimal::ZERO);
        assert_eq!(r.final_price, dec("999"));
    }

    #[test]
    fn rejects_unusable_coupons() {
        let now = Utc::now();
        assert!(coupon_rejection(&coupon(), PlanType::Pro, now).is_none());

        let mut stopped = coupon();
        stopped.status = "stopped".into();
        assert!(coupon_rejection(&stopped, PlanType::Pro, now).is_some());

        let mut expired = coupon();
        expired.expires_at = Some(now - Duration::hours(1));
        assert!(coupon_rejection(&expired, PlanType::Pro, now).is_some());

        let mut used_up = coupon();
        used_up.usage_count = 10;
        assert!(coupon_rejection(&used_up, PlanType::Pro, now).is_some());

        let mut basic_only = coupon();
        basic_only.applicable_plans = vec!["basic".into()];
        assert!(coupon_rejection(&basic_only, PlanType::Premium, now).is_some());
        assert!(coupon_rejection(&basic_only, PlanType::Basic, now).is_none());
    }
}
