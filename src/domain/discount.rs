use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{DateTime, Utc};

use super::errors::DiscountError;

/// What the code grants when applied to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountKind {
    Percentage,
    FixedAmount,
    FreeShipping,
}

impl DiscountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::FixedAmount => "fixed_amount",
            DiscountKind::FreeShipping => "free_shipping",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "percentage" => Some(DiscountKind::Percentage),
            "fixed_amount" => Some(DiscountKind::FixedAmount),
            "free_shipping" => Some(DiscountKind::FreeShipping),
            _ => None,
        }
    }
}

/// Where the code came from. Campaign, wholesale and referral codes are
/// issued by their own flows; manual codes by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountSource {
    Manual,
    Campaign,
    Wholesale,
    Referral,
}

impl DiscountSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscountSource::Manual => "manual",
            DiscountSource::Campaign => "campaign",
            DiscountSource::Wholesale => "wholesale",
            DiscountSource::Referral => "referral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(DiscountSource::Manual),
            "campaign" => Some(DiscountSource::Campaign),
            "wholesale" => Some(DiscountSource::Wholesale),
            "referral" => Some(DiscountSource::Referral),
            _ => None,
        }
    }
}

/// A redeemable discount code. `usage_count` here is a snapshot read from
/// storage; the only writer is the registry's atomic conditional increment.
#[derive(Debug, Clone)]
pub struct DiscountCode {
    pub code: String,
    pub kind: DiscountKind,
    pub value: BigDecimal,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub per_customer_limit: i32,
    pub minimum_purchase: Option<BigDecimal>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub source: DiscountSource,
}

/// Codes are matched case-insensitively: stored and looked up upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl DiscountCode {
    /// Validate the code against a cart. Checks run in a fixed order and the
    /// first failure is the reported error; there is no aggregate reporting.
    ///
    /// `prior_redemptions` is the customer's historical redemption count for
    /// this code.
    pub fn validate(
        &self,
        now: DateTime<Utc>,
        cart_subtotal: &BigDecimal,
        prior_redemptions: i64,
    ) -> Result<(), DiscountError> {
        if !self.active {
            return Err(DiscountError::Inactive);
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                return Err(DiscountError::Expired);
            }
        }
        if let Some(minimum) = &self.minimum_purchase {
            if cart_subtotal < minimum {
                return Err(DiscountError::BelowMinimumPurchase {
                    minimum: minimum.to_string(),
                });
            }
        }
        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                return Err(DiscountError::LimitExceeded);
            }
        }
        if prior_redemptions >= i64::from(self.per_customer_limit) {
            return Err(DiscountError::PerCustomerLimitExceeded);
        }
        Ok(())
    }

    /// The amount taken off the shipping-exclusive subtotal. FreeShipping
    /// affects only the shipping fee, so it contributes nothing here.
    pub fn discount_amount(&self, subtotal: &BigDecimal) -> BigDecimal {
        match self.kind {
            DiscountKind::Percentage => (subtotal * &self.value / BigDecimal::from(100))
                .with_scale_round(2, RoundingMode::HalfUp),
            DiscountKind::FixedAmount => {
                // A flat discount never drives the subtotal negative.
                if &self.value > subtotal {
                    subtotal.clone()
                } else {
                    self.value.clone()
                }
            }
            DiscountKind::FreeShipping => BigDecimal::zero(),
        }
    }

    pub fn grants_free_shipping(&self) -> bool {
        self.kind == DiscountKind::FreeShipping
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Duration;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn base_code() -> DiscountCode {
        DiscountCode {
            code: "SAVE10".to_string(),
            kind: DiscountKind::Percentage,
            value: dec("10"),
            usage_limit: None,
            usage_count: 0,
            per_customer_limit: 1,
            minimum_purchase: None,
            expires_at: None,
            active: true,
            source: DiscountSource::Manual,
        }
    }

    #[test]
    fn valid_code_passes() {
        let code = base_code();
        assert!(code.validate(Utc::now(), &dec("100"), 0).is_ok());
    }

    #[test]
    fn exhausted_usage_limit_is_reported_before_any_redemption() {
        let code = DiscountCode {
            usage_limit: Some(5),
            usage_count: 5,
            ..base_code()
        };
        assert_eq!(
            code.validate(Utc::now(), &dec("100"), 0),
            Err(DiscountError::LimitExceeded)
        );
    }

    #[test]
    fn inactive_wins_over_expired() {
        // First failing check determines the error kind.
        let code = DiscountCode {
            active: false,
            expires_at: Some(Utc::now() - Duration::days(1)),
            ..base_code()
        };
        assert_eq!(
            code.validate(Utc::now(), &dec("100"), 0),
            Err(DiscountError::Inactive)
        );
    }

    #[test]
    fn expired_code_is_rejected() {
        let code = DiscountCode {
            expires_at: Some(Utc::now() - Duration::hours(1)),
            ..base_code()
        };
        assert_eq!(
            code.validate(Utc::now(), &dec("100"), 0),
            Err(DiscountError::Expired)
        );
    }

    #[test]
    fn subtotal_exactly_at_minimum_purchase_passes() {
        let code = DiscountCode {
            minimum_purchase: Some(dec("400")),
            ..base_code()
        };
        assert!(code.validate(Utc::now(), &dec("400"), 0).is_ok());
        assert_eq!(
            code.validate(Utc::now(), &dec("399.99"), 0),
            Err(DiscountError::BelowMinimumPurchase {
                minimum: "400".to_string()
            })
        );
    }

    #[test]
    fn per_customer_limit_counts_prior_redemptions() {
        let code = base_code();
        assert_eq!(
            code.validate(Utc::now(), &dec("100"), 1),
            Err(DiscountError::PerCustomerLimitExceeded)
        );
    }

    #[test]
    fn fixed_amount_is_floored_at_subtotal() {
        let code = DiscountCode {
            kind: DiscountKind::FixedAmount,
            value: dec("50"),
            ..base_code()
        };
        assert_eq!(code.discount_amount(&dec("500")), dec("50"));
        assert_eq!(code.discount_amount(&dec("30")), dec("30"));
    }

    #[test]
    fn percentage_amount_rounds_to_minor_unit() {
        let code = DiscountCode {
            value: dec("7.5"),
            ..base_code()
        };
        // 33.33 × 7.5% = 2.49975 → 2.50
        assert_eq!(code.discount_amount(&dec("33.33")), dec("2.50"));
    }

    #[test]
    fn free_shipping_does_not_touch_the_subtotal() {
        let code = DiscountCode {
            kind: DiscountKind::FreeShipping,
            ..base_code()
        };
        assert_eq!(code.discount_amount(&dec("500")), BigDecimal::zero());
        assert!(code.grants_free_shipping());
    }

    #[test]
    fn codes_are_case_normalized() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
    }
}
