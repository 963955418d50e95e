use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};

use crate::domain::discount::{normalize_code, DiscountCode, DiscountKind};
use crate::domain::errors::DomainError;
use crate::domain::ports::{DiscountStore, NewDiscountCode};

/// Admin surface over the discount registry: create, soft-deactivate, list
/// with usage stats.
pub struct DiscountAdminService {
    discounts: Arc<dyn DiscountStore>,
}

impl DiscountAdminService {
    pub fn new(discounts: Arc<dyn DiscountStore>) -> Self {
        Self { discounts }
    }

    pub async fn create(&self, new: NewDiscountCode) -> Result<DiscountCode, DomainError> {
        validate_new_code(&new)?;
        self.discounts.create(new).await
    }

    pub async fn deactivate(&self, code: &str) -> Result<(), DomainError> {
        self.discounts.deactivate(code).await
    }

    pub async fn list(&self) -> Result<Vec<DiscountCode>, DomainError> {
        self.discounts.list().await
    }
}

fn validate_new_code(new: &NewDiscountCode) -> Result<(), DomainError> {
    if normalize_code(&new.code).is_empty() {
        return Err(DomainError::Validation("code must not be empty".to_string()));
    }
    if new.value < BigDecimal::zero() {
        return Err(DomainError::Validation("value must not be negative".to_string()));
    }
    if new.kind == DiscountKind::Percentage && new.value > BigDecimal::from(100) {
        return Err(DomainError::Validation(
            "percentage discounts are capped at 100".to_string(),
        ));
    }
    if let Some(limit) = new.usage_limit {
        if limit < 1 {
            return Err(DomainError::Validation(
                "usage limit must be at least 1".to_string(),
            ));
        }
    }
    if new.per_customer_limit < 1 {
        return Err(DomainError::Validation(
            "per-customer limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::domain::discount::DiscountSource;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn candidate() -> NewDiscountCode {
        NewDiscountCode {
            code: "SAVE10".to_string(),
            kind: DiscountKind::Percentage,
            value: dec("10"),
            usage_limit: Some(100),
            per_customer_limit: 1,
            minimum_purchase: None,
            expires_at: None,
            source: DiscountSource::Manual,
        }
    }

    #[test]
    fn a_reasonable_code_passes_validation() {
        assert!(validate_new_code(&candidate()).is_ok());
    }

    #[test]
    fn blank_codes_are_rejected() {
        let new = NewDiscountCode {
            code: "   ".to_string(),
            ..candidate()
        };
        assert!(validate_new_code(&new).is_err());
    }

    #[test]
    fn percentages_above_one_hundred_are_rejected() {
        let new = NewDiscountCode {
            value: dec("150"),
            ..candidate()
        };
        assert!(validate_new_code(&new).is_err());
    }

    #[test]
    fn fixed_amounts_above_one_hundred_are_fine() {
        let new = NewDiscountCode {
            kind: DiscountKind::FixedAmount,
            value: dec("5000"),
            ..candidate()
        };
        assert!(validate_new_code(&new).is_ok());
    }

    #[test]
    fn zero_usage_limit_is_rejected() {
        let new = NewDiscountCode {
            usage_limit: Some(0),
            ..candidate()
        };
        assert!(validate_new_code(&new).is_err());
    }
}
