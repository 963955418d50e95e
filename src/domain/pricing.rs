use bigdecimal::{BigDecimal, RoundingMode, Zero};

use super::errors::DomainError;

/// A quantity range with the percentage discount it grants.
///
/// Ranges are inclusive on both ends; `max_quantity = None` means the tier is
/// unbounded above and must be the last tier of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkTier {
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub discount_percent: BigDecimal,
}

/// Result of pricing a single line: the effective unit price and the total
/// percentage that was taken off the base price.
#[derive(Debug, Clone, PartialEq)]
pub struct LineQuote {
    pub unit_price: BigDecimal,
    pub discount_percent: BigDecimal,
}

/// Check that a bulk tier table partitions `[first_min, ∞)` without gaps or
/// overlaps, so that tier lookup is deterministic (exactly one match for any
/// quantity at or above the floor).
pub fn validate_tiers(tiers: &[BulkTier]) -> Result<(), DomainError> {
    let hundred = BigDecimal::from(100);
    for (i, tier) in tiers.iter().enumerate() {
        if tier.min_quantity < 1 {
            return Err(DomainError::Validation(format!(
                "tier {} has min_quantity {}, must be at least 1",
                i, tier.min_quantity
            )));
        }
        if tier.discount_percent < BigDecimal::zero() || tier.discount_percent > hundred {
            return Err(DomainError::Validation(format!(
                "tier {} discount must be between 0 and 100",
                i
            )));
        }
        match tier.max_quantity {
            Some(max) if max < tier.min_quantity => {
                return Err(DomainError::Validation(format!(
                    "tier {} range [{}, {}] is inverted",
                    i, tier.min_quantity, max
                )));
            }
            // Only the last tier may be unbounded.
            None if i + 1 != tiers.len() => {
                return Err(DomainError::Validation(format!(
                    "tier {} is unbounded but not the last tier",
                    i
                )));
            }
            _ => {}
        }
        if i > 0 {
            let prev_max = tiers[i - 1].max_quantity.ok_or_else(|| {
                DomainError::Validation(format!("tier {} is unreachable", i))
            })?;
            if tier.min_quantity != prev_max + 1 {
                return Err(DomainError::Validation(format!(
                    "tier {} starts at {}, expected {} (no gaps or overlaps)",
                    i,
                    tier.min_quantity,
                    prev_max + 1
                )));
            }
        }
    }
    Ok(())
}

/// Look up the tier whose range contains `quantity`. Quantities below the
/// table's floor match nothing (bulk discount 0).
pub fn tier_for(tiers: &[BulkTier], quantity: i32) -> Option<&BulkTier> {
    tiers.iter().find(|t| {
        quantity >= t.min_quantity && t.max_quantity.map_or(true, |max| quantity <= max)
    })
}

/// Price one line item.
///
/// Wholesale and bulk discounts combine additively as percentages, clamped at
/// 100 so the price never goes below zero. The unit price is rounded to the
/// currency minor unit with round-half-up. Pure and deterministic: the same
/// inputs produce the same quote in pricing previews and in the final order.
///
/// `base_price <= 0` and `quantity <= 0` are input-validation failures for
/// the caller, not pricing cases.
pub fn quote_unit_price(
    base_price: &BigDecimal,
    quantity: i32,
    wholesale_percent: &BigDecimal,
    tiers: &[BulkTier],
) -> LineQuote {
    let hundred = BigDecimal::from(100);
    let bulk = tier_for(tiers, quantity)
        .map(|t| t.discount_percent.clone())
        .unwrap_or_else(BigDecimal::zero);

    let mut total_percent = wholesale_percent + bulk;
    if total_percent > hundred {
        total_percent = hundred.clone();
    }

    let unit_price = (base_price * (&hundred - &total_percent) / &hundred)
        .with_scale_round(2, RoundingMode::HalfUp);

    LineQuote {
        unit_price,
        discount_percent: total_percent,
    }
}
