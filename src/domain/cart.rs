use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::discount::DiscountCode;
use super::errors::DomainError;
use super::pricing::{quote_unit_price, BulkTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMethod {
    Standard,
    Express,
    Pickup,
}

impl DeliveryMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryMethod::Standard => "standard",
            DeliveryMethod::Express => "express",
            DeliveryMethod::Pickup => "pickup",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(DeliveryMethod::Standard),
            "express" => Some(DeliveryMethod::Express),
            "pickup" => Some(DeliveryMethod::Pickup),
            _ => None,
        }
    }
}

/// Store-wide pricing knobs, loaded from configuration at startup.
#[derive(Debug, Clone)]
pub struct PricingPolicy {
    pub tax_percent: BigDecimal,
    pub free_shipping_threshold: BigDecimal,
    pub standard_fee: BigDecimal,
    pub express_fee: BigDecimal,
}

/// A line of the cart as submitted, joined with the catalog data needed to
/// price it.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub base_price: BigDecimal,
    pub bulk_tiers: Vec<BulkTier>,
}

/// A cart-level discount candidate: the code plus the customer's historical
/// redemption count for it.
#[derive(Debug)]
pub struct DiscountContext<'a> {
    pub code: &'a DiscountCode,
    pub prior_redemptions: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub tax: BigDecimal,
    pub total: BigDecimal,
    pub applied_discount_code: Option<String>,
}

/// Price a cart end to end.
///
/// Each line is priced through the tiered calculator with the customer's
/// wholesale percentage (zero for retail customers). At most one cart-level
/// code applies on top of the already-discounted subtotal; its validation
/// error propagates unchanged. The shipping fee is flat per delivery method,
/// waived once the post-discount subtotal reaches the free-shipping
/// threshold, and zeroed by a FreeShipping code. Tax is a flat percentage of
/// the post-discount subtotal.
pub fn price_cart(
    lines: &[CartLine],
    wholesale_percent: &BigDecimal,
    discount: Option<DiscountContext<'_>>,
    delivery: DeliveryMethod,
    policy: &PricingPolicy,
    now: DateTime<Utc>,
) -> Result<PricedCart, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::Validation("cart is empty".to_string()));
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = BigDecimal::zero();
    for line in lines {
        if line.quantity <= 0 {
            return Err(DomainError::Validation(format!(
                "quantity for '{}' must be positive",
                line.name
            )));
        }
        if line.base_price <= BigDecimal::zero() {
            return Err(DomainError::Validation(format!(
                "'{}' has a non-positive price",
                line.name
            )));
        }
        let quote = quote_unit_price(
            &line.base_price,
            line.quantity,
            wholesale_percent,
            &line.bulk_tiers,
        );
        let line_total = &quote.unit_price * BigDecimal::from(line.quantity);
        subtotal += &line_total;
        priced.push(PricedLine {
            product_id: line.product_id,
            name: line.name.clone(),
            size: line.size.clone(),
            color: line.color.clone(),
            quantity: line.quantity,
            unit_price: quote.unit_price,
            line_total,
        });
    }

    let (discount_amount, free_shipping, applied_code) = match discount {
        Some(ctx) => {
            ctx.code.validate(now, &subtotal, ctx.prior_redemptions)?;
            (
                ctx.code.discount_amount(&subtotal),
                ctx.code.grants_free_shipping(),
                Some(ctx.code.code.clone()),
            )
        }
        None => (BigDecimal::zero(), false, None),
    };

    let discounted_subtotal = &subtotal - &discount_amount;

    let shipping_fee = if free_shipping || discounted_subtotal >= policy.free_shipping_threshold {
        BigDecimal::zero()
    } else {
        match delivery {
            DeliveryMethod::Standard => policy.standard_fee.clone(),
            DeliveryMethod::Express => policy.express_fee.clone(),
            DeliveryMethod::Pickup => BigDecimal::zero(),
        }
    };

    let tax = (&discounted_subtotal * &policy.tax_percent / BigDecimal::from(100))
        .with_scale_round(2, RoundingMode::HalfUp);

    let mut total = discounted_subtotal + &shipping_fee + &tax;
    if total < BigDecimal::zero() {
        total = BigDecimal::zero();
    }

    Ok(PricedCart {
        lines: priced,
        subtotal,
        discount_amount,
        shipping_fee,
        tax,
        total,
        applied_discount_code: applied_code,
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::domain::discount::{DiscountKind, DiscountSource};
    use crate::domain::errors::DiscountError;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn policy() -> PricingPolicy {
        PricingPolicy {
            tax_percent: dec("7.5"),
            free_shipping_threshold: dec("1000"),
            standard_fee: dec("25"),
            express_fee: dec("50"),
        }
    }

    fn line(name: &str, qty: i32, price: &str) -> CartLine {
        CartLine {
            product_id: Uuid::new_v4(),
            name: name.to_string(),
            size: None,
            color: None,
            quantity: qty,
            base_price: dec(price),
            bulk_tiers: vec![],
        }
    }

    fn fixed_code(value: &str, minimum: &str) -> DiscountCode {
        DiscountCode {
            code: "TAKE50".to_string(),
            kind: DiscountKind::FixedAmount,
            value: dec(value),
            usage_limit: None,
            usage_count: 0,
            per_customer_limit: 1,
            minimum_purchase: Some(dec(minimum)),
            expires_at: None,
            active: true,
            source: DiscountSource::Campaign,
        }
    }

    #[test]
    fn fixed_amount_code_applies_after_line_pricing() {
        // Subtotal 500, fixed 50 with minimum 400 → 450 + shipping 25 + tax 33.75
        let lines = vec![line("Shirt", 5, "100")];
        let code = fixed_code("50", "400");
        let cart = price_cart(
            &lines,
            &BigDecimal::zero(),
            Some(DiscountContext {
                code: &code,
                prior_redemptions: 0,
            }),
            DeliveryMethod::Standard,
            &policy(),
            Utc::now(),
        )
        .expect("pricing failed");

        assert_eq!(cart.subtotal, dec("500.00"));
        assert_eq!(cart.discount_amount, dec("50"));
        assert_eq!(cart.shipping_fee, dec("25"));
        assert_eq!(cart.tax, dec("33.75"));
        assert_eq!(cart.total, dec("508.75"));
        assert_eq!(cart.applied_discount_code.as_deref(), Some("TAKE50"));
    }

    #[test]
    fn discount_validation_error_propagates() {
        let lines = vec![line("Shirt", 1, "100")];
        let code = fixed_code("50", "400");
        let err = price_cart(
            &lines,
            &BigDecimal::zero(),
            Some(DiscountContext {
                code: &code,
                prior_redemptions: 0,
            }),
            DeliveryMethod::Standard,
            &policy(),
            Utc::now(),
        )
        .expect_err("should fail");
        assert!(matches!(
            err,
            DomainError::Discount(DiscountError::BelowMinimumPurchase { .. })
        ));
    }

    #[test]
    fn shipping_is_waived_above_the_threshold() {
        let lines = vec![line("Sofa", 1, "1200")];
        let cart = price_cart(
            &lines,
            &BigDecimal::zero(),
            None,
            DeliveryMethod::Express,
            &policy(),
            Utc::now(),
        )
        .expect("pricing failed");
        assert_eq!(cart.shipping_fee, BigDecimal::zero());
    }

    #[test]
    fn free_shipping_code_zeroes_shipping_only() {
        let lines = vec![line("Shirt", 2, "100")];
        let code = DiscountCode {
            code: "SHIPFREE".to_string(),
            kind: DiscountKind::FreeShipping,
            value: BigDecimal::zero(),
            usage_limit: None,
            usage_count: 0,
            per_customer_limit: 1,
            minimum_purchase: None,
            expires_at: None,
            active: true,
            source: DiscountSource::Manual,
        };
        let cart = price_cart(
            &lines,
            &BigDecimal::zero(),
            Some(DiscountContext {
                code: &code,
                prior_redemptions: 0,
            }),
            DeliveryMethod::Express,
            &policy(),
            Utc::now(),
        )
        .expect("pricing failed");
        assert_eq!(cart.subtotal, dec("200.00"));
        assert_eq!(cart.discount_amount, BigDecimal::zero());
        assert_eq!(cart.shipping_fee, BigDecimal::zero());
        assert_eq!(cart.tax, dec("15.00"));
    }

    #[test]
    fn pickup_orders_never_pay_shipping() {
        let lines = vec![line("Shirt", 1, "10")];
        let cart = price_cart(
            &lines,
            &BigDecimal::zero(),
            None,
            DeliveryMethod::Pickup,
            &policy(),
            Utc::now(),
        )
        .expect("pricing failed");
        assert_eq!(cart.shipping_fee, BigDecimal::zero());
    }

    #[test]
    fn wholesale_percentage_flows_into_line_prices() {
        let mut l = line("Bolt", 50, "100");
        l.bulk_tiers = vec![crate::domain::pricing::BulkTier {
            min_quantity: 50,
            max_quantity: None,
            discount_percent: dec("10"),
        }];
        let cart = price_cart(
            &[l],
            &dec("20"),
            None,
            DeliveryMethod::Pickup,
            &policy(),
            Utc::now(),
        )
        .expect("pricing failed");
        // 100 × (1 − 0.30) = 70.00 per unit
        assert_eq!(cart.lines[0].unit_price, dec("70.00"));
        assert_eq!(cart.subtotal, dec("3500.00"));
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = price_cart(
            &[],
            &BigDecimal::zero(),
            None,
            DeliveryMethod::Standard,
            &policy(),
            Utc::now(),
        )
        .expect_err("should fail");
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let lines = vec![line("Shirt", 0, "100")];
        let err = price_cart(
            &lines,
            &BigDecimal::zero(),
            None,
            DeliveryMethod::Standard,
            &policy(),
            Utc::now(),
        )
        .expect_err("should fail");
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
