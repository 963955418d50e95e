use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use uuid::Uuid;

use crate::domain::cart::{price_cart, CartLine, DeliveryMethod, DiscountContext, PricingPolicy};
use crate::domain::discount::normalize_code;
use crate::domain::errors::{DiscountError, DomainError};
use crate::domain::order::{CustomerDetails, OrderStatus, OrderView};
use crate::domain::ports::{
    DiscountStore, NewOrder, OrderStore, PaymentGateway, PaymentIntent, ProductCatalog,
};
use crate::domain::pricing::validate_tiers;

/// A cart line as submitted at checkout: catalog data is joined in
/// server-side, never trusted from the client.
#[derive(Debug, Clone)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer: CustomerDetails,
    pub delivery_method: DeliveryMethod,
    pub items: Vec<CheckoutItem>,
    pub discount_code: Option<String>,
    pub wholesale_code: Option<String>,
}

/// The created order plus the payment handoff. `authorization_url` is None
/// when the gateway could not be reached; the order stays Pending and payment
/// can be re-initiated.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub order: OrderView,
    pub authorization_url: Option<String>,
}

pub struct CheckoutService {
    catalog: Arc<dyn ProductCatalog>,
    discounts: Arc<dyn DiscountStore>,
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    policy: PricingPolicy,
}

impl CheckoutService {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        discounts: Arc<dyn DiscountStore>,
        orders: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        policy: PricingPolicy,
    ) -> Self {
        Self {
            catalog,
            discounts,
            orders,
            gateway,
            policy,
        }
    }

    /// Price the cart, create the order and open the payment intent.
    ///
    /// Pricing and discount failures abort before anything is written. Order
    /// creation (with its discount redemption) is atomic. A gateway failure
    /// after that point is non-fatal: the order is returned without a
    /// handoff URL and payment initiation can be retried.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, DomainError> {
        if request.items.is_empty() {
            return Err(DomainError::Validation("cart is empty".to_string()));
        }
        if !request.customer.email.contains('@') {
            return Err(DomainError::Validation(
                "a valid customer email is required".to_string(),
            ));
        }

        let wholesale_percent = self.resolve_wholesale(&request).await?;
        let lines = self.assemble_lines(&request.items).await?;

        let code = match &request.discount_code {
            Some(raw) => {
                let normalized = normalize_code(raw);
                let code = self
                    .discounts
                    .find(&normalized)
                    .await?
                    .ok_or(DiscountError::NotFound)?;
                let prior = self
                    .discounts
                    .redemptions_by_customer(&normalized, &request.customer.email)
                    .await?;
                Some((code, prior))
            }
            None => None,
        };

        let cart = price_cart(
            &lines,
            &wholesale_percent,
            code.as_ref().map(|(code, prior)| DiscountContext {
                code,
                prior_redemptions: *prior,
            }),
            request.delivery_method,
            &self.policy,
            Utc::now(),
        )?;

        let mut order = self
            .orders
            .create(NewOrder {
                customer: request.customer,
                delivery_method: request.delivery_method,
                cart,
            })
            .await?;

        let authorization_url = match self.open_intent(&order).await {
            Ok(intent) => {
                order.payment_reference = Some(intent.reference);
                order.payment_url = Some(intent.authorization_url.clone());
                Some(intent.authorization_url)
            }
            Err(e) => {
                // The order stands; the customer can retry payment.
                log::warn!(
                    "payment initiation for order {} failed: {}",
                    order.reference,
                    e
                );
                None
            }
        };

        Ok(CheckoutOutcome {
            order,
            authorization_url,
        })
    }

    /// (Re-)initiate payment for a Pending order. An already-stored intent is
    /// reused rather than opening a second one for the same reference.
    pub async fn initiate_payment(&self, reference: &str) -> Result<PaymentIntent, DomainError> {
        let order = self
            .orders
            .find_by_reference(reference)
            .await?
            .ok_or(DomainError::NotFound)?;

        if order.status != OrderStatus::Pending {
            return Err(DomainError::Validation(format!(
                "order {} is not awaiting payment",
                reference
            )));
        }

        if let (Some(payment_reference), Some(url)) =
            (order.payment_reference.clone(), order.payment_url.clone())
        {
            return Ok(PaymentIntent {
                reference: payment_reference,
                authorization_url: url,
            });
        }

        self.open_intent(&order).await
    }

    async fn open_intent(&self, order: &OrderView) -> Result<PaymentIntent, DomainError> {
        let intent = self
            .gateway
            .initialize(&order.reference, &order.total, &order.customer_email)
            .await?;
        self.orders
            .record_payment_intent(&order.reference, &intent.reference, &intent.authorization_url)
            .await?;
        Ok(intent)
    }

    async fn resolve_wholesale(
        &self,
        request: &CheckoutRequest,
    ) -> Result<BigDecimal, DomainError> {
        let Some(raw) = &request.wholesale_code else {
            return Ok(BigDecimal::zero());
        };
        let account = self
            .catalog
            .wholesale_by_code(&normalize_code(raw))
            .await?
            .ok_or_else(|| DomainError::Validation("wholesale code not recognized".to_string()))?;
        if !account.active {
            return Err(DomainError::Validation(
                "wholesale account is inactive".to_string(),
            ));
        }

        let total_items: i64 = request.items.iter().map(|i| i64::from(i.quantity.max(0))).sum();
        if total_items < i64::from(account.tier_min_items) {
            return Err(DomainError::Validation(format!(
                "wholesale orders require at least {} items",
                account.tier_min_items
            )));
        }
        if let Some(max) = account.tier_max_items {
            if total_items > i64::from(max) {
                return Err(DomainError::Validation(format!(
                    "wholesale orders are capped at {} items",
                    max
                )));
            }
        }
        Ok(account.discount_percent)
    }

    async fn assemble_lines(&self, items: &[CheckoutItem]) -> Result<Vec<CartLine>, DomainError> {
        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products = self.catalog.products_by_ids(&ids).await?;
        let by_id: HashMap<Uuid, _> = products.into_iter().map(|p| (p.id, p)).collect();

        items
            .iter()
            .map(|item| {
                let product = by_id.get(&item.product_id).ok_or_else(|| {
                    DomainError::Validation(format!(
                        "product {} is not available",
                        item.product_id
                    ))
                })?;
                // A malformed tier table is catalog corruption, not a
                // customer mistake.
                if let Err(e) = validate_tiers(&product.bulk_tiers) {
                    return Err(DomainError::Internal(format!(
                        "bulk tiers for product {}: {}",
                        product.id, e
                    )));
                }
                Ok(CartLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    size: item.size.clone(),
                    color: item.color.clone(),
                    quantity: item.quantity,
                    base_price: product.base_price.clone(),
                    bulk_tiers: product.bulk_tiers.clone(),
                })
            })
            .collect()
    }
}
