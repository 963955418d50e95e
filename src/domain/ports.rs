use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::{DeliveryMethod, PricedCart};
use super::discount::{DiscountCode, DiscountKind, DiscountSource};
use super::errors::{DomainError, GatewayError};
use super::order::{CustomerDetails, ListResult, OrderStatus, OrderView};
use super::pricing::BulkTier;

/// Catalog data needed to price a cart line.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub base_price: BigDecimal,
    pub active: bool,
    pub bulk_tiers: Vec<BulkTier>,
}

/// An approved wholesale account. The discount percentage is fixed for the
/// life of the account; admins may only deactivate it.
#[derive(Debug, Clone)]
pub struct WholesaleAccount {
    pub business_name: String,
    pub code: String,
    pub discount_percent: BigDecimal,
    pub tier_min_items: i32,
    pub tier_max_items: Option<i32>,
    pub active: bool,
}

#[async_trait]
pub trait ProductCatalog: Send + Sync + 'static {
    async fn products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
    async fn wholesale_by_code(&self, code: &str) -> Result<Option<WholesaleAccount>, DomainError>;
}

#[derive(Debug, Clone)]
pub struct NewDiscountCode {
    pub code: String,
    pub kind: DiscountKind,
    pub value: BigDecimal,
    pub usage_limit: Option<i32>,
    pub per_customer_limit: i32,
    pub minimum_purchase: Option<BigDecimal>,
    pub expires_at: Option<DateTime<Utc>>,
    pub source: DiscountSource,
}

#[async_trait]
pub trait DiscountStore: Send + Sync + 'static {
    async fn find(&self, code: &str) -> Result<Option<DiscountCode>, DomainError>;
    /// The customer's historical redemption count for a code.
    async fn redemptions_by_customer(&self, code: &str, email: &str) -> Result<i64, DomainError>;
    async fn create(&self, code: NewDiscountCode) -> Result<DiscountCode, DomainError>;
    async fn deactivate(&self, code: &str) -> Result<(), DomainError>;
    async fn list(&self) -> Result<Vec<DiscountCode>, DomainError>;
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: CustomerDetails,
    pub delivery_method: DeliveryMethod,
    pub cart: PricedCart,
}

/// Result of a conditional status write. `NotApplied` means the stored state
/// no longer matched the expected prior state; the caller re-reads and
/// decides between the idempotent no-op path and a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    NotApplied,
}

#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Persist a new Pending order with its priced snapshot. When the cart
    /// carries a discount code, the code's atomic redemption happens inside
    /// the same transaction; losing the redemption race fails the whole
    /// creation.
    async fn create(&self, order: NewOrder) -> Result<OrderView, DomainError>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<OrderView>, DomainError>;

    async fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError>;

    /// Store the gateway's intent on the order, at most once.
    async fn record_payment_intent(
        &self,
        reference: &str,
        payment_reference: &str,
        payment_url: &str,
    ) -> Result<(), DomainError>;

    /// Conditionally move `reference` from `expected` to `target`. Exactly
    /// one concurrent caller observes `Applied`; a Pending→Paid application
    /// also appends the `OrderPaid` outbox event in the same transaction.
    async fn transition(
        &self,
        reference: &str,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<TransitionOutcome, DomainError>;
}

#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub reference: String,
    pub authorization_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPaymentStatus {
    Success,
    Failed,
    Pending,
}

/// The payment gateway seam. Implementations wrap a specific vendor's REST
/// API; nothing above this trait knows which vendor.
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Open a payment intent keyed by the order reference.
    async fn initialize(
        &self,
        reference: &str,
        amount: &BigDecimal,
        email: &str,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Query the authoritative status of a payment.
    async fn verify(&self, reference: &str) -> Result<GatewayPaymentStatus, GatewayError>;
}
