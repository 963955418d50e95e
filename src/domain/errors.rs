use thiserror::Error;

use super::order::OrderStatus;

/// Why a discount code cannot be applied. The first failing check wins;
/// callers never see an aggregate of failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountError {
    #[error("Discount code not found")]
    NotFound,
    #[error("Discount code is no longer active")]
    Inactive,
    #[error("Discount code has expired")]
    Expired,
    #[error("Cart subtotal is below the minimum purchase of {minimum}")]
    BelowMinimumPurchase { minimum: String },
    #[error("Discount code has reached its usage limit")]
    LimitExceeded,
    #[error("You have already used this discount code")]
    PerCustomerLimitExceeded,
}

/// Failures talking to the payment gateway. Orders stay Pending on any of
/// these; payment initiation is retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Payment gateway is unreachable")]
    Unreachable,
    #[error("Payment gateway timed out")]
    Timeout,
    #[error("Payment gateway rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error("Illegal order transition from {from} to {to}")]
    OrderState { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Lost a race on a conditional write. Retryable; not a user-facing
    /// failure unless retries are exhausted.
    #[error("Concurrent update conflict")]
    Conflict,

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}
