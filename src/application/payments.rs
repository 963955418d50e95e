use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderStatus, OrderView};
use crate::domain::ports::{
    GatewayPaymentStatus, OrderStore, PaymentGateway, TransitionOutcome,
};

/// Reconciles gateway-reported payment status against the order ledger.
///
/// `verify` is invoked by the browser redirect and by the gateway's
/// server-to-server callback, in either order, possibly duplicated and
/// possibly concurrently. Every path through it is a safe no-op when the work
/// has already been done.
pub struct PaymentService {
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(orders: Arc<dyn OrderStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { orders, gateway }
    }

    pub async fn verify(&self, reference: &str) -> Result<OrderView, DomainError> {
        let order = self
            .orders
            .find_by_reference(reference)
            .await?
            .ok_or(DomainError::NotFound)?;

        // Already reconciled: successful no-op, no gateway round-trip.
        if order.status == OrderStatus::Paid {
            return Ok(order);
        }
        // A later state (fulfillment under way, cancelled, failed) is never
        // overridden by a stale gateway notification.
        if order.status != OrderStatus::Pending {
            return Ok(order);
        }
        // Payment was never initiated; there is nothing to ask the gateway.
        let Some(payment_reference) = order.payment_reference.clone() else {
            return Ok(order);
        };

        match self.gateway.verify(&payment_reference).await? {
            GatewayPaymentStatus::Success => {
                let outcome = self
                    .orders
                    .transition(&order.reference, OrderStatus::Pending, OrderStatus::Paid)
                    .await?;
                match outcome {
                    TransitionOutcome::Applied => {
                        log::info!("order {} confirmed paid", order.reference);
                    }
                    // A concurrent verification won the conditional write;
                    // its transition carried the one-time side effects.
                    TransitionOutcome::NotApplied => {
                        log::debug!("order {} was already reconciled", order.reference);
                    }
                }
            }
            GatewayPaymentStatus::Failed => {
                let outcome = self
                    .orders
                    .transition(&order.reference, OrderStatus::Pending, OrderStatus::Failed)
                    .await?;
                if outcome == TransitionOutcome::Applied {
                    log::info!("order {} marked failed by gateway", order.reference);
                }
            }
            GatewayPaymentStatus::Pending => {
                log::debug!("order {} still awaiting payment", order.reference);
            }
        }

        self.orders
            .find_by_reference(reference)
            .await?
            .ok_or(DomainError::NotFound)
    }
}
