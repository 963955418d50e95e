use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, OrderStatus, OrderView};
use crate::domain::ports::{OrderStore, TransitionOutcome};

/// Back-office order surface: lookups plus fulfillment transitions. The
/// payment bridge owns Pending→Paid/Failed; this service refuses them.
pub struct OrderAdminService {
    orders: Arc<dyn OrderStore>,
}

impl OrderAdminService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    pub async fn get(&self, reference: &str) -> Result<OrderView, DomainError> {
        self.orders
            .find_by_reference(reference)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        self.orders.list(page, limit).await
    }

    pub async fn transition(
        &self,
        reference: &str,
        target: OrderStatus,
    ) -> Result<OrderView, DomainError> {
        if !target.is_fulfillment_target() {
            return Err(DomainError::Validation(format!(
                "status '{}' cannot be set by a fulfillment action",
                target
            )));
        }

        let order = self.get(reference).await?;

        // Repeating an already-applied transition is a no-op, not an error.
        if order.status == target {
            return Ok(order);
        }
        if !order.status.can_transition_to(target) {
            return Err(DomainError::OrderState {
                from: order.status,
                to: target,
            });
        }

        let outcome = self.orders.transition(reference, order.status, target).await?;
        let current = self.get(reference).await?;
        match outcome {
            TransitionOutcome::Applied => Ok(current),
            // Lost the conditional write. If the winner drove the order to
            // the same state we wanted, that is the idempotent no-op path;
            // anything else is a real conflict for the caller to retry.
            TransitionOutcome::NotApplied if current.status == target => Ok(current),
            TransitionOutcome::NotApplied => Err(DomainError::Conflict),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{pending_order, InMemoryOrders};

    fn with_status(reference: &str, status: OrderStatus) -> InMemoryOrders {
        let mut order = pending_order(reference, Some(reference));
        order.status = status;
        InMemoryOrders::with_order(order)
    }

    #[tokio::test]
    async fn fulfillment_walks_the_forward_edges() {
        let orders = Arc::new(with_status("ORD-1111AAAAAA", OrderStatus::Paid));
        let svc = OrderAdminService::new(orders);

        let processing = svc
            .transition("ORD-1111AAAAAA", OrderStatus::Processing)
            .await
            .expect("transition failed");
        assert_eq!(processing.status, OrderStatus::Processing);

        let shipped = svc
            .transition("ORD-1111AAAAAA", OrderStatus::Shipped)
            .await
            .expect("transition failed");
        assert_eq!(shipped.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn paid_cannot_be_set_by_fulfillment() {
        let orders = Arc::new(with_status("ORD-2222BBBBBB", OrderStatus::Pending));
        let svc = OrderAdminService::new(orders);

        let err = svc
            .transition("ORD-2222BBBBBB", OrderStatus::Paid)
            .await
            .expect_err("should fail");
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn illegal_edges_are_rejected() {
        let orders = Arc::new(with_status("ORD-3333CCCCCC", OrderStatus::Shipped));
        let svc = OrderAdminService::new(orders);

        let err = svc
            .transition("ORD-3333CCCCCC", OrderStatus::Cancelled)
            .await
            .expect_err("should fail");
        assert!(matches!(err, DomainError::OrderState { .. }));
    }

    #[tokio::test]
    async fn repeating_a_transition_is_a_no_op() {
        let orders = Arc::new(with_status("ORD-4444DDDDDD", OrderStatus::Shipped));
        let svc = OrderAdminService::new(orders);

        let order = svc
            .transition("ORD-4444DDDDDD", OrderStatus::Shipped)
            .await
            .expect("no-op expected");
        assert_eq!(order.status, OrderStatus::Shipped);
    }
}
