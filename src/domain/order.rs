use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Order lifecycle states. Transitions follow a fixed directed graph with no
/// back-edges; Cancelled and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }

    /// The legal transition graph:
    /// Pending → Paid → Processing → Shipped → Delivered;
    /// Pending → Failed; {Pending, Paid, Processing} → Cancelled.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Paid, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Paid, Cancelled)
                | (Processing, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    /// States an admin fulfillment action may drive an order into. Paid is
    /// reserved for the payment bridge, Failed for gateway outcomes.
    pub fn is_fulfillment_target(self) -> bool {
        matches!(
            self,
            OrderStatus::Processing
                | OrderStatus::Shipped
                | OrderStatus::Delivered
                | OrderStatus::Cancelled
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allocate a candidate order reference. Uniqueness is enforced by the
/// storage layer's unique index; on a collision the caller draws again.
/// References are externally visible and double as the payment correlation
/// key, so they are short and human-readable.
pub fn new_reference() -> String {
    let id = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ORD-{}", &id[..10])
}

#[derive(Debug, Clone)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub shipping_address: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub product_id: Uuid,
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub reference: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: serde_json::Value,
    pub delivery_method: String,
    pub status: OrderStatus,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub tax: BigDecimal,
    pub total: BigDecimal,
    pub applied_discount_code: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        use OrderStatus::*;
        for (from, to) in [
            (Pending, Paid),
            (Paid, Processing),
            (Processing, Shipped),
            (Shipped, Delivered),
        ] {
            assert!(from.can_transition_to(to), "{} → {} should be legal", from, to);
        }
    }

    #[test]
    fn failure_and_cancellation_edges() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Paid.can_transition_to(Failed));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for terminal in [
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Failed,
        ] {
            assert!(terminal.is_terminal());
            for target in OrderStatus::ALL {
                assert!(
                    !terminal.can_transition_to(target),
                    "{} → {} must be illegal",
                    terminal,
                    target
                );
            }
        }
    }

    #[test]
    fn delivered_is_never_reachable_from_cancelled_or_failed() {
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Failed.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn no_back_edges_exist() {
        use OrderStatus::*;
        let forward_order = [Pending, Paid, Processing, Shipped, Delivered];
        for (i, from) in forward_order.iter().enumerate() {
            for to in &forward_order[..i] {
                assert!(!from.can_transition_to(*to), "{} → {} is a back-edge", from, to);
            }
        }
    }

    #[test]
    fn paid_is_not_a_fulfillment_target() {
        assert!(!OrderStatus::Paid.is_fulfillment_target());
        assert!(!OrderStatus::Failed.is_fulfillment_target());
        assert!(OrderStatus::Shipped.is_fulfillment_target());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("refunded"), None);
    }

    #[test]
    fn references_carry_the_order_prefix() {
        let reference = new_reference();
        assert!(reference.starts_with("ORD-"));
        assert_eq!(reference.len(), 14);
        assert_ne!(reference, new_reference());
    }
}
