use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{new_reference, ListResult, OrderStatus, OrderItemView, OrderView};
use crate::domain::ports::{NewOrder, OrderStore, TransitionOutcome};
use crate::schema::{discount_redemptions, order_items, order_outbox, orders};

use super::blocking;
use super::discount_repo::redeem_within;
use super::models::{
    NewDiscountRedemptionRow, NewOrderItemRow, NewOrderRow, NewOutboxEventRow, OrderItemRow,
    OrderRow,
};

/// Attempts before giving up on allocating a non-colliding order reference.
const MAX_REFERENCE_ATTEMPTS: usize = 5;

pub struct DieselOrderStore {
    pool: DbPool,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_view(row: OrderRow, items: Vec<OrderItemRow>) -> Result<OrderView, DomainError> {
    let status = OrderStatus::parse(&row.status)
        .ok_or_else(|| DomainError::Internal(format!("unknown order status '{}'", row.status)))?;
    Ok(OrderView {
        id: row.id,
        reference: row.reference,
        customer_name: row.customer_name,
        customer_email: row.customer_email,
        customer_phone: row.customer_phone,
        shipping_address: row.shipping_address,
        delivery_method: row.delivery_method,
        status,
        subtotal: row.subtotal,
        discount_amount: row.discount_amount,
        shipping_fee: row.shipping_fee,
        tax: row.tax,
        total: row.total,
        applied_discount_code: row.applied_discount_code,
        payment_reference: row.payment_reference,
        payment_url: row.payment_url,
        created_at: row.created_at,
        items: items
            .into_iter()
            .map(|i| OrderItemView {
                product_id: i.product_id,
                name: i.name,
                size: i.size,
                color: i.color,
                quantity: i.quantity,
                unit_price: i.unit_price,
                line_total: i.line_total,
            })
            .collect(),
    })
}

/// One creation attempt under a freshly drawn reference. The order, its item
/// snapshot, the discount redemption and the OrderCreated outbox event commit
/// or roll back together. A reference collision surfaces as
/// `DomainError::Conflict` so the caller can draw again.
fn create_once(
    conn: &mut PgConnection,
    order: &NewOrder,
    reference: &str,
) -> Result<OrderView, DomainError> {
    conn.transaction::<_, DomainError, _>(|conn| {
        // 1. Insert the order in Pending with the priced snapshot.
        let new_row = NewOrderRow {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            customer_name: order.customer.name.clone(),
            customer_email: order.customer.email.trim().to_string(),
            customer_phone: order.customer.phone.clone(),
            shipping_address: order.customer.shipping_address.clone(),
            delivery_method: order.delivery_method.as_str().to_string(),
            status: OrderStatus::Pending.as_str().to_string(),
            subtotal: order.cart.subtotal.clone(),
            discount_amount: order.cart.discount_amount.clone(),
            shipping_fee: order.cart.shipping_fee.clone(),
            tax: order.cart.tax.clone(),
            total: order.cart.total.clone(),
            applied_discount_code: order.cart.applied_discount_code.clone(),
        };
        let inserted: OrderRow = diesel::insert_into(orders::table)
            .values(&new_row)
            .get_result(conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Conflict
                }
                other => other.into(),
            })?;

        // 2. Snapshot the priced items; later catalog edits never reach them.
        let item_rows: Vec<NewOrderItemRow> = order
            .cart
            .lines
            .iter()
            .map(|l| NewOrderItemRow {
                id: Uuid::new_v4(),
                order_id: inserted.id,
                product_id: l.product_id,
                name: l.name.clone(),
                size: l.size.clone(),
                color: l.color.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price.clone(),
                line_total: l.line_total.clone(),
            })
            .collect();
        let items: Vec<OrderItemRow> = diesel::insert_into(order_items::table)
            .values(&item_rows)
            .get_results(conn)?;

        // 3. Redeem the applied code in the same transaction. Losing the
        //    conditional increment rolls the whole checkout attempt back.
        if let Some(code) = &order.cart.applied_discount_code {
            redeem_within(conn, code)?;
            diesel::insert_into(discount_redemptions::table)
                .values(&NewDiscountRedemptionRow {
                    id: Uuid::new_v4(),
                    code: code.clone(),
                    order_reference: reference.to_string(),
                    customer_email: order.customer.email.trim().to_lowercase(),
                })
                .execute(conn)?;
        }

        // 4. Outbox event; the CDC relay feeds the notification senders.
        let item_payloads: Vec<serde_json::Value> = items
            .iter()
            .map(|i| {
                json!({
                    "product_id": i.product_id,
                    "name": i.name,
                    "quantity": i.quantity,
                    "unit_price": i.unit_price.to_string()
                })
            })
            .collect();
        diesel::insert_into(order_outbox::table)
            .values(&NewOutboxEventRow {
                id: Uuid::new_v4(),
                aggregate_type: "Order".to_string(),
                aggregate_id: reference.to_string(),
                event_type: "OrderCreated".to_string(),
                payload: json!({
                    "reference": reference,
                    "customer_name": inserted.customer_name,
                    "customer_email": inserted.customer_email,
                    "total": inserted.total.to_string(),
                    "items": item_payloads
                }),
            })
            .execute(conn)?;

        to_view(inserted, items)
    })
}

#[async_trait]
impl OrderStore for DieselOrderStore {
    async fn create(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        let pool = self.pool.clone();
        blocking(move || {
            let mut conn = pool.get()?;
            for _ in 0..MAX_REFERENCE_ATTEMPTS {
                let reference = new_reference();
                match create_once(&mut conn, &order, &reference) {
                    Err(DomainError::Conflict) => continue,
                    other => return other,
                }
            }
            Err(DomainError::Conflict)
        })
        .await
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<OrderView>, DomainError> {
        let pool = self.pool.clone();
        let reference = reference.to_string();
        blocking(move || {
            let mut conn = pool.get()?;

            let order = orders::table
                .filter(orders::reference.eq(&reference))
                .select(OrderRow::as_select())
                .first(&mut conn)
                .optional()?;

            let Some(order) = order else {
                return Ok(None);
            };

            let items = order_items::table
                .filter(order_items::order_id.eq(order.id))
                .select(OrderItemRow::as_select())
                .load(&mut conn)?;

            to_view(order, items).map(Some)
        })
        .await
    }

    async fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let pool = self.pool.clone();
        blocking(move || {
            let mut conn = pool.get()?;

            let offset = (page - 1) * limit;
            conn.transaction::<_, DomainError, _>(|conn| {
                let total: i64 = orders::table.count().get_result(conn)?;

                let rows = orders::table
                    .select(OrderRow::as_select())
                    .order(orders::created_at.desc())
                    .limit(limit)
                    .offset(offset)
                    .load(conn)?;

                Ok(ListResult {
                    items: rows
                        .into_iter()
                        .map(|o| to_view(o, vec![]))
                        .collect::<Result<Vec<_>, _>>()?,
                    total,
                })
            })
        })
        .await
    }

    async fn record_payment_intent(
        &self,
        reference: &str,
        payment_reference: &str,
        payment_url: &str,
    ) -> Result<(), DomainError> {
        let pool = self.pool.clone();
        let reference = reference.to_string();
        let payment_reference = payment_reference.to_string();
        let payment_url = payment_url.to_string();
        blocking(move || {
            let mut conn = pool.get()?;

            // payment_reference is written at most once.
            let updated = diesel::update(
                orders::table
                    .filter(orders::reference.eq(&reference))
                    .filter(orders::payment_reference.is_null()),
            )
            .set((
                orders::payment_reference.eq(&payment_reference),
                orders::payment_url.eq(&payment_url),
                orders::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

            if updated == 1 {
                return Ok(());
            }

            let row = orders::table
                .filter(orders::reference.eq(&reference))
                .select(OrderRow::as_select())
                .first(&mut conn)
                .optional()?;
            match row {
                None => Err(DomainError::NotFound),
                // Re-recording the same intent is an idempotent no-op.
                Some(r) if r.payment_reference.as_deref() == Some(payment_reference.as_str()) => {
                    Ok(())
                }
                Some(_) => Err(DomainError::Conflict),
            }
        })
        .await
    }

    async fn transition(
        &self,
        reference: &str,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<TransitionOutcome, DomainError> {
        let pool = self.pool.clone();
        let reference = reference.to_string();
        blocking(move || {
            let mut conn = pool.get()?;
            conn.transaction::<_, DomainError, _>(|conn| {
                // Conditional write: only the caller that still sees the
                // expected prior state changes the row.
                let updated = diesel::update(
                    orders::table
                        .filter(orders::reference.eq(&reference))
                        .filter(orders::status.eq(expected.as_str())),
                )
                .set((
                    orders::status.eq(target.as_str()),
                    orders::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)?;

                if updated == 0 {
                    return Ok(TransitionOutcome::NotApplied);
                }

                // The winner of Pending→Paid owns the one-time notification.
                if target == OrderStatus::Paid {
                    let row: OrderRow = orders::table
                        .filter(orders::reference.eq(&reference))
                        .select(OrderRow::as_select())
                        .first(conn)?;
                    diesel::insert_into(order_outbox::table)
                        .values(&NewOutboxEventRow {
                            id: Uuid::new_v4(),
                            aggregate_type: "Order".to_string(),
                            aggregate_id: reference.clone(),
                            event_type: "OrderPaid".to_string(),
                            payload: json!({
                                "reference": reference,
                                "customer_name": row.customer_name,
                                "customer_email": row.customer_email,
                                "total": row.total.to_string()
                            }),
                        })
                        .execute(conn)?;
                }

                Ok(TransitionOutcome::Applied)
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use diesel::prelude::*;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::domain::cart::{DeliveryMethod, PricedCart, PricedLine};
    use crate::domain::discount::{DiscountKind, DiscountSource};
    use crate::domain::errors::DiscountError;
    use crate::domain::order::CustomerDetails;
    use crate::domain::ports::{DiscountStore, NewDiscountCode};
    use crate::infrastructure::discount_repo::DieselDiscountStore;
    use crate::infrastructure::models::OutboxEventRow;
    use crate::infrastructure::test_support::setup_db;
    use crate::schema::order_outbox;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn priced_cart(code: Option<&str>) -> PricedCart {
        let line = PricedLine {
            product_id: Uuid::new_v4(),
            name: "Linen Shirt".to_string(),
            size: Some("M".to_string()),
            color: Some("navy".to_string()),
            quantity: 2,
            unit_price: dec("45.00"),
            line_total: dec("90.00"),
        };
        PricedCart {
            lines: vec![line],
            subtotal: dec("90.00"),
            discount_amount: BigDecimal::from(0),
            shipping_fee: dec("25.00"),
            tax: dec("6.75"),
            total: dec("121.75"),
            applied_discount_code: code.map(|c| c.to_string()),
        }
    }

    fn new_order(code: Option<&str>) -> NewOrder {
        NewOrder {
            customer: CustomerDetails {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: Some("+2348012345678".to_string()),
                shipping_address: json!({"street": "1 Analytical Way", "city": "Lagos"}),
            },
            delivery_method: DeliveryMethod::Standard,
            cart: priced_cart(code),
        }
    }

    async fn seed_code(pool: &crate::db::DbPool, code: &str, usage_limit: Option<i32>) {
        let store = DieselDiscountStore::new(pool.clone());
        store
            .create(NewDiscountCode {
                code: code.to_string(),
                kind: DiscountKind::Percentage,
                value: dec("10"),
                usage_limit,
                per_customer_limit: 1,
                minimum_purchase: None,
                expires_at: None,
                source: DiscountSource::Manual,
            })
            .await
            .expect("seed code failed");
    }

    fn outbox_events(pool: &crate::db::DbPool, reference: &str, event_type: &str) -> Vec<OutboxEventRow> {
        let mut conn = pool.get().expect("conn failed");
        order_outbox::table
            .filter(order_outbox::aggregate_id.eq(reference))
            .filter(order_outbox::event_type.eq(event_type))
            .select(OutboxEventRow::as_select())
            .load(&mut conn)
            .expect("query failed")
    }

    #[tokio::test]
    async fn create_and_find_roundtrip_keeps_the_snapshot() {
        let (_container, pool) = setup_db().await;
        let store = DieselOrderStore::new(pool.clone());

        let created = store.create(new_order(None)).await.expect("create failed");
        assert!(created.reference.starts_with("ORD-"));
        assert_eq!(created.status, OrderStatus::Pending);
        assert!(created.payment_reference.is_none());

        let found = store
            .find_by_reference(&created.reference)
            .await
            .expect("find failed")
            .expect("order should exist");
        assert_eq!(found.total, dec("121.75"));
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].name, "Linen Shirt");
        assert_eq!(found.items[0].unit_price, dec("45.00"));

        let events = outbox_events(&pool, &created.reference, "OrderCreated");
        assert_eq!(events.len(), 1, "exactly one OrderCreated event per order");
    }

    #[tokio::test]
    async fn create_with_code_redeems_in_the_same_transaction() {
        let (_container, pool) = setup_db().await;
        seed_code(&pool, "SAVE10", Some(5)).await;
        let store = DieselOrderStore::new(pool.clone());
        let discounts = DieselDiscountStore::new(pool.clone());

        let created = store
            .create(new_order(Some("SAVE10")))
            .await
            .expect("create failed");

        let code = discounts
            .find("SAVE10")
            .await
            .expect("find failed")
            .expect("exists");
        assert_eq!(code.usage_count, 1);

        let redeemed = discounts
            .redemptions_by_customer("SAVE10", "ada@example.com")
            .await
            .expect("count failed");
        assert_eq!(redeemed, 1);
        assert_eq!(created.applied_discount_code.as_deref(), Some("SAVE10"));
    }

    #[tokio::test]
    async fn exhausted_code_rolls_back_the_whole_checkout() {
        let (_container, pool) = setup_db().await;
        seed_code(&pool, "LAST1", Some(1)).await;
        let store = DieselOrderStore::new(pool.clone());

        store
            .create(new_order(Some("LAST1")))
            .await
            .expect("first checkout should win the last unit");

        let err = store
            .create(new_order(Some("LAST1")))
            .await
            .expect_err("second checkout must lose");
        assert!(matches!(
            err,
            DomainError::Discount(DiscountError::LimitExceeded)
        ));

        // The losing attempt leaves no order behind.
        let listed = store.list(1, 20).await.expect("list failed");
        assert_eq!(listed.total, 1);
    }

    #[tokio::test]
    async fn transition_is_conditional_and_paid_event_fires_once() {
        let (_container, pool) = setup_db().await;
        let store = DieselOrderStore::new(pool.clone());
        let created = store.create(new_order(None)).await.expect("create failed");

        let first = store
            .transition(&created.reference, OrderStatus::Pending, OrderStatus::Paid)
            .await
            .expect("transition failed");
        assert_eq!(first, TransitionOutcome::Applied);

        let second = store
            .transition(&created.reference, OrderStatus::Pending, OrderStatus::Paid)
            .await
            .expect("transition failed");
        assert_eq!(second, TransitionOutcome::NotApplied);

        let events = outbox_events(&pool, &created.reference, "OrderPaid");
        assert_eq!(events.len(), 1, "OrderPaid must be emitted exactly once");

        let found = store
            .find_by_reference(&created.reference)
            .await
            .expect("find failed")
            .expect("exists");
        assert_eq!(found.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn payment_intent_is_recorded_at_most_once() {
        let (_container, pool) = setup_db().await;
        let store = DieselOrderStore::new(pool.clone());
        let created = store.create(new_order(None)).await.expect("create failed");

        store
            .record_payment_intent(&created.reference, &created.reference, "https://pay.example/a")
            .await
            .expect("first record failed");

        // Same intent again: no-op.
        store
            .record_payment_intent(&created.reference, &created.reference, "https://pay.example/a")
            .await
            .expect("idempotent re-record failed");

        // A different intent may not overwrite the stored one.
        let err = store
            .record_payment_intent(&created.reference, "OTHER-REF", "https://pay.example/b")
            .await
            .expect_err("should conflict");
        assert!(matches!(err, DomainError::Conflict));
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let (_container, pool) = setup_db().await;
        let store = DieselOrderStore::new(pool.clone());

        for _ in 0..5 {
            store.create(new_order(None)).await.expect("create failed");
        }

        let page1 = store.list(1, 3).await.expect("list page 1 failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);

        let page2 = store.list(2, 3).await.expect("list page 2 failed");
        assert_eq!(page2.total, 5);
        assert_eq!(page2.items.len(), 2);
    }
}
