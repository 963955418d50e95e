use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{
    bulk_pricing_tiers, discount_codes, discount_redemptions, order_items, order_outbox, orders,
    products, wholesale_customers,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub base_price: BigDecimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = bulk_pricing_tiers)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BulkPricingTierRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub discount_percent: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = wholesale_customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WholesaleCustomerRow {
    pub id: Uuid,
    pub business_name: String,
    pub email: String,
    pub code: String,
    pub discount_percent: BigDecimal,
    pub tier_min_items: i32,
    pub tier_max_items: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = discount_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DiscountCodeRow {
    pub id: Uuid,
    pub code: String,
    pub kind: String,
    pub value: BigDecimal,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub per_customer_limit: i32,
    pub minimum_purchase: Option<BigDecimal>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = discount_codes)]
pub struct NewDiscountCodeRow {
    pub id: Uuid,
    pub code: String,
    pub kind: String,
    pub value: BigDecimal,
    pub usage_limit: Option<i32>,
    pub per_customer_limit: i32,
    pub minimum_purchase: Option<BigDecimal>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = discount_redemptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DiscountRedemptionRow {
    pub id: Uuid,
    pub code: String,
    pub order_reference: String,
    pub customer_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = discount_redemptions)]
pub struct NewDiscountRedemptionRow {
    pub id: Uuid,
    pub code: String,
    pub order_reference: String,
    pub customer_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub reference: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Value,
    pub delivery_method: String,
    pub status: String,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub tax: BigDecimal,
    pub total: BigDecimal,
    pub applied_discount_code: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub reference: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Value,
    pub delivery_method: String,
    pub status: String,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub tax: BigDecimal,
    pub total: BigDecimal,
    pub applied_discount_code: Option<String>,
}

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
