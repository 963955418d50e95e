use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::orders::OrderAdminService;
use crate::domain::order::{OrderStatus, OrderView};
use crate::errors::AppError;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    /// Decimal amount as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
    pub line_total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PricingResponse {
    pub subtotal: String,
    pub discount_amount: String,
    pub shipping_fee: String,
    pub tax: String,
    pub total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub reference: String,
    pub status: String,
    pub customer_name: String,
    pub customer_email: String,
    pub delivery_method: String,
    pub pricing: PricingResponse,
    pub applied_discount_code: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

pub fn order_response(view: OrderView) -> OrderResponse {
    OrderResponse {
        reference: view.reference,
        status: view.status.as_str().to_string(),
        customer_name: view.customer_name,
        customer_email: view.customer_email,
        delivery_method: view.delivery_method,
        pricing: PricingResponse {
            subtotal: view.subtotal.to_string(),
            discount_amount: view.discount_amount.to_string(),
            shipping_fee: view.shipping_fee.to_string(),
            tax: view.tax.to_string(),
            total: view.total.to_string(),
        },
        applied_discount_code: view.applied_discount_code,
        payment_reference: view.payment_reference,
        created_at: view.created_at.to_rfc3339(),
        items: view
            .items
            .into_iter()
            .map(|i| OrderItemResponse {
                product_id: i.product_id,
                name: i.name,
                size: i.size,
                color: i.color,
                quantity: i.quantity,
                unit_price: i.unit_price.to_string(),
                line_total: i.line_total.to_string(),
            })
            .collect(),
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target fulfillment status: "processing", "shipped", "delivered" or
    /// "cancelled".
    pub status: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders
///
/// Returns a paginated list of orders (without their item snapshots).
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<OrderAdminService>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = service.list(page, limit).await?;
    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(order_response).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// GET /orders/{reference}
///
/// Returns the order together with its priced item snapshot.
#[utoipa::path(
    get,
    path = "/orders/{reference}",
    params(
        ("reference" = String, Path, description = "Order reference"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<OrderAdminService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order = service.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order_response(order)))
}

/// POST /orders/{reference}/status
///
/// Applies a fulfillment transition. Repeating an already-applied transition
/// is a no-op; transitions outside the lifecycle graph are rejected with 409.
#[utoipa::path(
    post,
    path = "/orders/{reference}/status",
    params(
        ("reference" = String, Path, description = "Order reference"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Transition applied (or already in place)", body = OrderResponse),
        (status = 400, description = "Status not settable by fulfillment"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Illegal transition"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    service: web::Data<OrderAdminService>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let target = OrderStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation(format!("unknown status '{}'", body.status)))?;
    let order = service.transition(&path.into_inner(), target).await?;
    Ok(HttpResponse::Ok().json(order_response(order)))
}
