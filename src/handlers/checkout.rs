use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::checkout::{CheckoutItem, CheckoutRequest, CheckoutService};
use crate::domain::cart::DeliveryMethod;
use crate::domain::order::CustomerDetails;
use crate::errors::AppError;

use super::orders::PricingResponse;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub shipping_address: serde_json::Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequestBody {
    pub customer: CustomerRequest,
    /// "standard", "express" or "pickup"
    pub delivery_method: String,
    pub items: Vec<CheckoutItemRequest>,
    pub discount_code: Option<String>,
    pub wholesale_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub reference: String,
    pub status: String,
    /// Where to send the customer to pay. Null when the gateway was
    /// unavailable; re-initiate via POST /orders/{reference}/pay.
    pub authorization_url: Option<String>,
    pub pricing: PricingResponse,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /checkout
///
/// Prices the cart, creates the order in Pending and opens a payment intent.
/// Pricing and discount failures return structured errors without writing
/// anything; a gateway failure still returns 201 with a null handoff URL.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequestBody,
    responses(
        (status = 201, description = "Order created", body = CheckoutResponse),
        (status = 400, description = "Invalid cart or customer details"),
        (status = 422, description = "Discount code rejected"),
    ),
    tag = "checkout"
)]
pub async fn submit(
    service: web::Data<CheckoutService>,
    body: web::Json<CheckoutRequestBody>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let delivery_method = DeliveryMethod::parse(&body.delivery_method).ok_or_else(|| {
        AppError::Validation(format!("unknown delivery method '{}'", body.delivery_method))
    })?;

    let request = CheckoutRequest {
        customer: CustomerDetails {
            name: body.customer.name,
            email: body.customer.email,
            phone: body.customer.phone,
            shipping_address: body.customer.shipping_address,
        },
        delivery_method,
        items: body
            .items
            .into_iter()
            .map(|i| CheckoutItem {
                product_id: i.product_id,
                quantity: i.quantity,
                size: i.size,
                color: i.color,
            })
            .collect(),
        discount_code: body.discount_code,
        wholesale_code: body.wholesale_code,
    };

    let outcome = service.checkout(request).await?;
    Ok(HttpResponse::Created().json(CheckoutResponse {
        reference: outcome.order.reference.clone(),
        status: outcome.order.status.as_str().to_string(),
        authorization_url: outcome.authorization_url,
        pricing: PricingResponse {
            subtotal: outcome.order.subtotal.to_string(),
            discount_amount: outcome.order.discount_amount.to_string(),
            shipping_fee: outcome.order.shipping_fee.to_string(),
            tax: outcome.order.tax.to_string(),
            total: outcome.order.total.to_string(),
        },
    }))
}
