use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::checkout::CheckoutService;
use crate::application::payments::PaymentService;
use crate::errors::AppError;

use super::orders::{order_response, OrderResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub reference: String,
    pub authorization_url: String,
}

/// GET /payments/{reference}/verify
///
/// Reconciles the gateway's authoritative status for a payment against the
/// order. Safe to call any number of times, from the browser redirect and
/// the gateway callback alike.
#[utoipa::path(
    get,
    path = "/payments/{reference}/verify",
    params(
        ("reference" = String, Path, description = "Payment reference"),
    ),
    responses(
        (status = 200, description = "Current order state after verification", body = OrderResponse),
        (status = 404, description = "No order for this reference"),
        (status = 502, description = "Payment gateway unavailable"),
    ),
    tag = "payments"
)]
pub async fn verify(
    service: web::Data<PaymentService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order = service.verify(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order_response(order)))
}

/// POST /orders/{reference}/pay
///
/// (Re-)initiates payment for a Pending order. An existing intent is reused;
/// gateway failures leave the order Pending and the call retryable.
#[utoipa::path(
    post,
    path = "/orders/{reference}/pay",
    params(
        ("reference" = String, Path, description = "Order reference"),
    ),
    responses(
        (status = 200, description = "Payment handoff", body = PaymentIntentResponse),
        (status = 400, description = "Order is not awaiting payment"),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Payment gateway unavailable"),
    ),
    tag = "payments"
)]
pub async fn initiate(
    service: web::Data<CheckoutService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let intent = service.initiate_payment(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PaymentIntentResponse {
        reference: intent.reference,
        authorization_url: intent.authorization_url,
    }))
}
