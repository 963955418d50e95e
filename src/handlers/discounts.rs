use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::discounts::DiscountAdminService;
use crate::domain::discount::{DiscountCode, DiscountKind, DiscountSource};
use crate::domain::ports::NewDiscountCode;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiscountRequest {
    pub code: String,
    /// "percentage", "fixed_amount" or "free_shipping"
    pub kind: String,
    /// Decimal value as a string, e.g. "10" for 10% or "50.00" off
    pub value: String,
    pub usage_limit: Option<i32>,
    /// Defaults to 1.
    pub per_customer_limit: Option<i32>,
    pub minimum_purchase: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// "manual", "campaign", "wholesale" or "referral"; defaults to "manual".
    pub source: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountResponse {
    pub code: String,
    pub kind: String,
    pub value: String,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub per_customer_limit: i32,
    pub minimum_purchase: Option<String>,
    pub expires_at: Option<String>,
    pub active: bool,
    pub source: String,
}

fn discount_response(code: DiscountCode) -> DiscountResponse {
    DiscountResponse {
        code: code.code,
        kind: code.kind.as_str().to_string(),
        value: code.value.to_string(),
        usage_limit: code.usage_limit,
        usage_count: code.usage_count,
        per_customer_limit: code.per_customer_limit,
        minimum_purchase: code.minimum_purchase.map(|m| m.to_string()),
        expires_at: code.expires_at.map(|t| t.to_rfc3339()),
        active: code.active,
        source: code.source.as_str().to_string(),
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw)
        .map_err(|e| AppError::Validation(format!("Invalid {} '{}': {}", field, raw, e)))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /discounts
///
/// Creates a redeemable code. Codes are stored upper-cased and must be
/// unique.
#[utoipa::path(
    post,
    path = "/discounts",
    request_body = CreateDiscountRequest,
    responses(
        (status = 201, description = "Code created", body = DiscountResponse),
        (status = 400, description = "Invalid code definition"),
    ),
    tag = "discounts"
)]
pub async fn create_discount(
    service: web::Data<DiscountAdminService>,
    body: web::Json<CreateDiscountRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let kind = DiscountKind::parse(&body.kind)
        .ok_or_else(|| AppError::Validation(format!("unknown discount kind '{}'", body.kind)))?;
    let source = match &body.source {
        Some(raw) => DiscountSource::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("unknown discount source '{}'", raw)))?,
        None => DiscountSource::Manual,
    };
    let minimum_purchase = body
        .minimum_purchase
        .as_deref()
        .map(|raw| parse_decimal("minimum_purchase", raw))
        .transpose()?;

    let created = service
        .create(NewDiscountCode {
            code: body.code,
            kind,
            value: parse_decimal("value", &body.value)?,
            usage_limit: body.usage_limit,
            per_customer_limit: body.per_customer_limit.unwrap_or(1),
            minimum_purchase,
            expires_at: body.expires_at,
            source,
        })
        .await?;
    Ok(HttpResponse::Created().json(discount_response(created)))
}

/// POST /discounts/{code}/deactivate
///
/// Soft-deactivates a code. Codes referenced by orders are never deleted.
#[utoipa::path(
    post,
    path = "/discounts/{code}/deactivate",
    params(
        ("code" = String, Path, description = "Discount code"),
    ),
    responses(
        (status = 204, description = "Code deactivated"),
        (status = 404, description = "Code not found"),
    ),
    tag = "discounts"
)]
pub async fn deactivate_discount(
    service: web::Data<DiscountAdminService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service.deactivate(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /discounts
///
/// Lists all codes with their usage stats, newest first.
#[utoipa::path(
    get,
    path = "/discounts",
    responses(
        (status = 200, description = "All discount codes", body = [DiscountResponse]),
    ),
    tag = "discounts"
)]
pub async fn list_discounts(
    service: web::Data<DiscountAdminService>,
) -> Result<HttpResponse, AppError> {
    let codes = service.list().await?;
    let body: Vec<DiscountResponse> = codes.into_iter().map(discount_response).collect();
    Ok(HttpResponse::Ok().json(body))
}
