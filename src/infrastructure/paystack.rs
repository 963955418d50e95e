use async_trait::async_trait;
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use reqwest::Client;
use serde::Deserialize;

use crate::config::GatewayConfig;
use crate::domain::errors::GatewayError;
use crate::domain::ports::{GatewayPaymentStatus, PaymentGateway, PaymentIntent};

/// Paystack transaction API client. The only place in the crate that knows
/// which vendor sits behind the `PaymentGateway` port.
pub struct PaystackGateway {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl PaystackGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
}

/// Amounts go over the wire in the currency's minor unit.
fn to_minor_units(amount: &BigDecimal) -> Result<i64, GatewayError> {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .ok_or_else(|| GatewayError::Rejected("amount out of range".to_string()))
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::Unreachable
    } else {
        GatewayError::Rejected(e.to_string())
    }
}

/// The gateway's final verdicts are "success" and "failed"; everything else
/// (pending, ongoing, abandoned carts the customer may resume) stays Pending.
fn map_gateway_status(status: &str) -> GatewayPaymentStatus {
    match status {
        "success" => GatewayPaymentStatus::Success,
        "failed" => GatewayPaymentStatus::Failed,
        _ => GatewayPaymentStatus::Pending,
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize(
        &self,
        reference: &str,
        amount: &BigDecimal,
        email: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        let body = serde_json::json!({
            "reference": reference,
            "amount": to_minor_units(amount)?,
            "email": email,
        });

        let resp = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !resp.status().is_success() {
            return Err(GatewayError::Rejected(format!(
                "initialize returned HTTP {}",
                resp.status()
            )));
        }

        let envelope: ApiEnvelope<InitializeData> =
            resp.json().await.map_err(map_transport_error)?;
        match envelope.data {
            Some(data) if envelope.status => Ok(PaymentIntent {
                reference: data.reference,
                authorization_url: data.authorization_url,
            }),
            _ => Err(GatewayError::Rejected(envelope.message)),
        }
    }

    async fn verify(&self, reference: &str) -> Result<GatewayPaymentStatus, GatewayError> {
        let resp = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !resp.status().is_success() {
            return Err(GatewayError::Rejected(format!(
                "verify returned HTTP {}",
                resp.status()
            )));
        }

        let envelope: ApiEnvelope<VerifyData> = resp.json().await.map_err(map_transport_error)?;
        match envelope.data {
            Some(data) if envelope.status => Ok(map_gateway_status(&data.status)),
            _ => Err(GatewayError::Rejected(envelope.message)),
        }
    }
}
