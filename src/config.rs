use std::env;
use std::str::FromStr;
use std::time::Duration;

use bigdecimal::BigDecimal;

use crate::domain::cart::PricingPolicy;

/// Payment gateway connection settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub secret_key: String,
    pub timeout: Duration,
}

/// Service configuration, read once at startup from the environment
/// (a `.env` file is honoured via dotenvy in `main`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub gateway: GatewayConfig,
    pub pricing: PricingPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| "PORT must be a valid number".to_string())?;

        let gateway = GatewayConfig {
            base_url: env::var("PAYMENT_GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
            secret_key: env::var("PAYMENT_GATEWAY_SECRET")
                .map_err(|_| "PAYMENT_GATEWAY_SECRET must be set".to_string())?,
            timeout: Duration::from_secs(parse_env("PAYMENT_GATEWAY_TIMEOUT_SECS", 10)?),
        };

        let pricing = PricingPolicy {
            tax_percent: parse_decimal_env("TAX_PERCENT", "7.5")?,
            free_shipping_threshold: parse_decimal_env("FREE_SHIPPING_THRESHOLD", "50000")?,
            standard_fee: parse_decimal_env("STANDARD_SHIPPING_FEE", "1500")?,
            express_fee: parse_decimal_env("EXPRESS_SHIPPING_FEE", "3500")?,
        };

        Ok(AppConfig {
            database_url,
            host,
            port,
            gateway,
            pricing,
        })
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("{} has an invalid value", key)),
        Err(_) => Ok(default),
    }
}

fn parse_decimal_env(key: &str, default: &str) -> Result<BigDecimal, String> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    BigDecimal::from_str(&raw).map_err(|_| format!("{} must be a decimal number", key))
}
