use std::collections::BTreeMap;

use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PaymentConfig;
use crate::error::{Error, Result};

/// Gateway customer ids accept only `[A-Za-z0-9_-]`.
pub fn sanitize_customer_id(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "guest".to_string()
    } else {
        cleaned
    }
}

/// Phone numbers reduced to digits; the gateway requires one, so a placeholder fills the gap.
pub fn normalize_phone(raw: Option<&str>) -> String {
    let digits: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.len() >= 10 {
        digits[digits.len() - 10..].to_string()
    } else {
        "9999999999".to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct OrderMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub order_amount: f64,
    pub order_currency: String,
    pub customer_details: CustomerDetails,
    pub order_meta: OrderMeta,
    /// Tags must be strings on the gateway side.
    pub order_tags: BTreeMap<String, String>,
}

impl CreateOrderRequest {
    pub fn new(
        order_id: String,
        amount: Decimal,
        currency: &str,
        customer: CustomerDetails,
        config: &PaymentConfig,
    ) -> Self {
        let return_url = config
            .return_url
            .as_ref()
            .map(|u| u.replace("{order_id}", &order_id));
        Self {
            order_amount: amount.round_dp(2).to_f64().unwrap_or_default(),
            order_id,
            order_currency: currency.to_string(),
            customer_details: customer,
            order_meta: OrderMeta {
                return_url,
                notify_url: config.notify_url.clone(),
            },
            order_tags: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: &str, value: impl ToString) -> Self {
        self.order_tags.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
    pub order_id: String,
    pub payment_session_id: Option<String>,
    #[serde(default)]
    pub order_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayError {
    message: Option<String>,
}

#[derive(Clone)]
pub struct PaymentGateway {
    client: Client,
    config: PaymentConfig,
}

/// Provider's own message when the error body carries one.
fn rejection_reason(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<GatewayError>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("gateway returned {}", status))
}

impl PaymentGateway {
    pub fn new(config: PaymentConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        tracing::info!(environment = %config.environment, base_url = %config.api_base_url, "payment gateway configured");
        Self { client, config }
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreatedOrder> {
        let url = format!("{}/orders", self.config.api_base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .header("x-client-id", &self.config.client_id)
            .header("x-client-secret", &self.config.client_secret)
            .header("x-api-version", &self.config.api_version)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(order_id = %request.order_id, error = %e, "payment gateway unreachable");
                Error::Upstream {
                    status: 502,
                    message: format!("Failed to create payment order: {}", e),
                }
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!(order_id = %request.order_id, status = status.as_u16(), error = %e, "payment gateway response unreadable");
            Error::Upstream {
                status: 502,
                message: format!("Failed to create payment order: gateway returned {} with unreadable body: {}", status, e),
            }
        })?;
        if !status.is_success() {
            let message = rejection_reason(status, &body);
            tracing::warn!(order_id = %request.order_id, status = status.as_u16(), message = %message, "order creation rejected");
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!("Failed to create payment order: {}", message),
            });
        }

        let order: CreatedOrder = serde_json::from_str(&body)?;
        tracing::info!(
            order_id = %order.order_id,
            order_status = ?order.order_status,
            "payment order created"
        );
        Ok(order)
    }
}
