use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of an operator-triggered status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualPaymentUpdate {
    pub order_id: String,
    pub payment_status: String,
    #[serde(default)]
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: ProviderEventData,
    #[serde(default)]
    pub event_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEventData {
    pub order: ProviderOrder,
    #[serde(default)]
    pub payment: Option<ProviderPayment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub order_id: String,
    #[serde(default)]
    pub order_amount: Option<Decimal>,
    #[serde(default)]
    pub order_currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPayment {
    #[serde(default, deserialize_with = "id_as_string")]
    pub cf_payment_id: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub payment_amount: Option<Decimal>,
    #[serde(default)]
    pub payment_message: Option<String>,
}

/// Provider payment ids arrive as numbers or strings.
fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
    pub message: String,
}

impl WebhookAck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }
}
