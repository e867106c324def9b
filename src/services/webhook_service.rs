//! Payment gateway callbacks.
//!
//! A request is one of three things, checked in order: an operator status
//! update carrying `order_id` and `payment_status` (shared secret required),
//! a connectivity ping, or a signed provider event.

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sha2::Sha256;
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::dto::webhook_dto::{ManualPaymentUpdate, ProviderEvent, WebhookAck};
use crate::error::{Error, Result};
use crate::models::payment_order::{PaymentOrder, KIND_INTERVIEW, KIND_RESUME_REVIEW};
use crate::models::payment_session::PaymentStatus;
use crate::services::payment_service::{PaymentService, StatusChange};
use crate::services::resume_review_service::ResumeReviewService;

type HmacSha256 = Hmac<Sha256>;

pub const SECRET_HEADER: &str = "x-webhook-secret";
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

#[derive(Debug, Clone)]
pub enum WebhookKind {
    Manual(ManualPaymentUpdate),
    Ping,
    Provider(ProviderEvent),
}

pub fn classify(body: &JsonValue) -> Result<WebhookKind> {
    let Some(obj) = body.as_object() else {
        return Ok(WebhookKind::Ping);
    };
    if obj.contains_key("order_id") && obj.contains_key("payment_status") {
        let update: ManualPaymentUpdate = serde_json::from_value(body.clone())
            .map_err(|e| Error::BadRequest(format!("Invalid manual payment update: {}", e)))?;
        return Ok(WebhookKind::Manual(update));
    }
    if !obj.contains_key("type") || obj.len() < 3 || body.pointer("/data/order").is_none() {
        return Ok(WebhookKind::Ping);
    }
    let event: ProviderEvent = serde_json::from_value(body.clone())
        .map_err(|e| Error::BadRequest(format!("Invalid payment event: {}", e)))?;
    Ok(WebhookKind::Provider(event))
}

/// Status a provider event type moves the order to; `None` for events we ignore.
pub fn event_status(event_type: &str) -> Option<PaymentStatus> {
    match event_type {
        "PAYMENT_SUCCESS_WEBHOOK" => Some(PaymentStatus::Completed),
        "PAYMENT_FAILED_WEBHOOK" | "PAYMENT_USER_DROPPED_WEBHOOK" => Some(PaymentStatus::Failed),
        _ => None,
    }
}

/// `base64(HMAC-SHA256(secret, timestamp || body))`.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(body);
    Some(BASE64.encode(mac.finalize().into_bytes()))
}

pub fn verify_signature(secret: &str, timestamp: &str, body: &[u8], signature: &str) -> bool {
    match sign(secret, timestamp, body) {
        Some(expected) => expected.as_bytes().ct_eq(signature.trim().as_bytes()).into(),
        None => false,
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub fn verify_shared_secret(headers: &HeaderMap, expected: &str) -> Result<()> {
    let Some(provided) = header(headers, SECRET_HEADER) else {
        return Err(Error::Unauthorized("missing_webhook_secret".into()));
    };
    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_webhook_secret".into()))
    }
}

pub fn verify_provider_signature(headers: &HeaderMap, secret: &str, body: &[u8]) -> Result<()> {
    let (Some(signature), Some(timestamp)) = (header(headers, SIGNATURE_HEADER), header(headers, TIMESTAMP_HEADER)) else {
        return Err(Error::Unauthorized("missing_webhook_signature".into()));
    };
    if verify_signature(secret, timestamp, body, signature) {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_webhook_signature".into()))
    }
}

#[derive(Clone)]
pub struct WebhookService {
    pool: PgPool,
    payments: PaymentService,
    resume_reviews: ResumeReviewService,
}

impl WebhookService {
    pub fn new(pool: PgPool, payments: PaymentService, resume_reviews: ResumeReviewService) -> Self {
        Self {
            pool,
            payments,
            resume_reviews,
        }
    }

    pub async fn handle(&self, headers: &HeaderMap, raw: &[u8]) -> Result<WebhookAck> {
        let body: JsonValue = if raw.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(raw)?
        };
        let config = crate::config::get_config();

        match classify(&body)? {
            WebhookKind::Manual(update) => {
                verify_shared_secret(headers, &config.webhook_secret)?;
                let status: PaymentStatus = update.payment_status.parse().map_err(Error::BadRequest)?;
                tracing::info!(order_id = %update.order_id, status = %status, "manual payment update");
                self.apply(&update.order_id, status, update.payment_id.as_deref(), None).await
            }
            WebhookKind::Ping => {
                tracing::debug!("webhook connectivity ping");
                Ok(WebhookAck::ok("Webhook endpoint reachable"))
            }
            WebhookKind::Provider(event) => {
                verify_provider_signature(headers, &config.payment.client_secret, raw)?;
                let Some(status) = event_status(&event.event_type) else {
                    tracing::info!(event_type = %event.event_type, order_id = %event.data.order.order_id, "payment event ignored");
                    return Ok(WebhookAck::ok(format!("Event {} ignored", event.event_type)));
                };
                let payment = event.data.payment.as_ref();
                let amount = payment
                    .and_then(|p| p.payment_amount)
                    .or(event.data.order.order_amount);
                tracing::info!(
                    event_type = %event.event_type,
                    order_id = %event.data.order.order_id,
                    provider_status = ?payment.and_then(|p| p.payment_status.as_deref()),
                    "payment event received"
                );
                self.apply(
                    &event.data.order.order_id,
                    status,
                    payment.and_then(|p| p.cf_payment_id.as_deref()),
                    amount,
                )
                .await
            }
        }
    }

    async fn resolve(&self, order_id: &str) -> Result<PaymentOrder> {
        sqlx::query_as::<_, PaymentOrder>(r#"SELECT * FROM payment_orders WHERE provider_order_id = $1"#)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Unknown order {}", order_id)))
    }

    async fn apply(
        &self,
        order_id: &str,
        status: PaymentStatus,
        provider_payment_id: Option<&str>,
        provider_amount: Option<Decimal>,
    ) -> Result<WebhookAck> {
        let order = self.resolve(order_id).await?;
        match order.kind.as_str() {
            KIND_INTERVIEW => {
                self.apply_to_session(order.local_id, status, provider_payment_id, provider_amount)
                    .await
            }
            KIND_RESUME_REVIEW => {
                let changed = self.resume_reviews.apply_payment(order.local_id, status, None).await?;
                Ok(WebhookAck::ok(if changed {
                    format!("Resume review payment marked {}", status)
                } else {
                    "Resume review payment unchanged".to_string()
                }))
            }
            other => Err(Error::Internal(format!("Unknown order kind '{}'", other))),
        }
    }

    async fn apply_to_session(
        &self,
        session_id: Uuid,
        status: PaymentStatus,
        provider_payment_id: Option<&str>,
        provider_amount: Option<Decimal>,
    ) -> Result<WebhookAck> {
        let session = self.payments.get(session_id).await?;
        if let Some(amount) = provider_amount {
            if amount != session.amount {
                tracing::warn!(
                    session_id = %session_id,
                    provider_amount = %amount,
                    local_amount = %session.amount,
                    "payment amount mismatch"
                );
            }
        }

        let change = self
            .payments
            .apply_status(session_id, status, provider_payment_id, None)
            .await?;
        match (change, status) {
            (StatusChange::Applied, PaymentStatus::Completed) => {
                self.payments.after_completed(&session, true).await;
            }
            (StatusChange::Unchanged, PaymentStatus::Completed) => {
                self.payments.after_completed(&session, false).await;
            }
            (StatusChange::Applied, PaymentStatus::Failed) => {
                self.payments.after_failed(&session).await;
            }
            _ => {}
        }

        let message = match change {
            StatusChange::Applied => format!("Payment session marked {}", status),
            StatusChange::Unchanged => format!("Payment session already {}", status),
            StatusChange::Rejected { current } => {
                format!("Payment session is {} and cannot become {}", current, status)
            }
        };
        Ok(WebhookAck::ok(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn provider_event(event_type: &str) -> JsonValue {
        json!({
            "type": event_type,
            "event_time": "2026-10-20T10:00:00+05:30",
            "data": {
                "order": { "order_id": "ORDER_3f2504e0-4f89-11d3-9a0c-0305e82c3301", "order_amount": 1098.00, "order_currency": "INR" },
                "payment": { "cf_payment_id": 5114910404_i64, "payment_status": "SUCCESS", "payment_amount": 1098.00 }
            }
        })
    }

    #[test]
    fn manual_updates_are_recognized_first() {
        let body = json!({ "order_id": "ORDER_x", "payment_status": "SUCCESS", "type": "PAYMENT_SUCCESS_WEBHOOK" });
        match classify(&body).unwrap() {
            WebhookKind::Manual(update) => {
                assert_eq!(update.order_id, "ORDER_x");
                assert_eq!(update.payment_status.parse::<PaymentStatus>(), Ok(PaymentStatus::Completed));
            }
            other => panic!("expected manual update, got {:?}", other),
        }
    }

    #[test]
    fn pings_are_acknowledged() {
        for body in [
            json!({}),
            json!({ "test": true }),
            json!({ "type": "WEBHOOK", "data": {} , "x": 1}),
            json!({ "type": "PAYMENT_SUCCESS_WEBHOOK", "data": { "order": {} } }),
            json!("hello"),
            JsonValue::Null,
        ] {
            assert!(matches!(classify(&body).unwrap(), WebhookKind::Ping), "{}", body);
        }
    }

    #[test]
    fn provider_events_parse() {
        let WebhookKind::Provider(event) = classify(&provider_event("PAYMENT_SUCCESS_WEBHOOK")).unwrap() else {
            panic!("expected provider event");
        };
        assert_eq!(event.data.order.order_id, "ORDER_3f2504e0-4f89-11d3-9a0c-0305e82c3301");
        let payment = event.data.payment.unwrap();
        assert_eq!(payment.cf_payment_id.as_deref(), Some("5114910404"));
        assert_eq!(payment.payment_amount, Some(Decimal::from(1098)));
    }

    #[test]
    fn event_types_map_to_statuses() {
        assert_eq!(event_status("PAYMENT_SUCCESS_WEBHOOK"), Some(PaymentStatus::Completed));
        assert_eq!(event_status("PAYMENT_FAILED_WEBHOOK"), Some(PaymentStatus::Failed));
        assert_eq!(event_status("PAYMENT_USER_DROPPED_WEBHOOK"), Some(PaymentStatus::Failed));
        assert_eq!(event_status("REFUND_STATUS_WEBHOOK"), None);
    }

    #[test]
    fn signatures_detect_tampering() {
        let body = provider_event("PAYMENT_SUCCESS_WEBHOOK").to_string();
        let sig = sign("secret", "1760950000", body.as_bytes()).unwrap();
        assert!(verify_signature("secret", "1760950000", body.as_bytes(), &sig));
        assert!(!verify_signature("secret", "1760950001", body.as_bytes(), &sig));
        assert!(!verify_signature("other", "1760950000", body.as_bytes(), &sig));
        let tampered = body.replace("1098", "1");
        assert!(!verify_signature("secret", "1760950000", tampered.as_bytes(), &sig));
    }

    #[test]
    fn signature_headers_are_required() {
        let body = b"{}";
        let mut headers = HeaderMap::new();
        assert!(verify_provider_signature(&headers, "secret", body).is_err());

        headers.insert(TIMESTAMP_HEADER, HeaderValue::from_static("1760950000"));
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign("secret", "1760950000", body).unwrap()).unwrap(),
        );
        assert!(verify_provider_signature(&headers, "secret", body).is_ok());
    }

    #[test]
    fn shared_secret_is_compared_exactly() {
        let mut headers = HeaderMap::new();
        assert!(matches!(verify_shared_secret(&headers, "s3cret"), Err(Error::Unauthorized(_))));
        headers.insert(SECRET_HEADER, HeaderValue::from_static("s3cre"));
        assert!(verify_shared_secret(&headers, "s3cret").is_err());
        headers.insert(SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert!(verify_shared_secret(&headers, "s3cret").is_ok());
    }
}
