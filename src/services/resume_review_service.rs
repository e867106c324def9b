use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::payment_dto::CheckoutOrderResponse;
use crate::error::{Error, Result};
use crate::models::payment_order::{resume_review_order_id, KIND_RESUME_REVIEW};
use crate::models::payment_session::PaymentStatus;
use crate::models::resume_review::ResumeReview;
use crate::services::audit_service::AuditService;
use crate::services::email_templates::{EmailPayload, EmailTemplate};
use crate::services::notification_service::NotificationService;
use crate::services::payment_gateway::{
    normalize_phone, sanitize_customer_id, CreateOrderRequest, CustomerDetails, PaymentGateway,
};

/// Review-side payment state for a gateway outcome.
pub fn review_payment_status(status: PaymentStatus) -> Option<&'static str> {
    match status {
        PaymentStatus::Completed => Some("paid"),
        PaymentStatus::Failed => Some("failed"),
        PaymentStatus::Pending | PaymentStatus::Processing => None,
    }
}

#[derive(Debug, Clone)]
pub struct NewResumeReview {
    pub full_name: String,
    pub email: String,
    pub target_role: Option<String>,
    pub resume_url: String,
}

#[derive(Clone)]
pub struct ResumeReviewService {
    pool: PgPool,
    gateway: PaymentGateway,
    notifications: NotificationService,
    audit: AuditService,
}

impl ResumeReviewService {
    pub fn new(
        pool: PgPool,
        gateway: PaymentGateway,
        notifications: NotificationService,
        audit: AuditService,
    ) -> Self {
        Self {
            pool,
            gateway,
            notifications,
            audit,
        }
    }

    pub async fn create(&self, user_id: Uuid, review: NewResumeReview) -> Result<ResumeReview> {
        let price = crate::config::get_config().pricing.resume_review;
        let row = sqlx::query_as::<_, ResumeReview>(
            r#"
            INSERT INTO resume_reviews (user_id, full_name, email, target_role, resume_url, amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(review.full_name.trim())
        .bind(review.email.trim().to_lowercase())
        .bind(review.target_role.as_deref().map(str::trim).filter(|r| !r.is_empty()))
        .bind(&review.resume_url)
        .bind(price)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(review_id = %row.id, user_id = %user_id, "resume review submitted");
        Ok(row)
    }

    pub async fn get(&self, id: Uuid) -> Result<ResumeReview> {
        sqlx::query_as::<_, ResumeReview>(r#"SELECT * FROM resume_reviews WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Resume review not found".to_string()))
    }

    pub async fn get_for_user(&self, id: Uuid, user_id: Uuid, is_admin: bool) -> Result<ResumeReview> {
        let review = self.get(id).await?;
        if review.user_id != user_id && !is_admin {
            return Err(Error::NotFound("Resume review not found".to_string()));
        }
        Ok(review)
    }

    pub async fn start_payment(&self, id: Uuid, user_id: Uuid) -> Result<CheckoutOrderResponse> {
        let review = self.get_for_user(id, user_id, false).await?;
        if review.payment_status == "paid" {
            return Err(Error::Conflict("Resume review is already paid".to_string()));
        }

        let order_id = resume_review_order_id(review.id, Utc::now());
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"UPDATE resume_reviews SET provider_order_id = $2, payment_status = 'pending', updated_at = NOW() WHERE id = $1"#,
        )
        .bind(review.id)
        .bind(&order_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(r#"INSERT INTO payment_orders (provider_order_id, kind, local_id) VALUES ($1, $2, $3)"#)
            .bind(&order_id)
            .bind(KIND_RESUME_REVIEW)
            .bind(review.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let config = self.gateway.config();
        let customer = CustomerDetails {
            customer_id: sanitize_customer_id(&user_id.to_string()),
            customer_name: review.full_name.clone(),
            customer_email: review.email.clone(),
            customer_phone: normalize_phone(None),
        };
        let request = CreateOrderRequest::new(order_id, review.amount, &config.currency, customer, config)
            .tag("review_id", review.id)
            .tag("kind", KIND_RESUME_REVIEW);
        let order = self.gateway.create_order(&request).await?;

        Ok(CheckoutOrderResponse {
            order_id: order.order_id,
            payment_session_id: order.payment_session_id,
            amount: review.amount,
            currency: config.currency.clone(),
            environment: config.environment.clone(),
        })
    }

    /// Records a gateway outcome for the review; a paid review stays paid.
    pub async fn apply_payment(&self, id: Uuid, status: PaymentStatus, actor: Option<Uuid>) -> Result<bool> {
        let Some(next) = review_payment_status(status) else {
            return Ok(false);
        };
        let updated = sqlx::query_as::<_, ResumeReview>(
            r#"
            UPDATE resume_reviews SET payment_status = $2, updated_at = NOW()
            WHERE id = $1 AND payment_status <> 'paid' AND payment_status <> $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        let Some(review) = updated else {
            tracing::info!(review_id = %id, status = next, "resume review payment already recorded");
            return Ok(false);
        };
        tracing::info!(review_id = %id, status = next, "resume review payment updated");
        self.audit
            .record(actor, "resume_review.payment", "resume_review", id, json!({ "payment_status": next }))
            .await;

        if next == "paid" {
            let payload = EmailPayload {
                recipient_name: review.full_name.clone(),
                target_role: review.target_role.clone(),
                ..Default::default()
            };
            self.notifications
                .notify(EmailTemplate::ResumeReviewReceived, &review.email, &payload)
                .await;
        }
        Ok(true)
    }

    pub async fn update_status(&self, id: Uuid, status: &str, notes: Option<String>, admin: Uuid) -> Result<ResumeReview> {
        let review = sqlx::query_as::<_, ResumeReview>(
            r#"
            UPDATE resume_reviews
            SET status = $2, reviewer_notes = COALESCE($3, reviewer_notes), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(&notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Resume review not found".to_string()))?;

        self.audit
            .record(Some(admin), "resume_review.status_changed", "resume_review", id, json!({ "status": status }))
            .await;
        Ok(review)
    }

    pub async fn attach_report(&self, id: Uuid, report_url: &str, admin: Uuid) -> Result<ResumeReview> {
        let review = sqlx::query_as::<_, ResumeReview>(
            r#"
            UPDATE resume_reviews
            SET status = 'completed', report_url = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(report_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Resume review not found".to_string()))?;

        tracing::info!(review_id = %id, "resume review report attached");
        self.audit
            .record(Some(admin), "resume_review.completed", "resume_review", id, json!({ "report_url": report_url }))
            .await;

        let payload = EmailPayload {
            recipient_name: review.full_name.clone(),
            target_role: review.target_role.clone(),
            report_url: Some(report_url.to_string()),
            notes: review.reviewer_notes.clone(),
            ..Default::default()
        };
        self.notifications
            .notify(EmailTemplate::ResumeReviewCompleted, &review.email, &payload)
            .await;
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_outcomes_map_to_review_states() {
        assert_eq!(review_payment_status(PaymentStatus::Completed), Some("paid"));
        assert_eq!(review_payment_status(PaymentStatus::Failed), Some("failed"));
        assert_eq!(review_payment_status(PaymentStatus::Processing), None);
    }
}
