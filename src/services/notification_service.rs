use crate::error::Result;
use crate::models::email_outbox::OutboxEmail;
use crate::services::email_templates::{render, EmailPayload, EmailTemplate};
use reqwest::Client;
use serde_json::json;
use sqlx::PgPool;

/// Age after which a `sending` claim is considered abandoned.
pub const STALE_CLAIM_SECS: f64 = 300.0;

/// Relay endpoint settings; without a URL deliveries are marked `skipped`.
#[derive(Debug, Clone, Default)]
pub struct EmailRelay {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

impl EmailRelay {
    pub fn from_config() -> Self {
        let config = crate::config::get_config();
        Self {
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    client: Client,
    relay: EmailRelay,
}

impl NotificationService {
    pub fn new(pool: PgPool, relay: EmailRelay) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        if relay.api_url.is_none() {
            tracing::info!("email relay disabled (EMAIL_API_URL not set), outbox rows will be skipped");
        }
        Self { pool, client, relay }
    }

    pub async fn enqueue(
        &self,
        template: EmailTemplate,
        recipient: &str,
        payload: &EmailPayload,
    ) -> Result<OutboxEmail> {
        let rendered = render(template, payload)?;
        let row = sqlx::query_as::<_, OutboxEmail>(
            r#"
            INSERT INTO email_outbox (template, recipient, subject, html, payload, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING *
            "#,
        )
        .bind(template.as_str())
        .bind(recipient)
        .bind(&rendered.subject)
        .bind(&rendered.html)
        .bind(serde_json::to_value(payload)?)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(email_id = %row.id, template = template.as_str(), recipient, "email queued");
        Ok(row)
    }

    /// Queues an email and logs instead of failing the caller.
    pub async fn notify(&self, template: EmailTemplate, recipient: &str, payload: &EmailPayload) {
        if let Err(e) = self.enqueue(template, recipient, payload).await {
            tracing::error!(error = %e, template = template.as_str(), recipient, "failed to queue email");
        }
    }

    pub async fn deliver_once(&self, email: &OutboxEmail) -> Result<()> {
        let Some(url) = self.relay.api_url.as_deref() else {
            sqlx::query(
                r#"UPDATE email_outbox SET status = 'skipped', attempts = attempts + 1, updated_at = NOW() WHERE id = $1"#,
            )
            .bind(email.id)
            .execute(&self.pool)
            .await?;
            return Ok(());
        };

        let mut request = self.client.post(url).json(&json!({
            "from": self.relay.from,
            "to": email.recipient,
            "subject": email.subject,
            "html": email.html,
        }));
        if let Some(key) = self.relay.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(resp) => {
                let status = resp.status().as_u16() as i32;
                let body = resp.text().await.unwrap_or_default();
                sqlx::query(
                    r#"UPDATE email_outbox
                       SET http_status = $1, response_body = $2,
                           status = CASE WHEN $1 BETWEEN 200 AND 299 THEN 'sent' ELSE 'failed' END,
                           attempts = attempts + 1, updated_at = NOW()
                       WHERE id = $3"#,
                )
                .bind(status)
                .bind(body)
                .bind(email.id)
                .execute(&self.pool)
                .await?;
                if !(200..300).contains(&status) {
                    tracing::warn!(email_id = %email.id, status, "email relay rejected message");
                }
            }
            Err(err) => {
                sqlx::query(
                    r#"UPDATE email_outbox SET response_body = $1, status = 'failed', attempts = attempts + 1, updated_at = NOW() WHERE id = $2"#,
                )
                .bind(err.to_string())
                .bind(email.id)
                .execute(&self.pool)
                .await?;
                tracing::warn!(email_id = %email.id, error = %err, "email relay unreachable");
            }
        }
        Ok(())
    }

    /// Claims and delivers one due email; `Ok(false)` when the outbox is idle.
    ///
    /// Rows left in `sending` longer than [`STALE_CLAIM_SECS`] belong to a worker that
    /// died mid-delivery and are claimed again.
    pub async fn run_once(&self) -> Result<bool> {
        let claimed = sqlx::query_as::<_, OutboxEmail>(
            r#"
            UPDATE email_outbox SET status = 'sending', updated_at = NOW()
            WHERE id = (
                SELECT id FROM email_outbox
                WHERE (status = 'pending' AND (next_retry_at IS NULL OR next_retry_at <= NOW()))
                   OR (status = 'sending' AND updated_at < NOW() - make_interval(secs => $1))
                ORDER BY created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(STALE_CLAIM_SECS)
        .fetch_optional(&self.pool)
        .await?;

        let Some(email) = claimed else { return Ok(false) };

        if let Err(e) = self.deliver_once(&email).await {
            tracing::error!(email_id = %email.id, error = %e, "email delivery bookkeeping failed");
        }

        sqlx::query(
            r#"UPDATE email_outbox
               SET status = 'pending',
                   next_retry_at = NOW() + make_interval(secs => LEAST(3600, 30 * power(2::float, GREATEST(0, attempts - 1))::int))
               WHERE id = $1 AND status IN ('failed', 'sending') AND attempts < max_attempts"#,
        )
        .bind(email.id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }
}
