use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use crate::{dto::webhook_dto::WebhookAck, error::Result, AppState};

#[utoipa::path(
    post,
    path = "/api/webhooks/payment",
    responses(
        (status = 200, description = "Event processed, ignored, or connectivity ping", body = Json<WebhookAck>),
        (status = 400, description = "Body is not a recognizable payment event"),
        (status = 401, description = "Missing or invalid webhook secret/signature"),
        (status = 404, description = "Unknown order id"),
        (status = 500, description = "Database error while applying the event")
    )
)]
#[axum::debug_handler]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let ack = state.webhook_service.handle(&headers, &body).await?;
    Ok(Json(ack))
}
