use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::payment_dto::{CreatePaymentSessionRequest, CreatePaymentSessionResponse},
    error::Result,
    middleware::auth::Claims,
    models::payment_session::PaymentSessionView,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/payments/sessions",
    request_body = CreatePaymentSessionRequest,
    responses(
        (status = 201, description = "Checkout session created", body = Json<CreatePaymentSessionResponse>),
        (status = 400, description = "Invalid payload, coupon or add-on selection"),
        (status = 404, description = "Reservation or interviewer not found"),
        (status = 409, description = "Reservation expired")
    )
)]
#[axum::debug_handler]
pub async fn create_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePaymentSessionRequest>,
) -> Result<(StatusCode, Json<CreatePaymentSessionResponse>)> {
    payload.validate()?;
    let response = state
        .payment_service
        .create_session(claims.user_id()?, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/payments/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Payment session ID")
    ),
    responses(
        (status = 200, description = "Session status", body = Json<PaymentSessionView>),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentSessionView>> {
    let session = state
        .payment_service
        .get_for_user(id, claims.user_id()?, claims.is_admin())
        .await?;
    Ok(Json(PaymentSessionView::from(session)))
}
