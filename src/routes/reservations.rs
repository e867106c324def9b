use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::get_config,
    dto::reservation_dto::CreateReservationRequest,
    error::Result,
    middleware::auth::Claims,
    models::time_block::ReservationResponse,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Slot held for the caller", body = Json<ReservationResponse>),
        (status = 400, description = "Invalid payload or slot in the past"),
        (status = 404, description = "Interviewer not found"),
        (status = 409, description = "Time slot is no longer available")
    )
)]
#[axum::debug_handler]
pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>)> {
    payload.validate()?;
    let user_id = claims.user_id()?;
    let block = state
        .reservation_service
        .create_temporary(
            payload.interviewer_id,
            payload.time_slot,
            user_id,
            get_config().reservation_hold_minutes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ReservationResponse::from(block))))
}

#[utoipa::path(
    delete,
    path = "/api/reservations/{id}",
    params(
        ("id" = Uuid, Path, description = "Reservation ID")
    ),
    responses(
        (status = 204, description = "Hold released"),
        (status = 404, description = "Reservation not found")
    )
)]
#[axum::debug_handler]
pub async fn release_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .reservation_service
        .release(id, claims.user_id()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
