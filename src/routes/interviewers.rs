use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{interviewer_dto::UpdateAvailabilityRequest, reservation_dto::BlockRequest},
    error::Result,
    middleware::auth::Claims,
    models::{interviewer::Interviewer, time_block::TimeBlock},
    AppState,
};

#[utoipa::path(
    put,
    path = "/api/interviewers/me/availability",
    request_body = UpdateAvailabilityRequest,
    responses(
        (status = 200, description = "Availability saved", body = Json<Interviewer>),
        (status = 400, description = "Unknown weekday or empty window"),
        (status = 403, description = "Caller is not an interviewer")
    )
)]
#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Interviewer>> {
    payload.validate()?;
    let interviewer = state
        .interviewer_service
        .update_availability(
            claims.user_id()?,
            &payload.availability_days,
            &payload.time_slots,
        )
        .await?;
    Ok(Json(interviewer))
}

#[utoipa::path(
    get,
    path = "/api/interviewers/me/blocks",
    responses(
        (status = 200, description = "Current and upcoming calendar blocks", body = Json<Vec<TimeBlock>>),
        (status = 403, description = "Caller is not an interviewer")
    )
)]
#[axum::debug_handler]
pub async fn list_blocks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<TimeBlock>>> {
    let interviewer = state
        .interviewer_service
        .get_by_user(claims.user_id()?)
        .await?;
    let blocks = state.reservation_service.list_blocks(interviewer.id).await?;
    Ok(Json(blocks))
}

#[utoipa::path(
    post,
    path = "/api/interviewers/me/blocks",
    request_body = BlockRequest,
    responses(
        (status = 201, description = "Manual block created", body = Json<TimeBlock>),
        (status = 400, description = "Slot in the past"),
        (status = 403, description = "Caller is not an interviewer"),
        (status = 409, description = "Slot overlaps an existing block")
    )
)]
#[axum::debug_handler]
pub async fn create_block(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BlockRequest>,
) -> Result<(StatusCode, Json<TimeBlock>)> {
    payload.validate()?;
    let user_id = claims.user_id()?;
    let interviewer = state.interviewer_service.get_by_user(user_id).await?;
    let block = state
        .reservation_service
        .create_manual_block(interviewer.id, payload.time_slot, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(block)))
}

#[utoipa::path(
    delete,
    path = "/api/interviewers/me/blocks/{id}",
    params(
        ("id" = Uuid, Path, description = "Block ID")
    ),
    responses(
        (status = 204, description = "Block removed"),
        (status = 403, description = "Caller is not an interviewer"),
        (status = 404, description = "No manual block with this id")
    )
)]
#[axum::debug_handler]
pub async fn delete_block(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let interviewer = state
        .interviewer_service
        .get_by_user(claims.user_id()?)
        .await?;
    state
        .reservation_service
        .delete_manual_block(interviewer.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
