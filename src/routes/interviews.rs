use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::interview_dto::{CancelRequest, RescheduleRequest},
    error::Result,
    middleware::auth::Claims,
    models::interview::{Interview, InterviewWithParties},
    services::booking_service::Actor,
    AppState,
};

fn actor(claims: &Claims) -> Result<Actor> {
    Ok(Actor {
        user_id: claims.user_id()?,
        is_admin: claims.is_admin(),
    })
}

#[utoipa::path(
    get,
    path = "/api/interviews",
    responses(
        (status = 200, description = "Interviews where the caller is candidate or interviewer", body = Json<Vec<InterviewWithParties>>)
    )
)]
#[axum::debug_handler]
pub async fn list_interviews(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<InterviewWithParties>>> {
    let interviews = state
        .booking_service
        .list_for_user(claims.user_id()?)
        .await?;
    Ok(Json(interviews))
}

#[utoipa::path(
    get,
    path = "/api/interviews/{id}",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Interview details", body = Json<InterviewWithParties>),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Interview not found")
    )
)]
#[axum::debug_handler]
pub async fn get_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewWithParties>> {
    let interview = state.booking_service.get_for(id, actor(&claims)?).await?;
    Ok(Json(interview))
}

#[utoipa::path(
    post,
    path = "/api/interviews/{id}/reschedule",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Interview moved", body = Json<Interview>),
        (status = 400, description = "Slot in the past or reschedule limit reached"),
        (status = 403, description = "Caller is not a participant"),
        (status = 409, description = "Slot taken or interview no longer active")
    )
)]
#[axum::debug_handler]
pub async fn reschedule_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<Interview>> {
    payload.validate()?;
    let interview = state
        .booking_service
        .reschedule(id, actor(&claims)?, payload.time_slot)
        .await?;
    Ok(Json(interview))
}

#[utoipa::path(
    post,
    path = "/api/interviews/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Interview cancelled", body = Json<Interview>),
        (status = 403, description = "Caller is not a participant"),
        (status = 409, description = "Interview no longer active")
    )
)]
#[axum::debug_handler]
pub async fn cancel_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelRequest>>,
) -> Result<Json<Interview>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    let interview = state
        .booking_service
        .cancel(id, actor(&claims)?, payload.reason)
        .await?;
    Ok(Json(interview))
}
