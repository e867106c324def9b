use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    dto::matching_dto::MatchRequest,
    error::Result,
    services::matching_service::{CandidateProfile, MatchResult},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/matching",
    request_body = MatchRequest,
    responses(
        (status = 200, description = "Best interviewer with score breakdown", body = Json<MatchResult>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "No eligible or no suitable interviewer")
    )
)]
#[axum::debug_handler]
pub async fn find_match(
    State(state): State<AppState>,
    Json(payload): Json<MatchRequest>,
) -> Result<Json<MatchResult>> {
    payload.validate()?;
    tracing::info!(
        target_role = %payload.target_role,
        experience_years = payload.experience_years,
        slot = %payload.time_slot,
        "matching request"
    );
    let result = state
        .matching_service
        .find_match(&CandidateProfile::from(&payload))
        .await?;
    Ok(Json(result))
}
