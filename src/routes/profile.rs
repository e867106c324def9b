use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::{
    dto::profile_dto::UpdateProfileRequest,
    error::Result,
    middleware::auth::Claims,
    models::profile::Profile,
    AppState,
};

const PROFILE_ROLES: [&str; 3] = ["candidate", "interviewer", "admin"];

/// Role recorded for a first-time profile, taken from the token.
fn initial_role(claims: &Claims) -> &str {
    claims
        .role
        .as_deref()
        .filter(|role| PROFILE_ROLES.contains(role))
        .unwrap_or("candidate")
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Caller's profile", body = Json<Profile>),
        (status = 404, description = "Profile not created yet")
    )
)]
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Profile>> {
    let profile = state.profile_service.get(claims.user_id()?).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = Json<Profile>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already used by another account")
    )
)]
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>> {
    payload.validate()?;
    let profile = state
        .profile_service
        .upsert(
            claims.user_id()?,
            &payload.full_name,
            &payload.email,
            payload.phone.as_deref(),
            initial_role(&claims),
        )
        .await?;
    Ok(Json(profile))
}
