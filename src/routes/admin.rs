use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        interviewer_dto::EligibilityRequest, reservation_dto::CleanupResponse,
        resume_review_dto::UpdateReviewStatusRequest,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::{interview::Interview, interviewer::Interviewer, resume_review::ResumeReview},
    routes::resume_reviews::read_file,
    utils::upload::{save_upload, REPORT_EXTENSIONS},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/admin/reservations/cleanup",
    responses(
        (status = 200, description = "Expired temporary reservations removed", body = Json<CleanupResponse>),
        (status = 403, description = "Admin role required")
    )
)]
#[axum::debug_handler]
pub async fn cleanup_reservations(State(state): State<AppState>) -> Result<Json<CleanupResponse>> {
    let removed = state.reservation_service.cleanup_expired().await?;
    Ok(Json(CleanupResponse { removed }))
}

#[utoipa::path(
    post,
    path = "/api/admin/payments/sessions/{id}/book",
    params(
        ("id" = Uuid, Path, description = "Payment session ID")
    ),
    responses(
        (status = 200, description = "Interview booked or already existing", body = Json<Interview>),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session is not completed")
    )
)]
#[axum::debug_handler]
pub async fn rebook_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Interview>> {
    tracing::info!(session_id = %id, admin = %claims.sub, "manual auto-booking requested");
    let interview = state.payment_service.rebook(id).await?;
    Ok(Json(interview))
}

#[utoipa::path(
    patch,
    path = "/api/admin/interviewers/{id}/eligibility",
    params(
        ("id" = Uuid, Path, description = "Interviewer ID")
    ),
    request_body = EligibilityRequest,
    responses(
        (status = 200, description = "Eligibility updated", body = Json<Interviewer>),
        (status = 404, description = "Interviewer not found")
    )
)]
#[axum::debug_handler]
pub async fn set_eligibility(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EligibilityRequest>,
) -> Result<Json<Interviewer>> {
    payload.validate()?;
    let interviewer = state
        .interviewer_service
        .set_eligibility(id, payload.is_eligible)
        .await?;
    state
        .audit_service
        .record(
            Some(claims.user_id()?),
            "interviewer.eligibility_changed",
            "interviewer",
            id,
            serde_json::json!({ "is_eligible": payload.is_eligible }),
        )
        .await;
    Ok(Json(interviewer))
}

#[utoipa::path(
    patch,
    path = "/api/admin/resume-reviews/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Resume review ID")
    ),
    request_body = UpdateReviewStatusRequest,
    responses(
        (status = 200, description = "Review status updated", body = Json<ResumeReview>),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Review not found")
    )
)]
#[axum::debug_handler]
pub async fn update_review_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewStatusRequest>,
) -> Result<Json<ResumeReview>> {
    payload.validate()?;
    let review = state
        .resume_review_service
        .update_status(id, &payload.status, payload.notes, claims.user_id()?)
        .await?;
    Ok(Json(review))
}

#[utoipa::path(
    post,
    path = "/api/admin/resume-reviews/{id}/report",
    params(
        ("id" = Uuid, Path, description = "Resume review ID")
    ),
    request_body(content = String, content_type = "multipart/form-data", description = "report: the PDF report"),
    responses(
        (status = 200, description = "Report attached and review completed", body = Json<ResumeReview>),
        (status = 400, description = "Missing or non-PDF report"),
        (status = 404, description = "Review not found")
    )
)]
#[axum::debug_handler]
pub async fn upload_review_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ResumeReview>> {
    let admin = claims.user_id()?;
    let mut report = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("report") {
            report = Some(read_file(field, "report.pdf").await?);
        }
    }
    let report = report.ok_or_else(|| Error::BadRequest("A report file is required".into()))?;

    // Fail on an unknown review before writing the file.
    state.resume_review_service.get(id).await?;
    let report_url = save_upload("reports", &report.filename, &report.data, &REPORT_EXTENSIONS).await?;
    let review = state
        .resume_review_service
        .attach_report(id, &report_url, admin)
        .await?;
    Ok(Json(review))
}
