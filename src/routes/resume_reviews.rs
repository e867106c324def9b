use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{payment_dto::CheckoutOrderResponse, resume_review_dto::ResumeReviewForm},
    error::{Error, Result},
    middleware::auth::Claims,
    models::resume_review::ResumeReview,
    services::resume_review_service::NewResumeReview,
    utils::upload::{save_upload, DOCUMENT_EXTENSIONS},
    AppState,
};

/// An uploaded file held in memory until the text fields are validated.
pub(crate) struct UploadedFile {
    pub filename: String,
    pub data: bytes::Bytes,
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    Ok(field.text().await?.trim().to_string())
}

pub(crate) async fn read_file(
    field: axum::extract::multipart::Field<'_>,
    fallback_name: &str,
) -> Result<UploadedFile> {
    let filename = field.file_name().unwrap_or(fallback_name).to_string();
    let data = field.bytes().await.map_err(|e| {
        tracing::error!(error = %e, "failed to read upload bytes");
        Error::BadRequest("Failed to read file upload".into())
    })?;
    Ok(UploadedFile { filename, data })
}

#[utoipa::path(
    post,
    path = "/api/resume-reviews",
    request_body(content = String, content_type = "multipart/form-data", description = "full_name, email, target_role and a resume file (pdf, doc, docx)"),
    responses(
        (status = 201, description = "Review created, awaiting payment", body = Json<ResumeReview>),
        (status = 400, description = "Missing fields or unsupported file")
    )
)]
#[axum::debug_handler]
pub async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeReview>)> {
    let user_id = claims.user_id()?;
    let mut form = ResumeReviewForm::default();
    let mut resume = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "full_name" => form.full_name = read_text(field).await?,
            "email" => form.email = read_text(field).await?,
            "target_role" => {
                form.target_role = Some(read_text(field).await?).filter(|r| !r.is_empty())
            }
            "resume" => resume = Some(read_file(field, "resume.pdf").await?),
            _ => {}
        }
    }

    form.validate()?;
    let resume = resume.ok_or_else(|| Error::BadRequest("A resume file is required".into()))?;
    let resume_url = save_upload("resumes", &resume.filename, &resume.data, &DOCUMENT_EXTENSIONS).await?;

    let review = state
        .resume_review_service
        .create(
            user_id,
            NewResumeReview {
                full_name: form.full_name,
                email: form.email,
                target_role: form.target_role,
                resume_url,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[utoipa::path(
    get,
    path = "/api/resume-reviews/{id}",
    params(
        ("id" = Uuid, Path, description = "Resume review ID")
    ),
    responses(
        (status = 200, description = "Review status", body = Json<ResumeReview>),
        (status = 404, description = "Review not found")
    )
)]
#[axum::debug_handler]
pub async fn get_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeReview>> {
    let review = state
        .resume_review_service
        .get_for_user(id, claims.user_id()?, claims.is_admin())
        .await?;
    Ok(Json(review))
}

#[utoipa::path(
    post,
    path = "/api/resume-reviews/{id}/payment",
    params(
        ("id" = Uuid, Path, description = "Resume review ID")
    ),
    responses(
        (status = 200, description = "Provider order created", body = Json<CheckoutOrderResponse>),
        (status = 404, description = "Review not found"),
        (status = 409, description = "Review already paid")
    )
)]
#[axum::debug_handler]
pub async fn start_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutOrderResponse>> {
    let order = state
        .resume_review_service
        .start_payment(id, claims.user_id()?)
        .await?;
    Ok(Json(order))
}
