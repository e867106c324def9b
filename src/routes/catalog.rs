use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    config::get_config,
    dto::payment_dto::ValidateCouponRequest,
    error::Result,
    models::{add_on::AddOn, plan::PlanType},
    services::pricing_service::CouponQuote,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct AddOnQuery {
    pub plan_type: Option<PlanType>,
}

#[utoipa::path(
    get,
    path = "/api/add-ons",
    params(
        ("plan_type" = Option<String>, Query, description = "basic, pro or premium")
    ),
    responses(
        (status = 200, description = "Active add-ons in display order", body = Json<Vec<AddOn>>),
        (status = 400, description = "Unknown plan type")
    )
)]
#[axum::debug_handler]
pub async fn list_add_ons(
    State(state): State<AppState>,
    Query(query): Query<AddOnQuery>,
) -> Result<Json<Vec<AddOn>>> {
    let add_ons = state.add_on_service.list_for_plan(query.plan_type).await?;
    Ok(Json(add_ons))
}

#[utoipa::path(
    post,
    path = "/api/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Discount preview for the plan's base price", body = Json<CouponQuote>),
        (status = 400, description = "Coupon inactive, expired, exhausted or not valid for the plan"),
        (status = 404, description = "Coupon not found")
    )
)]
#[axum::debug_handler]
pub async fn validate_coupon(
    State(state): State<AppState>,
    Json(payload): Json<ValidateCouponRequest>,
) -> Result<Json<CouponQuote>> {
    payload.validate()?;
    let price = get_config().plan_price(payload.plan_type);
    let quote = state
        .coupon_service
        .quote(&payload.code, payload.plan_type, price)
        .await?;
    Ok(Json(quote))
}
