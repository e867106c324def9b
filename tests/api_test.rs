mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use mockhire_backend::services::webhook_service::{
    sign, SECRET_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{body_json, empty_request, json_request, offline_app, token, PAYMENT_SECRET};

fn past_slot() -> String {
    let day = (Utc::now() - Duration::days(3)).date_naive();
    format!("{}, {} 10:00-11:00", day.format("%A"), day.format("%d/%m/%Y"))
}

#[tokio::test]
async fn health_reports_ok() {
    let app = offline_app();
    let resp = app.oneshot(empty_request("GET", "/health", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn user_routes_require_a_valid_bearer_token() {
    let app = offline_app();

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/interviews", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "missing_authorization");

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/interviews", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "invalid_token");

    let basic = Request::builder()
        .uri("/api/profile")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(basic).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "unsupported_scheme");
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let app = offline_app();
    let candidate = token(Uuid::new_v4(), Some("candidate"));
    let resp = app
        .oneshot(empty_request(
            "POST",
            "/api/admin/reservations/cleanup",
            Some(&candidate),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["error"], "forbidden");
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let app = offline_app();
    let resp = app
        .oneshot(empty_request("GET", "/api/does-not-exist", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn match_request_is_validated_before_lookup() {
    let app = offline_app();
    let bearer = token(Uuid::new_v4(), None);

    let out_of_range = json!({
        "experience_years": 99,
        "skill_categories": ["backend"],
        "specific_skills": ["rust"],
        "time_slot": "Tuesday, 20/10/2026 10:00-11:00",
        "target_role": "Backend Engineer"
    });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/matching", Some(&bearer), &out_of_range))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let wrong_weekday = json!({
        "experience_years": 4,
        "time_slot": "Monday, 20/10/2026 10:00-11:00",
        "target_role": "Backend Engineer"
    });
    let resp = app
        .oneshot(json_request("POST", "/api/matching", Some(&bearer), &wrong_weekday))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn reservations_in_the_past_are_rejected() {
    let app = offline_app();
    let bearer = token(Uuid::new_v4(), None);
    let body = json!({
        "interviewer_id": Uuid::new_v4(),
        "time_slot": past_slot(),
    });
    let resp = app
        .oneshot(json_request("POST", "/api/reservations", Some(&bearer), &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn coupon_preview_requires_a_code() {
    let app = offline_app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/coupons/validate",
            None,
            &json!({ "code": "", "plan_type": "pro" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_ping_is_acknowledged() {
    let app = offline_app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/webhooks/payment",
            None,
            &json!({ "test": true }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Webhook endpoint reachable");
}

#[tokio::test]
async fn manual_webhook_requires_shared_secret() {
    let app = offline_app();
    let body = json!({ "order_id": "ORDER_x", "payment_status": "SUCCESS" });

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/webhooks/payment", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payment")
        .header("content-type", "application/json")
        .header(SECRET_HEADER, "not-the-secret")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(wrong).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn provider_events_need_a_valid_signature() {
    let app = offline_app();
    let raw = json!({
        "type": "REFUND_STATUS_WEBHOOK",
        "event_time": "2026-10-17T10:00:00+05:30",
        "data": { "order": { "order_id": "ORDER_x" } }
    })
    .to_string();

    let unsigned = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payment")
        .header("content-type", "application/json")
        .body(Body::from(raw.clone()))
        .unwrap();
    let resp = app.clone().oneshot(unsigned).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let timestamp = "1760695200";
    let signature = sign(PAYMENT_SECRET, timestamp, raw.as_bytes()).unwrap();
    let signed = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payment")
        .header("content-type", "application/json")
        .header(TIMESTAMP_HEADER, timestamp)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(raw))
        .unwrap();
    let resp = app.oneshot(signed).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Event REFUND_STATUS_WEBHOOK ignored");
}
