use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::services::webhook_service::{SECRET_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Browser clients call from any origin; credentials travel as bearer tokens.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(SECRET_HEADER),
            header::HeaderName::from_static(SIGNATURE_HEADER),
            header::HeaderName::from_static(TIMESTAMP_HEADER),
        ])
        .allow_origin(Any)
}
