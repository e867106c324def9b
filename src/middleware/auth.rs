use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("Token subject is not a user id".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

/// Extracts the bearer token and decodes it with the configured HS256 secret.
fn authenticate(req: &Request, secret: &str) -> std::result::Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"));
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let claims = decode::<Claims>(
        token.trim(),
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid_token"))?;

    if Uuid::parse_str(&claims.sub).is_err() {
        return Err(reject(StatusCode::UNAUTHORIZED, "invalid_subject"));
    }
    Ok(claims)
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    let config = crate::config::get_config();
    match authenticate(&req, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(response) => response,
    }
}

pub async fn require_admin(mut req: Request, next: Next) -> Response {
    let config = crate::config::get_config();
    let claims = match authenticate(&req, &config.jwt_secret) {
        Ok(claims) => claims,
        Err(response) => return response,
    };
    if !claims.is_admin() {
        tracing::warn!(user = %claims.sub, "admin route rejected");
        return reject(StatusCode::FORBIDDEN, "forbidden");
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret";

    fn token(sub: &str, role: Option<&str>, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
            role: role.map(str::to_string),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn request(auth: Option<String>) -> Request {
        let mut builder = Request::builder().uri("/api/profile");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let id = Uuid::new_v4();
        let req = request(Some(format!("Bearer {}", token(&id.to_string(), Some("admin"), 600))));
        let claims = authenticate(&req, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), id);
        assert!(claims.is_admin());
    }

    #[test]
    fn rejects_missing_scheme_expired_and_foreign_tokens() {
        assert_eq!(
            authenticate(&request(None), SECRET).unwrap_err().status(),
            StatusCode::UNAUTHORIZED
        );
        let sub = Uuid::new_v4().to_string();
        let basic = request(Some(format!("Basic {}", token(&sub, None, 600))));
        assert!(authenticate(&basic, SECRET).is_err());

        let expired = request(Some(format!("Bearer {}", token(&sub, None, -3600))));
        assert!(authenticate(&expired, SECRET).is_err());

        let forged = request(Some(format!("Bearer {}", token(&sub, None, 600))));
        assert!(authenticate(&forged, "another-secret").is_err());

        let not_uuid = request(Some(format!("Bearer {}", token("user:42", None, 600))));
        assert!(authenticate(&not_uuid, SECRET).is_err());
    }

    #[test]
    fn non_admin_role_is_not_admin() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: 0,
            role: Some("interviewer".into()),
        };
        assert!(!claims.is_admin());
    }
}
