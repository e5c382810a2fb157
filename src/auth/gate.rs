//! Request authorization gate.
//!
//! Middleware that extracts and verifies the bearer token, then attaches
//! the resolved identity to the request. Unauthenticated or malformed
//! requests are rejected with 401 before the handler runs. The gate is a
//! per-request decision and holds no state across requests.

use crate::{api::error::ApiError, auth::token::TokenKeys};
use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated user context derived from a verified bearer token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

pub async fn require_bearer(
    Extension(keys): Extension<Arc<TokenKeys>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(request.headers()) else {
        return ApiError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    let Some(claims) = keys.verify(&token) else {
        return ApiError::Unauthorized("Invalid or expired token".to_string()).into_response();
    };

    request.extensions_mut().insert(Principal {
        user_id: claims.sub,
        email: claims.email,
    });

    next.run(request).await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Json, Router};
    use secrecy::SecretString;
    use serde_json::json;
    use tower::ServiceExt;

    async fn whoami(Extension(principal): Extension<Principal>) -> Json<serde_json::Value> {
        Json(json!({ "email": principal.email }))
    }

    fn app(keys: Arc<TokenKeys>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn(require_bearer))
            .layer(Extension(keys))
    }

    fn keys() -> Arc<TokenKeys> {
        Arc::new(TokenKeys::new(&SecretString::from("gate-secret".to_string())))
    }

    #[tokio::test]
    async fn missing_header_rejected_before_handler() {
        let response = app(keys())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_scheme_rejected() {
        let response = app(keys())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_rejected() {
        let response = app(keys())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_principal() {
        let keys = keys();
        let token = keys.issue(Uuid::new_v4(), "ali@x.com").unwrap();

        let response = app(keys)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["email"], "ali@x.com");
    }

    #[test]
    fn extract_bearer_token_variants() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "bearer abc".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, "Token abc".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_none());
    }
}
