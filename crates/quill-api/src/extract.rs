//! Request extractors.
//!
//! [`AuthUser`] is the authenticated-caller extractor: any handler that takes
//! it as an argument rejects requests without a valid bearer token before the
//! handler body runs.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use uuid::Uuid;

use quill_auth::bearer_token;

use crate::{ApiError, AppState};

/// Authenticated caller identity, decoded from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

        let token = bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".to_string()))?;

        let claims = state.keys.verify(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/notes/my-notes");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let state = test_support::lazy_state();
        let mut parts = parts_with_auth(None);

        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_unauthorized() {
        let state = test_support::lazy_state();
        let mut parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));

        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let state = test_support::lazy_state();
        let mut parts = parts_with_auth(Some("Bearer not.a.jwt"));

        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_valid_token_yields_identity() {
        let state = test_support::lazy_state();
        let user_id = Uuid::new_v4();
        let token = state.keys.sign(user_id, "reader@example.com").unwrap();
        let mut parts = parts_with_auth(Some(&format!("Bearer {}", token)));

        let user = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "reader@example.com");
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let state = test_support::lazy_state();
        let other = quill_auth::JwtKeys::new("a-different-secret", chrono::Duration::hours(1));
        let token = other.sign(Uuid::new_v4(), "evil@example.com").unwrap();
        let mut parts = parts_with_auth(Some(&format!("Bearer {}", token)));

        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
