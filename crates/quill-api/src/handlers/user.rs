//! Profile and password management handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use quill_auth::{hash_password, verify_password};
use quill_core::{defaults, UserProfile, UserRepository, UserRole};

use crate::{ApiError, AppState, AuthUser};

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request body for updating profile fields. Omitted fields are untouched.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

/// Request body for changing the password. The current password must verify
/// before the new one is accepted.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Update the caller's profile fields.
///
/// # Returns
/// - 200 OK with the updated public profile
/// - 400 Bad Request on a blank name or unknown role
#[utoipa::path(
    put,
    path = "/api/user/update-profile",
    tag = "User",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let first_name = validate_name(req.first_name, "first name")?;
    let last_name = validate_name(req.last_name, "last name")?;
    let role = match req.role.as_deref() {
        None => None,
        Some(r) => Some(
            UserRole::parse(r)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown role '{}'", r)))?,
        ),
    };

    let updated = state
        .db
        .users
        .update_profile(
            user.user_id,
            quill_core::UpdateProfileRequest {
                first_name,
                last_name,
                role,
            },
        )
        .await?;

    Ok(Json(updated.profile()))
}

/// Change the caller's password.
///
/// # Returns
/// - 204 No Content on success
/// - 400 Bad Request when the new password is too short
/// - 401 Unauthorized when the current password does not verify
#[utoipa::path(
    put,
    path = "/api/user/change-password",
    tag = "User",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password incorrect"),
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if req.new_password.chars().count() < defaults::PASSWORD_MIN_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            defaults::PASSWORD_MIN_LENGTH
        )));
    }

    let account = state
        .db
        .users
        .get(user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", user.user_id)))?;

    if !verify_password(&req.current_password, &account.password_hash)? {
        return Err(ApiError::Unauthorized(
            "current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&req.new_password)?;
    state
        .db
        .users
        .update_password_hash(user.user_id, &new_hash)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn validate_name(value: Option<String>, label: &str) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(v) => {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Err(ApiError::BadRequest(format!("{} cannot be blank", label)));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_update_profile_rejects_blank_first_name() {
        let state = test_support::lazy_state();
        let err = update_profile(
            State(state),
            test_support::caller(),
            Json(UpdateProfileRequest {
                first_name: Some("  ".to_string()),
                last_name: None,
                role: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("first name")));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_unknown_role() {
        let state = test_support::lazy_state();
        let err = update_profile(
            State(state),
            test_support::caller(),
            Json(UpdateProfileRequest {
                first_name: None,
                last_name: None,
                role: Some("sorcerer".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("sorcerer")));
    }

    #[tokio::test]
    async fn test_change_password_rejects_short_replacement() {
        let state = test_support::lazy_state();
        let err = change_password(
            State(state),
            test_support::caller(),
            Json(ChangePasswordRequest {
                current_password: "old-password".to_string(),
                new_password: "ab".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("at least")));
    }

    #[test]
    fn test_validate_name_trims() {
        let out = validate_name(Some("  Ada  ".to_string()), "first name").unwrap();
        assert_eq!(out.as_deref(), Some("Ada"));
        assert_eq!(validate_name(None, "first name").unwrap(), None);
    }
}
