//! Account registration, login, and token verification handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use quill_auth::{hash_password, verify_password};
use quill_core::{
    defaults, is_valid_email, CreateUserRequest, ServerEvent, UserProfile, UserRepository, UserRole,
};

use crate::{ApiError, AppState};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Request body for creating an account.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Self-selected display role; defaults to "other" when omitted.
    pub role: Option<String>,
}

/// Request body for logging in.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session token plus the owning profile, returned on login.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Request body for verifying a session token.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub token: String,
}

/// Token introspection result. `valid: false` still answers 200; the endpoint
/// reports on the token rather than gating on it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Register a new account.
///
/// Validates the email shape, password length, and name presence, hashes the
/// password, and stores the user. The plaintext password never leaves this
/// function.
///
/// # Returns
/// - 201 Created with the public profile
/// - 400 Bad Request if validation fails
/// - 409 Conflict if the email is already registered (case-insensitive)
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserProfile),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let email = req.email.trim();
    if !is_valid_email(email) {
        return Err(ApiError::BadRequest("invalid email address".to_string()));
    }
    if req.password.chars().count() < defaults::PASSWORD_MIN_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            defaults::PASSWORD_MIN_LENGTH
        )));
    }
    let first_name = req.first_name.trim();
    let last_name = req.last_name.trim();
    if first_name.is_empty() {
        return Err(ApiError::BadRequest("first name is required".to_string()));
    }
    if last_name.is_empty() {
        return Err(ApiError::BadRequest("last name is required".to_string()));
    }
    let role = match req.role.as_deref() {
        None => UserRole::default(),
        Some(r) => UserRole::parse(r)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown role '{}'", r)))?,
    };

    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .users
        .insert(CreateUserRequest {
            email: email.to_string(),
            password_hash,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role,
        })
        .await?;

    state.event_bus.emit(ServerEvent::UserRegistered {
        user_id: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
    });

    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// Log in with email and password.
///
/// Unknown email and wrong password return the same message so the endpoint
/// does not reveal which addresses have accounts.
///
/// # Returns
/// - 200 OK with a session token and the public profile
/// - 401 Unauthorized on bad credentials
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Bad credentials"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .db
        .users
        .get_by_email(req.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    let token = state.keys.sign(user.id, &user.email)?;

    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}

/// Introspect a session token.
///
/// Other services (the gateway, the frontend) use this to check a token
/// without holding the signing secret. Invalid or expired tokens answer 200
/// with `valid: false`.
#[utoipa::path(
    post,
    path = "/api/auth/verify",
    tag = "Auth",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Introspection result", body = VerifyResponse),
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    match state.keys.verify(&req.token) {
        Ok(claims) => Json(VerifyResponse {
            valid: true,
            user_id: Some(claims.sub),
            email: Some(claims.email),
        }),
        Err(_) => Json(VerifyResponse {
            valid: false,
            user_id: None,
            email: None,
        }),
    }
}
