/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Create an account and sign in
/// - `POST /v1/auth/login` - Sign in with email and password
/// - `POST /v1/auth/refresh` - Refresh access token
/// - `GET  /v1/auth/session` - Current session profile (authenticated)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use assignpay_shared::{
    auth::{
        identity::{SessionTokens, SignUpProfile},
        middleware::AuthContext,
        session::Session,
    },
    models::user::UserType,
    submission::notify::Route,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (strength checked by the identity provider)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Display name, pre-filled as the submitter name later
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub full_name: Option<String>,

    /// Account type (default: user)
    #[serde(default)]
    pub user_type: UserType,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Signup / login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token (1h), refresh token (30d) and the session they carry
    #[serde(flatten)]
    pub tokens: SessionTokens,

    /// Route the client should open next
    pub next: Route,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (1h)
    pub access_token: String,
}

/// Create an account
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signup
/// Content-Type: application/json
///
/// {
///   "email": "student@example.com",
///   "password": "essay-deadline-2025",
///   "full_name": "Ada Lovelace"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ...",
///   "session": { "user_id": "uuid", "email": "...", "full_name": "Ada Lovelace", "user_type": "user" },
///   "next": "/assignment-submission"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed (including weak passwords)
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let full_name = req
        .full_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let tokens = state
        .identity
        .sign_up(
            &req.email,
            &req.password,
            SignUpProfile {
                full_name,
                user_type: req.user_type,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            tokens,
            next: Route::AssignmentSubmission,
        }),
    ))
}

/// Sign in with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let tokens = state
        .identity
        .sign_in_with_password(&req.email, &req.password)
        .await?;

    Ok(Json(AuthResponse {
        tokens,
        next: Route::AssignmentSubmission,
    }))
}

/// Exchange a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or the account is gone
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = state.identity.refresh(&req.refresh_token).await?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Current session profile, re-read from the account store
pub async fn session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Session>> {
    state
        .identity
        .get_session(&auth.token)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::Unauthorized("Session no longer valid".to_string()))
}
