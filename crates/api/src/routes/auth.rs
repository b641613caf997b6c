//! Authentication routes

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use petly_shared::{User, UserProfile};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{flow, AuthUser, RegistrationInput, SessionToken},
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Missing fields deserialize as empty so validation can itemize them
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Availability query; `username` and `email` keys are accepted as aliases
#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityRequest {
    #[serde(default, alias = "username", alias = "email")]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct CheckAvailabilityResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new user and log them in
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = body?;
    let current = state.cookie.read(&headers);
    let input = RegistrationInput {
        username: &req.username,
        email: &req.email,
        password: &req.password,
        confirm_password: &req.confirm_password,
    };

    let (user, token) = flow::register(&state, input, current.as_deref()).await?;

    session_response(&state, StatusCode::CREATED, user, &token)
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = body?;
    let current = state.cookie.read(&headers);

    let (user, token) =
        flow::login(&state, &req.email, &req.password, current.as_deref()).await?;

    session_response(&state, StatusCode::OK, user, &token)
}

/// End the caller's session and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Response> {
    flow::logout(&state, Some(&auth_user.session_token)).await;

    let cookie = state.cookie.clear().map_err(|_| ApiError::Internal)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
        .into_response())
}

/// Report whether a username or email is taken (no authentication required)
///
/// Serves both `/api/check_username` and `/api/check_email`; the value is
/// matched against usernames and emails alike.
pub async fn check_availability(
    State(state): State<AppState>,
    body: Result<Json<CheckAvailabilityRequest>, JsonRejection>,
) -> ApiResult<Json<CheckAvailabilityResponse>> {
    let Json(req) = body?;
    let exists = if req.value.trim().is_empty() {
        false
    } else {
        state.users.exists(&req.value).await?
    };

    Ok(Json(CheckAvailabilityResponse { exists }))
}

// =============================================================================
// Helpers
// =============================================================================

fn session_response(
    state: &AppState,
    status: StatusCode,
    user: User,
    token: &SessionToken,
) -> ApiResult<Response> {
    let cookie = state.cookie.issue(token).map_err(|_| ApiError::Internal)?;

    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user: user.into(),
            expires_in: state.sessions.ttl().whole_seconds(),
        }),
    )
        .into_response())
}
