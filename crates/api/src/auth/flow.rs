//! Registration, login and logout
//!
//! Handlers in `routes::auth` are thin wrappers around these functions.

use petly_shared::{NewUser, StoreError, User};

use super::{
    password::{spawn_hash_password, spawn_verify_password},
    sessions::SessionToken,
    validation::{validate_registration, RegistrationInput},
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Validate, create the account and start its first session.
///
/// `current_token` is the caller's existing session, if any; it is ended so
/// the caller holds exactly one session afterwards.
pub async fn register(
    state: &AppState,
    input: RegistrationInput<'_>,
    current_token: Option<&str>,
) -> ApiResult<(User, SessionToken)> {
    if !state.config.enable_signup {
        return Err(ApiError::BadRequest(
            "Registration is currently disabled".to_string(),
        ));
    }

    validate_registration(&input).map_err(ApiError::Validation)?;

    let password_hash = spawn_hash_password(input.password.to_string())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "register: Password hashing failed");
            ApiError::Internal
        })?;

    let user = state
        .users
        .create(NewUser::new(input.username, input.email, password_hash))
        .await
        .map_err(|e| {
            if let StoreError::Duplicate(field) = &e {
                tracing::info!(field = field.as_str(), "register: Identity already taken");
            }
            ApiError::from(e)
        })?;

    if let Some(previous) = current_token {
        state.sessions.end_session(previous).await;
    }
    let token = state.sessions.start_session(&user).await;

    tracing::info!(user_id = %user.id, "register: Account created");

    Ok((user, token))
}

/// Verify credentials and start a session.
///
/// An unknown email and a wrong password produce the same
/// [`ApiError::InvalidCredentials`], after the same amount of hashing work.
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
    current_token: Option<&str>,
) -> ApiResult<(User, SessionToken)> {
    let user = state.users.find_by_email(email).await?;

    let verified = match &user {
        Some(user) => {
            spawn_verify_password(password.to_string(), user.password_hash.clone()).await
        }
        None => {
            spawn_verify_password(password.to_string(), state.dummy_hash.to_string()).await;
            false
        }
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::warn!("login: Invalid credentials");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if let Some(previous) = current_token {
        state.sessions.end_session(previous).await;
    }
    let token = state.sessions.start_session(&user).await;

    tracing::info!(user_id = %user.id, "login: Login successful");

    Ok((user, token))
}

/// End the caller's session; a no-op when there is none
pub async fn logout(state: &AppState, current_token: Option<&str>) {
    if let Some(token) = current_token {
        state.sessions.end_session(token).await;
    }
}
