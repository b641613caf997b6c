//! Route guards as axum middleware
//!
//! Layer these with `middleware::from_fn_with_state`. On success the resolved
//! user is stored in the request extensions as [`AuthUser`].

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use petly_shared::User;

use super::guard;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// The authenticated caller of a protected route
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub session_token: String,
}

/// Reject requests without a valid session
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(token) = state.cookie.read(req.headers()) else {
        tracing::debug!("No session cookie provided");
        return Err(ApiError::Unauthorized);
    };

    let user = guard::require_authenticated(&state.sessions, Some(&token)).await?;
    req.extensions_mut().insert(AuthUser {
        user,
        session_token: token,
    });

    Ok(next.run(req).await)
}

/// Reject requests without a valid session belonging to an admin
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(token) = state.cookie.read(req.headers()) else {
        tracing::debug!("No session cookie provided");
        return Err(ApiError::Unauthorized);
    };

    let user = guard::require_admin(&state.sessions, Some(&token)).await?;
    req.extensions_mut().insert(AuthUser {
        user,
        session_token: token,
    });

    Ok(next.run(req).await)
}
