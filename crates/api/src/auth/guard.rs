//! Access policy checks
//!
//! Guards only read session and user state. They never write to the store.

use petly_shared::User;

use super::sessions::SessionManager;
use crate::error::{ApiError, ApiResult};

/// Resolve the session to its user or fail with [`ApiError::Unauthorized`]
pub async fn require_authenticated(
    sessions: &SessionManager,
    session_token: Option<&str>,
) -> ApiResult<User> {
    let Some(token) = session_token else {
        return Err(ApiError::Unauthorized);
    };

    sessions
        .current_user(token)
        .await?
        .ok_or(ApiError::Unauthorized)
}

/// Like [`require_authenticated`], then fail with [`ApiError::Forbidden`]
/// unless the user holds the admin role
pub async fn require_admin(
    sessions: &SessionManager,
    session_token: Option<&str>,
) -> ApiResult<User> {
    let user = require_authenticated(sessions, session_token).await?;

    if !user.is_admin {
        tracing::warn!(user_id = %user.id, "Admin access denied");
        return Err(ApiError::Forbidden);
    }

    Ok(user)
}
