//! Profile route

use axum::{extract::Extension, Json};
use petly_shared::UserProfile;

use crate::auth::AuthUser;

/// The authenticated user's own record
pub async fn profile(Extension(auth_user): Extension<AuthUser>) -> Json<UserProfile> {
    Json(auth_user.user.into())
}
