//! Admin dashboard routes
//!
//! Mounted behind the `require_admin` middleware.

use axum::{
    extract::{Extension, State},
    Json,
};
use petly_shared::UserProfile;
use serde::Serialize;

use crate::{auth::AuthUser, error::ApiResult, state::AppState};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub users: Vec<UserProfile>,
    pub total: usize,
}

/// Every registered user, without password digests
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<DashboardResponse>> {
    let users: Vec<UserProfile> = state
        .users
        .list_all()
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();

    tracing::info!(
        admin_id = %auth_user.user.id,
        total = users.len(),
        "Admin dashboard viewed"
    );

    Ok(Json(DashboardResponse {
        total: users.len(),
        users,
    }))
}
