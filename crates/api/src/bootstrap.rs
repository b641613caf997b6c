//! One-time administrator seeding
//!
//! Runs at startup. Creates the configured administrator only when the store
//! holds no admin at all, so restarting with the same configuration is safe.

use petly_shared::{NewUser, StoreError, UserId};

use crate::{
    auth::{
        spawn_hash_password, validate_registration, FieldErrors, PasswordError, RegistrationInput,
    },
    config::BootstrapAdmin,
    store::UserStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No bootstrap credentials configured
    Skipped,
    /// At least one admin already exists
    AlreadyPresent,
    Created(UserId),
}

/// Create the configured administrator if no admin exists yet
pub async fn ensure_admin(
    users: &dyn UserStore,
    admin: Option<&BootstrapAdmin>,
) -> Result<BootstrapOutcome, BootstrapError> {
    let Some(admin) = admin else {
        tracing::info!("bootstrap: No administrator configured, skipping");
        return Ok(BootstrapOutcome::Skipped);
    };

    if users.count_admins().await? > 0 {
        tracing::info!("bootstrap: Administrator already present");
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    validate_registration(&RegistrationInput {
        username: &admin.username,
        email: &admin.email,
        password: &admin.password,
        confirm_password: &admin.password,
    })
    .map_err(BootstrapError::Invalid)?;

    let password_hash = spawn_hash_password(admin.password.clone()).await?;
    let new_admin = NewUser::new(&admin.username, &admin.email, password_hash).admin();

    match users.create(new_admin).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "bootstrap: Administrator created");
            Ok(BootstrapOutcome::Created(user.id))
        }
        // Another instance won the race
        Err(StoreError::Duplicate(field)) if users.count_admins().await? > 0 => {
            tracing::info!(field = field.as_str(), "bootstrap: Administrator created concurrently");
            Ok(BootstrapOutcome::AlreadyPresent)
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Invalid bootstrap administrator: {0}")]
    Invalid(FieldErrors),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("Bootstrap administrator could not be stored: {0}")]
    Store(#[from] StoreError),
}
