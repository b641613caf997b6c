//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Shortest password accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Longest password accepted at registration
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password using Argon2id
///
/// The PHC string embeds the algorithm tag, parameters and a fresh random
/// salt, so hashing the same password twice yields two different digests.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Verify a password against a stored digest
///
/// Malformed digests are a verification failure, not an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password digest is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a valid digest whose password is unknowable
///
/// Used to burn the same verification time on logins for unknown emails.
pub fn generate_impossible_hash() -> Result<String, PasswordError> {
    use argon2::password_hash::rand_core::RngCore;

    let mut random_bytes = [0u8; 64];
    OsRng.fill_bytes(&mut random_bytes);

    hash_password(&hex::encode(random_bytes))
}

/// Run [`hash_password`] on the blocking thread pool
pub async fn spawn_hash_password(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::Hashing(e.to_string()))?
}

/// Run [`verify_password`] on the blocking thread pool
pub async fn spawn_verify_password(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await {
        Ok(verified) => verified,
        Err(e) => {
            tracing::error!(error = %e, "Password verification task failed");
            false
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
