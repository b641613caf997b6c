//! Error types for the user store

use thiserror::Error;

/// Unique column that rejected an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Username,
    Email,
}

impl DuplicateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateField::Username => "username",
            DuplicateField::Email => "email",
        }
    }

    /// Map a unique constraint name from the `users` table to its column
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        match constraint {
            "users_username_key" => Some(DuplicateField::Username),
            "users_email_key" => Some(DuplicateField::Email),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate {}", .0.as_str())]
    Duplicate(DuplicateField),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Unique violations on `users` become [`StoreError::Duplicate`]; everything
/// else is a connectivity or query fault.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // PostgreSQL unique violation
            if db_err.code().as_deref() == Some("23505") {
                if let Some(field) = db_err.constraint().and_then(DuplicateField::from_constraint) {
                    return StoreError::Duplicate(field);
                }
            }
        }
        StoreError::Database(err)
    }
}
