//! Registration input validation
//!
//! Every rule is checked so the caller receives the full list of problems in
//! one response. Nothing here touches the user store.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Longest accepted username (matches the `users.username` column)
pub const MAX_USERNAME_LENGTH: usize = 50;
/// Longest accepted email (matches the `users.email` column)
pub const MAX_EMAIL_LENGTH: usize = 120;

/// Field name to list of problems with that field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single problem with a single field
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{} {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Registration fields exactly as submitted
#[derive(Debug, Clone, Copy)]
pub struct RegistrationInput<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Validate a registration form, returning every violated rule
pub fn validate_registration(input: &RegistrationInput<'_>) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = input.username.trim();
    if username.is_empty() {
        errors.add("username", "is required");
    } else if username.chars().count() > MAX_USERNAME_LENGTH {
        errors.add(
            "username",
            format!("must be at most {} characters", MAX_USERNAME_LENGTH),
        );
    }

    let email = input.email.trim();
    if email.is_empty() {
        errors.add("email", "is required");
    } else if email.len() > MAX_EMAIL_LENGTH {
        errors.add(
            "email",
            format!("must be at most {} characters", MAX_EMAIL_LENGTH),
        );
    } else if !is_valid_email(email) {
        errors.add("email", "is not a valid email address");
    }

    let password_length = input.password.chars().count();
    if input.password.is_empty() {
        errors.add("password", "is required");
    } else if password_length < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
    } else if password_length > MAX_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("must be at most {} characters", MAX_PASSWORD_LENGTH),
        );
    }

    if input.confirm_password.is_empty() {
        errors.add("confirm_password", "is required");
    } else if input.confirm_password != input.password {
        errors.add("confirm_password", "does not match password");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates email address according to RFC 5322 (simplified)
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    // No leading/trailing/consecutive dots
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_alphanumeric() || ".+-_".contains(c))
    {
        return false;
    }

    if domain.starts_with('-') || domain.ends_with('-') {
        return false;
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return false;
    }
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }

    // Must have a TLD of at least 2 letters
    match domain.rsplit_once('.') {
        Some((_, tld)) => tld.len() >= 2 && tld.chars().all(|c| c.is_alphabetic()),
        None => false,
    }
}
