//! Authentication module for Petly

pub mod cookie;
pub mod flow;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod sessions;
pub mod validation;

pub use cookie::SessionCookie;
pub use guard::{require_admin, require_authenticated};
pub use middleware::AuthUser;
pub use password::{
    generate_impossible_hash, hash_password, spawn_hash_password, spawn_verify_password,
    verify_password, PasswordError,
};
pub use sessions::{SessionError, SessionManager, SessionToken};
pub use validation::{validate_registration, FieldErrors, RegistrationInput};
