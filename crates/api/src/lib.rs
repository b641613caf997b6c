//! Petly API Library
//!
//! Account registration, session login and the admin dashboard.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod security;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
