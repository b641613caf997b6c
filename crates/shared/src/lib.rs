//! Petly Shared Types and Utilities
//!
//! This crate contains the user entity, storage errors, and database helpers
//! shared by the Petly services.

pub mod db;
pub mod error;
pub mod types;

pub use db::*;
pub use error::*;
pub use types::*;
