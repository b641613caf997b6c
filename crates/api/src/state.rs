//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    auth::{
        cookie::is_valid_cookie_name, generate_impossible_hash, PasswordError, SessionCookie,
        SessionError, SessionManager,
    },
    config::Config,
    store::UserStore,
};

/// Everything a request handler needs, built once at startup and handed to
/// the router.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionManager,
    pub cookie: SessionCookie,
    /// Digest verified against when a login names an unknown email
    pub(crate) dummy_hash: Arc<str>,
}

impl AppState {
    pub fn new(config: Config, users: Arc<dyn UserStore>) -> Result<Self, StateError> {
        if !is_valid_cookie_name(&config.session_cookie_name) {
            return Err(StateError::CookieName(config.session_cookie_name));
        }

        let sessions =
            SessionManager::new(users.clone(), &config.session_secret, config.session_ttl())?;
        let cookie = SessionCookie::new(
            config.session_cookie_name.clone(),
            config.session_cookie_secure,
            config.session_ttl(),
        );
        let dummy_hash = generate_impossible_hash()?;

        Ok(Self {
            config: Arc::new(config),
            users,
            sessions,
            cookie,
            dummy_hash: dummy_hash.into(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("Invalid session cookie name: {0:?}")]
    CookieName(String),
}
