//! Server-side session tracking
//!
//! A session token handed to the client has the form `<raw>.<signature>`:
//! `raw` is 32 random bytes hex-encoded, `signature` is HMAC-SHA256 of `raw`
//! keyed by the configured session secret. The server keeps only the SHA-256
//! of `raw`, so a leaked session table cannot be replayed as cookies.

use std::collections::HashMap;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use petly_shared::{StoreError, User, UserId};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use crate::store::UserStore;

type HmacSha256 = Hmac<Sha256>;

/// Longest session lifetime a manager accepts (one year)
pub const MAX_SESSION_TTL: Duration = Duration::hours(24 * 365);

/// Opaque bearer credential identifying an authenticated session
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw_parts(raw: &str, signature: &str) -> Self {
        Self(format!("{}.{}", raw, signature))
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

#[derive(Debug, Clone)]
struct SessionRecord {
    user_id: UserId,
    expires_at: OffsetDateTime,
}

/// Issues, resolves and ends sessions.
///
/// Cloning is cheap; all clones share the same session table.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    signer: HmacSha256,
    ttl: Duration,
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl SessionManager {
    /// Create a session manager signing tokens with `secret`
    pub fn new(
        users: Arc<dyn UserStore>,
        secret: &str,
        ttl: Duration,
    ) -> Result<Self, SessionError> {
        if ttl > MAX_SESSION_TTL {
            return Err(SessionError::InvalidTtl);
        }

        let signer = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SessionError::InvalidSecret)?;

        Ok(Self {
            users,
            signer,
            ttl,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for a verified user
    pub async fn start_session(&self, user: &User) -> SessionToken {
        let raw = Self::generate_raw_token();
        let key = Self::hash_token(&raw);
        let expires_at = OffsetDateTime::now_utc().saturating_add(self.ttl);

        tracing::info!(
            user_id = %user.id,
            session_id = %&key[..12],
            expires_at = %expires_at,
            "Session started"
        );

        self.sessions.write().await.insert(
            key,
            SessionRecord {
                user_id: user.id,
                expires_at,
            },
        );

        SessionToken(format!("{}.{}", raw, self.sign(&raw)))
    }

    /// Resolve a token to its user.
    ///
    /// Missing, malformed, forged, expired and ended tokens all resolve to
    /// `None`. Only a store fault is an error.
    pub async fn current_user(&self, token: &str) -> Result<Option<User>, StoreError> {
        let Some(key) = self.verified_key(token) else {
            return Ok(None);
        };

        let user_id = {
            let sessions = self.sessions.read().await;
            match sessions.get(&key) {
                Some(record) if record.expires_at > OffsetDateTime::now_utc() => record.user_id,
                _ => return Ok(None),
            }
        };

        self.users.find_by_id(user_id).await
    }

    /// End a session; ending an unknown or already ended token is a no-op
    pub async fn end_session(&self, token: &str) {
        let Some(key) = self.verified_key(token) else {
            return;
        };

        if let Some(record) = self.sessions.write().await.remove(&key) {
            tracing::info!(
                user_id = %record.user_id,
                session_id = %&key[..12],
                "Session ended"
            );
        }
    }

    /// Drop expired sessions, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.expires_at > now);
        let purged = before - sessions.len();

        if purged > 0 {
            tracing::info!(count = purged, "Purged expired sessions");
        }

        purged
    }

    /// Number of sessions that have not expired
    pub async fn active_sessions(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        self.sessions
            .read()
            .await
            .values()
            .filter(|record| record.expires_at > now)
            .count()
    }

    /// Check the signature and return the session table key
    fn verified_key(&self, token: &str) -> Option<String> {
        let (raw, signature) = token.split_once('.')?;
        if raw.len() != 64 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let signature = hex::decode(signature).ok()?;
        let mut mac = self.signer.clone();
        mac.update(raw.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(Self::hash_token(raw))
    }

    fn sign(&self, raw: &str) -> String {
        let mut mac = self.signer.clone();
        mac.update(raw.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// 32 bytes from the OS CSPRNG, hex-encoded (64 characters)
    fn generate_raw_token() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn hash_token(raw: &str) -> String {
        hex::encode(Sha256::digest(raw.as_bytes()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session secret cannot be used as an HMAC key")]
    InvalidSecret,
    #[error("Session lifetime exceeds one year")]
    InvalidTtl,
}
