//! Session cookie encoding

use axum::http::{header, HeaderMap, HeaderValue};

use super::sessions::SessionToken;

/// How the session token travels to and from the browser
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
    max_age_seconds: i64,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool, max_age: time::Duration) -> Self {
        Self {
            name: name.into(),
            secure,
            max_age_seconds: max_age.whole_seconds(),
        }
    }

    /// `Set-Cookie` value that installs the session token
    pub fn issue(&self, token: &SessionToken) -> Result<HeaderValue, header::InvalidHeaderValue> {
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
            self.name,
            token.as_str(),
            self.max_age_seconds,
            if self.secure { "; Secure" } else { "" }
        ))
    }

    /// `Set-Cookie` value that removes the session cookie
    pub fn clear(&self) -> Result<HeaderValue, header::InvalidHeaderValue> {
        HeaderValue::from_str(&format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
            self.name,
            if self.secure { "; Secure" } else { "" }
        ))
    }

    /// Pull the session token out of the request's `Cookie` headers
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Whether `name` is an RFC 6265 cookie-name token
pub fn is_valid_cookie_name(name: &str) -> bool {
    const SEPARATORS: &[u8] = b"()<>@,;:\\\"/[]?={} \t";

    !name.is_empty()
        && name
            .bytes()
            .all(|b| (0x21..0x7f).contains(&b) && !SEPARATORS.contains(&b))
}
