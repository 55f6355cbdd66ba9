//! In-memory store for the platform's cookie-based credentials.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use reqwest::blocking::Response;

use crate::util::is_loopback_host;

/// Cookie carrying the short-lived request credential.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Cookie carrying the longer-lived credential used to mint new access tokens.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// A named cookie together with its storage scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    /// Explicit domain attribute. `None` for loopback hosts, which reject
    /// domain-scoped cookies.
    pub domain: Option<String>,
    pub path: String,
}

#[derive(Debug, Default)]
struct SessionState {
    cookies: BTreeMap<String, SessionCookie>,
    api_key: Option<String>,
}

/// Credential-bearing container shared by every client and resource.
///
/// Mutations (login, refresh, clear) are last-writer-wins. The lock exists
/// for data-structure integrity when a host application shares one session
/// across worker threads, not to serialize refreshes against in-flight
/// requests.
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a cookie scoped to `host`: loopback hosts get no domain
    /// attribute, every other host gets an explicit one. Path is always `/`.
    pub fn set_cookie(&self, name: &str, value: &str, host: &str) {
        let domain = if is_loopback_host(host) {
            None
        } else {
            Some(host.to_string())
        };
        let cookie = SessionCookie {
            name: name.to_string(),
            value: value.to_string(),
            domain,
            path: "/".to_string(),
        };
        self.write().cookies.insert(name.to_string(), cookie);
    }

    pub fn cookie(&self, name: &str) -> Option<SessionCookie> {
        self.read().cookies.get(name).cloned()
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.read().cookies.contains_key(name)
    }

    /// Removes every cookie. The stored API key is not a transmitted
    /// credential and is left in place.
    pub fn clear(&self) {
        self.write().cookies.clear();
    }

    /// Builds the `Cookie` request header for this session, or `None` when
    /// no cookies are stored.
    pub fn cookie_header(&self) -> Option<String> {
        let state = self.read();
        if state.cookies.is_empty() {
            return None;
        }
        let header = state
            .cookies
            .values()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }

    /// API key issued to the user (`api_access_token`), recorded at login.
    /// Never attached to outgoing requests.
    pub fn api_key(&self) -> Option<String> {
        self.read().api_key.clone()
    }

    pub(crate) fn set_api_key(&self, key: &str) {
        self.write().api_key = Some(key.to_string());
    }
}

/// Copies the token cookies out of `response` into the session under the
/// scoping policy for `host`. Other response cookies are ignored.
pub(crate) fn store_token_cookies(session: &Session, host: &str, response: &Response) {
    for cookie in response.cookies() {
        if cookie.name() == ACCESS_TOKEN_COOKIE || cookie.name() == REFRESH_TOKEN_COOKIE {
            session.set_cookie(cookie.name(), cookie.value(), host);
        }
    }
}
