//! Authenticated request execution with bounded refresh-and-retry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::session::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, Session, store_token_cookies};
use crate::util::{DEFAULT_TIMEOUT, build_http, host_of, urljoin};

const REFRESH_ENDPOINT: &str = "/api/v1/auth/refresh-token";

/// Connection options for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout.
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verify: true,
        }
    }
}

/// Executes authenticated GET requests against the platform API.
///
/// Clone is cheap: the HTTP client pools connections behind an `Arc` and the
/// session is shared, so every resource in a hierarchy carries its own
/// handle.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    host: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Creates a client over an authenticated session.
    ///
    /// Fails with [`Error::Config`], before any network activity, when the
    /// session has no `access_token` cookie.
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self> {
        Self::with_options(base_url, session, ClientOptions::default())
    }

    pub fn with_options(
        base_url: &str,
        session: Arc<Session>,
        options: ClientOptions,
    ) -> Result<Self> {
        if !session.has_cookie(ACCESS_TOKEN_COOKIE) {
            return Err(Error::Config(
                "session is missing an access token, sign in first".to_string(),
            ));
        }

        let base_url = base_url.trim_end_matches('/').to_string();
        let host = host_of(&base_url)?;
        let http = build_http(options.timeout, options.verify)?;

        Ok(Self {
            http,
            base_url,
            host,
            session,
        })
    }

    /// The session backing this client.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Mints a new access token from the stored refresh token.
    ///
    /// Returns `false` when the session has no refresh token or the refresh
    /// request fails for any reason; failures are logged and swallowed so
    /// the caller decides the next step.
    pub fn refresh_access_token(&self) -> bool {
        if !self.session.has_cookie(REFRESH_TOKEN_COOKIE) {
            return false;
        }

        let url = urljoin(&self.base_url, REFRESH_ENDPOINT);
        let mut request = self.http.post(&url);
        if let Some(cookies) = self.session.cookie_header() {
            request = request.header(header::COOKIE, cookies);
        }

        match request.send() {
            Ok(response) if response.status() == StatusCode::OK => {
                store_token_cookies(&self.session, &self.host, &response);
                debug!("access token refreshed");
                true
            }
            Ok(response) => {
                debug!(status = %response.status(), "token refresh rejected");
                false
            }
            Err(err) => {
                warn!(error = %err, "token refresh request failed");
                false
            }
        }
    }

    /// Performs an authenticated GET and returns the parsed JSON body.
    ///
    /// On a 401 (outside the refresh endpoint itself) the client refreshes
    /// the access token at most once and retries the request at most once;
    /// an unrecoverable 401 clears the session cookies and yields
    /// [`Error::SessionExpired`]. No schema validation happens here; typing
    /// is the resource layer's job.
    pub fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
        let mut response = self.send_get(endpoint, query)?;

        if response.status() == StatusCode::UNAUTHORIZED && endpoint != REFRESH_ENDPOINT {
            if self.refresh_access_token() {
                response = self.send_get(endpoint, query)?;
            } else {
                self.session.clear();
                return Err(Error::SessionExpired);
            }
        }

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status,
                endpoint: endpoint.to_string(),
            });
        }

        let text = response.text()?;
        serde_json::from_str(&text).map_err(|source| Error::Json {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    fn send_get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = urljoin(&self.base_url, endpoint);
        let mut request = self.http.get(&url);
        if let Some(cookies) = self.session.cookie_header() {
            request = request.header(header::COOKIE, cookies);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send()?;
        debug!(endpoint, status = %response.status(), "GET completed");
        Ok(response)
    }
}
