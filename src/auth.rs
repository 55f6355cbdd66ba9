//! Authentication against the platform's cookie-based token endpoints.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header;
use serde::Deserialize;
use tracing::debug;

use crate::config::{ClientConfig, load_config};
use crate::error::{Error, Result};
use crate::session::{ACCESS_TOKEN_COOKIE, Session, store_token_cookies};
use crate::util::{DEFAULT_TIMEOUT, build_http, host_of, urljoin};

const TOKEN_ENDPOINT: &str = "/api/v1/auth/access-token";
const CURRENT_USER_ENDPOINT: &str = "/api/v1/users/current";

/// Identity record returned by the current-user endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// API key issued to the user. Not used for request authentication.
    #[serde(default)]
    pub api_access_token: Option<String>,
}

/// Authenticates against a platform instance and produces sessions.
#[derive(Debug, Clone)]
pub struct Auth {
    base_url: String,
    host: String,
    credentials: Option<(String, String)>,
    http: HttpClient,
}

impl Auth {
    /// Creates an authenticator for an explicit base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig::for_url(base_url))
    }

    /// Creates an authenticator from the environment and/or a `.d2src` file.
    pub fn from_env() -> Result<Self> {
        Self::with_config(load_config(None, None)?)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = config.url.trim_end_matches('/').to_string();
        let host = host_of(&base_url)?;
        let http = build_http(DEFAULT_TIMEOUT, config.verify)?;
        let credentials = match (config.email, config.password) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };
        Ok(Self {
            base_url,
            host,
            credentials,
            http,
        })
    }

    /// Base URL this authenticator targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Logs in with form-encoded credentials and returns the populated
    /// session.
    ///
    /// Login is only complete once the follow-up current-user lookup
    /// succeeds; the returned session then carries the token cookies and,
    /// when the server provides one, the user's API key.
    pub fn login(&self, email: &str, password: &str) -> Result<Arc<Session>> {
        let url = urljoin(&self.base_url, TOKEN_ENDPOINT);
        let response = self
            .http
            .post(&url)
            .form(&[("username", email), ("password", password)])
            .send()?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let has_access = response
                    .cookies()
                    .any(|cookie| cookie.name() == ACCESS_TOKEN_COOKIE);
                if !has_access {
                    return Err(Error::Auth(
                        "login response did not set an access token cookie".to_string(),
                    ));
                }

                let session = Arc::new(Session::new());
                store_token_cookies(&session, &self.host, &response);
                debug!(host = %self.host, "token cookies stored");

                let user = self.complete_login(&session)?;
                if let Some(key) = user.api_access_token.as_deref() {
                    session.set_api_key(key);
                }
                Ok(session)
            }
            StatusCode::UNAUTHORIZED => Err(Error::Auth(
                "authentication failed, check your email and password".to_string(),
            )),
            _ => Err(Error::Auth(format!("login failed with status {status}"))),
        }
    }

    /// Logs in with the credentials resolved by the configuration layer
    /// (`D2S_EMAIL` / `D2S_PASSWORD` or `.d2src`).
    pub fn login_from_config(&self) -> Result<Arc<Session>> {
        let (email, password) = self.credentials.as_ref().ok_or_else(|| {
            Error::Config(
                "missing credentials: set D2S_EMAIL and D2S_PASSWORD or add email/password to .d2src"
                    .to_string(),
            )
        })?;
        self.login(email, password)
    }

    /// Fetches the user record for a logged-in session.
    ///
    /// Best-effort lookup: any non-200 response yields `Ok(None)`; only
    /// transport failures are errors.
    pub fn current_user(&self, session: &Session) -> Result<Option<User>> {
        let response = self.request_current_user(session)?;
        if response.status() != StatusCode::OK {
            debug!(status = %response.status(), "current-user lookup failed");
            return Ok(None);
        }
        Ok(Some(parse_user(response)?))
    }

    /// The user lookup login cannot succeed without.
    fn complete_login(&self, session: &Session) -> Result<User> {
        let response = self.request_current_user(session)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Auth(format!(
                "failed to fetch user information (HTTP {status})"
            )));
        }
        parse_user(response)
    }

    fn request_current_user(&self, session: &Session) -> Result<Response> {
        let url = urljoin(&self.base_url, CURRENT_USER_ENDPOINT);
        let mut request = self.http.get(&url);
        if let Some(cookies) = session.cookie_header() {
            request = request.header(header::COOKIE, cookies);
        }
        Ok(request.send()?)
    }
}

fn parse_user(response: Response) -> Result<User> {
    let text = response.text()?;
    serde_json::from_str(&text).map_err(|source| Error::Json {
        endpoint: CURRENT_USER_ENDPOINT.to_string(),
        source,
    })
}
