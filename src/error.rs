use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum Error {
    /// Login was rejected or could not be completed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The client was constructed or configured incorrectly.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A 401 could not be recovered by a token refresh. All session cookies
    /// have been cleared; the caller must sign in again.
    #[error("session expired, sign in again")]
    SessionExpired,

    /// Any non-2xx response not otherwise classified.
    #[error("API request failed: HTTP {status} for {endpoint}")]
    Http {
        status: StatusCode,
        endpoint: String,
    },

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server replied with a body that is not the expected JSON.
    #[error("failed to parse API response from {endpoint}")]
    Json {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
