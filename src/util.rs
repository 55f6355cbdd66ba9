use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::{Error, Result};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn is_loopback_host(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1"
}

pub(crate) fn host_of(base_url: &str) -> Result<String> {
    let parsed =
        Url::parse(base_url).map_err(|_| Error::Config(format!("invalid base URL: {base_url}")))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Config(format!("base URL has no host: {base_url}")))
}

/// Truncates a server timestamp to its calendar-date portion.
pub(crate) fn date_portion(value: &str) -> &str {
    value.split('T').next().unwrap_or(value)
}

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

pub(crate) fn build_http(timeout: Duration, verify: bool) -> Result<HttpClient> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("d2s-client/{}", env!("CARGO_PKG_VERSION")))
            .unwrap_or(HeaderValue::from_static("d2s-client")),
    );

    let mut builder = HttpClient::builder()
        .default_headers(default_headers)
        .timeout(timeout);

    if !verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder.build()?)
}
