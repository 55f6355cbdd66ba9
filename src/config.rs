use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base platform URL, e.g. `https://ps2.d2s.org`.
    pub url: String,
    /// Stored login email, if configured.
    pub email: Option<String>,
    /// Stored login password, if configured.
    pub password: Option<String>,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

impl ClientConfig {
    /// Configuration for an explicit URL, with TLS verification on and no
    /// stored credentials.
    pub fn for_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            email: None,
            password: None,
            verify: true,
        }
    }
}

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    email: Option<String>,
    password: Option<String>,
    verify: Option<bool>,
}

/// Resolves configuration using (in order of precedence):
/// - explicit arguments
/// - environment variables `D2S_URL` / `D2S_EMAIL` / `D2S_PASSWORD`
/// - config file from `D2S_RC` or `.d2src`
pub(crate) fn load_config(url: Option<String>, verify: Option<bool>) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("D2S_URL").ok());
    let mut email = std::env::var("D2S_EMAIL").ok();
    let mut password = std::env::var("D2S_PASSWORD").ok();

    let rc_candidates = rc_candidates();
    let mut file_verify: Option<bool> = None;

    if url.is_none() || email.is_none() || password.is_none() || verify.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path)?;
                if url.is_none() {
                    url = cfg.url;
                }
                if email.is_none() {
                    email = cfg.email;
                }
                if password.is_none() {
                    password = cfg.password;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let url = match url {
        Some(v) => v,
        None => {
            if !rc_candidates.is_empty() {
                return Err(Error::Config(format!(
                    "missing configuration: url (set D2S_URL or put `url:` in one of: {})",
                    rc_candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
            return Err(Error::Config(
                "missing configuration: url (set D2S_URL or create .d2src)".to_string(),
            ));
        }
    };

    let verify = verify.or(file_verify).unwrap_or(true);

    Ok(ClientConfig {
        url,
        email,
        password,
        verify,
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // Support formatting where a key is on one line and its value on the next.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key {
            // Continuation value line (no colon)
            if !line.contains(':') {
                assign(&mut cfg, pk, strip_quotes(line));
                pending_key = None;
                continue;
            }
            pending_key = None;
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "url" | "email" | "password" => {
                    if v.is_empty() {
                        pending_key = Some(k);
                    } else {
                        assign(&mut cfg, k, v);
                    }
                }
                "verify" => {
                    if !v.is_empty() {
                        cfg.verify = Some(v != "0");
                    }
                }
                _ => {}
            }
        }
    }

    cfg
}

fn assign(cfg: &mut RcConfig, key: &str, value: &str) {
    let value = value.to_string();
    match key {
        "url" => cfg.url = Some(value),
        "email" => cfg.email = Some(value),
        "password" => cfg.password = Some(value),
        _ => {}
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) D2S_RC (explicit)
    // 2) ./.d2src (current working directory)
    // 3) ~/.d2src
    if let Ok(p) = std::env::var("D2S_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".d2src"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".d2src"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_comments_and_quotes() {
        let text = "# instance\nurl: https://ps2.d2s.org\nemail: 'user@example.org'\nverify: 0\n";
        let cfg = parse_rc(text);
        assert_eq!(cfg.url.as_deref(), Some("https://ps2.d2s.org"));
        assert_eq!(cfg.email.as_deref(), Some("user@example.org"));
        assert_eq!(cfg.password, None);
        assert_eq!(cfg.verify, Some(false));
    }

    #[test]
    fn supports_a_value_on_the_following_line() {
        let text = "password:\nsuper-secret\nurl: https://ps2.d2s.org\n";
        let cfg = parse_rc(text);
        assert_eq!(cfg.password.as_deref(), Some("super-secret"));
        assert_eq!(cfg.url.as_deref(), Some("https://ps2.d2s.org"));
    }

    #[test]
    fn verify_defaults_to_unset_and_parses_truthy_values() {
        assert_eq!(parse_rc("url: http://x\n").verify, None);
        assert_eq!(parse_rc("verify: 1\n").verify, Some(true));
        assert_eq!(parse_rc("verify: 0\n").verify, Some(false));
    }

    #[test]
    fn strips_matching_quotes_only() {
        assert_eq!(strip_quotes("\"abc\""), "abc");
        assert_eq!(strip_quotes("'abc'"), "abc");
        assert_eq!(strip_quotes("abc"), "abc");
        assert_eq!(strip_quotes("\"abc"), "\"abc");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let cfg = parse_rc("token: nope\nurl: http://x\n");
        assert_eq!(cfg.url.as_deref(), Some("http://x"));
    }
}
