//! Runtime configuration read from `ARCADIA_*` environment variables.

#![forbid(unsafe_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::media::MediaResolver;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@gmail.com";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Backend REST base URL, without trailing slash.
    pub api_url: String,
    /// Base that stored image paths are resolved against.
    pub media_base: String,
    pub http_timeout_secs: u64,
    /// Accounts allowed into the console regardless of role.
    pub admin_emails: Vec<String>,
    /// Optional bearer token sent with every request.
    pub api_token: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            media_base: DEFAULT_API_URL.to_string(),
            http_timeout_secs: 30,
            admin_emails: vec![DEFAULT_ADMIN_EMAIL.to_string()],
            api_token: None,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary variable source; unset or unparsable values fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(url) = get("ARCADIA_API_URL").filter(|s| !s.trim().is_empty()) {
            cfg.api_url = url.trim().trim_end_matches('/').to_string();
        }
        cfg.media_base = get("ARCADIA_MEDIA_BASE")
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| cfg.api_url.clone());
        if let Some(raw) = get("ARCADIA_HTTP_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => cfg.http_timeout_secs = secs,
                _ => warn!(value = %raw, "invalid ARCADIA_HTTP_TIMEOUT_SECS; using default"),
            }
        }
        if let Some(raw) = get("ARCADIA_ADMIN_EMAILS") {
            cfg.admin_emails = raw
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        cfg.api_token = get("ARCADIA_API_TOKEN").filter(|s| !s.trim().is_empty());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Both base URLs must be absolute.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_url).with_context(|| format!("invalid api url: {}", self.api_url))?;
        url::Url::parse(&self.media_base).with_context(|| format!("invalid media base: {}", self.media_base))?;
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn media(&self) -> MediaResolver {
        MediaResolver::new(self.media_base.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ConsoleConfig::from_lookup(lookup(&[])).expect("cfg");
        assert_eq!(cfg, ConsoleConfig::default());
    }

    #[test]
    fn media_base_follows_api_url() {
        let cfg = ConsoleConfig::from_lookup(lookup(&[("ARCADIA_API_URL", "https://api.arcadia.test/")])).unwrap();
        assert_eq!(cfg.api_url, "https://api.arcadia.test");
        assert_eq!(cfg.media_base, "https://api.arcadia.test");
        assert_eq!(cfg.media().resolve_display_url("a.png"), "https://api.arcadia.test/images/a.png");
    }

    #[test]
    fn parses_overrides_and_ignores_bad_timeout() {
        let cfg = ConsoleConfig::from_lookup(lookup(&[
            ("ARCADIA_MEDIA_BASE", "https://cdn.test"),
            ("ARCADIA_HTTP_TIMEOUT_SECS", "nope"),
            ("ARCADIA_ADMIN_EMAILS", " Root@Site.io , ,ops@site.io"),
            ("ARCADIA_API_TOKEN", "t0k"),
        ]))
        .unwrap();
        assert_eq!(cfg.media_base, "https://cdn.test");
        assert_eq!(cfg.http_timeout_secs, 30);
        assert_eq!(cfg.admin_emails, vec!["root@site.io", "ops@site.io"]);
        assert_eq!(cfg.api_token.as_deref(), Some("t0k"));
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(ConsoleConfig::from_lookup(lookup(&[("ARCADIA_API_URL", "localhost")])).is_err());
    }
}
