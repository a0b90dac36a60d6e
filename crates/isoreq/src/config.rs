//! Client configuration

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Redirect limit used when neither the config nor the request sets one
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// User agent sent by default on native targets
pub const DEFAULT_USER_AGENT: &str = concat!("isoreq/", env!("CARGO_PKG_VERSION"));

/// Defaults applied to every request sent through a [`crate::Client`]
///
/// Every field has a default, so a partial TOML/JSON document deserializes:
///
/// ```
/// let config: isoreq::ClientConfig =
///     serde_json::from_str(r#"{"max_redirects": 3, "timeout_ms": 5000}"#).expect("valid config");
/// assert!(config.follow_redirects);
/// assert_eq!(config.max_redirects, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Follow redirects unless a request says otherwise
    pub follow_redirects: bool,
    /// Redirect limit unless a request says otherwise
    pub max_redirects: u32,
    /// Whole-exchange timeout in milliseconds; `0` means no timeout
    pub timeout_ms: Option<u64>,
    /// `User-Agent` header added when the caller sets none
    pub user_agent: Option<String>,
    /// Base used to resolve relative request URLs
    pub base_url: Option<Url>,
    /// Headers added to every request; caller headers win
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout_ms: None,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            base_url: None,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Configured timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Set the timeout at millisecond resolution
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert!(config.follow_redirects);
        assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert_eq!(config.timeout(), None);
        assert!(config
            .user_agent
            .as_deref()
            .is_some_and(|ua| ua.starts_with("isoreq/")));
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"follow_redirects": false, "base_url": "http://localhost:3000/api/", "headers": {"x-token": "abc"}}"#,
        )
        .expect("valid config");

        assert!(!config.follow_redirects);
        assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert_eq!(
            config.base_url.as_ref().map(Url::as_str),
            Some("http://localhost:3000/api/")
        );
        assert_eq!(config.headers.get("x-token").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_timeout_conversion() {
        let config = ClientConfig {
            timeout_ms: Some(7000),
            ..Default::default()
        };
        assert_eq!(config.timeout(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_sub_second_timeout_is_kept() {
        let mut config = ClientConfig::default();
        config.set_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout_ms, Some(500));
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = ClientConfig {
            timeout_ms: Some(0),
            ..Default::default()
        };
        assert_eq!(config.timeout(), None);
    }
}
