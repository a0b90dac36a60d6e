//! Canonical request description handed to a transport

use std::str::FromStr;
use std::time::Duration;

use strum_macros::{AsRefStr, Display, EnumString};
use url::Url;

use crate::error::Error;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Method {
    /// GET
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// OPTIONS
    Options,
    /// TRACE
    Trace,
    /// CONNECT
    Connect,
}

impl Method {
    /// Parse a method name, case-insensitively
    pub fn parse(method: &str) -> Result<Self, Error> {
        if method.is_empty() {
            return Err(Error::invalid_argument("method must be a non-empty string"));
        }
        Method::from_str(method)
            .map_err(|_| Error::invalid_argument(format!("unknown HTTP method `{}`", method)))
    }
}

/// Ordered, case-insensitive header list
///
/// Setting a header that already exists replaces the first occurrence in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Empty header list
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Set `name` only if it is not present yet
    pub fn set_default(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if self.position(&name).is_none() {
            self.entries.push((name, value.into()));
        }
    }

    /// Value of `name`, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    /// Whether `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove `name`, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.position(name)?;
        let (_, value) = self.entries.remove(idx);
        Some(value)
    }

    /// Overlay `other` on top of `self`; values from `other` win
    pub fn merge(&mut self, other: &Headers) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

/// Fully resolved request, ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Request method
    pub method: Method,
    /// Absolute request URL, query already merged
    pub url: Url,
    /// Request headers, defaults and body headers included
    pub headers: Headers,
    /// Encoded request body
    pub body: Option<Vec<u8>>,
    /// Follow 3xx responses carrying a `Location`
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow
    pub max_redirects: u32,
    /// Per request timeout
    pub timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!(Method::parse("get").expect("valid"), Method::Get);
        assert_eq!(Method::parse("Post").expect("valid"), Method::Post);
        assert_eq!(Method::parse("DELETE").expect("valid"), Method::Delete);
    }

    #[test]
    fn test_method_display_uppercase() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(Method::Options.as_ref(), "OPTIONS");
    }

    #[test]
    fn test_method_parse_rejects_empty_and_unknown() {
        assert!(matches!(Method::parse(""), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            Method::parse("FETCH"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_headers_set_replaces_case_insensitively() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain");
        headers.set("accept", "*/*");
        headers.set("content-type", "application/json");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Content-Type", "accept"]);
    }

    #[test]
    fn test_headers_set_default_keeps_existing() {
        let mut headers = Headers::new();
        headers.set("User-Agent", "custom");
        headers.set_default("user-agent", "isoreq");
        headers.set_default("Accept", "*/*");

        assert_eq!(headers.get("user-agent"), Some("custom"));
        assert_eq!(headers.get("accept"), Some("*/*"));
    }

    #[test]
    fn test_headers_merge_other_wins() {
        let mut base: Headers = [("A", "1"), ("B", "2")].into_iter().collect();
        let overlay: Headers = [("b", "3"), ("C", "4")].into_iter().collect();
        base.merge(&overlay);

        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("3"));
        assert_eq!(base.get("c"), Some("4"));
    }

    #[test]
    fn test_headers_remove() {
        let mut headers: Headers = [("Cookie", "a=b")].into_iter().collect();
        assert_eq!(headers.remove("cookie"), Some("a=b".to_string()));
        assert!(headers.is_empty());
        assert_eq!(headers.remove("cookie"), None);
    }
}
