//! Request options and their normalization into a [`RequestDescriptor`]

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::body::{self, BodySource};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::form::FormData;
use crate::qs::{self, json_type_name, QueryParams, QueryValue};
use crate::request::{Headers, Method, RequestDescriptor};

/// Per request options
///
/// When several body options are set, `json` wins over `form`, which wins
/// over `body`. The losing options are ignored.
///
/// ```
/// use isoreq::{FormData, Options};
///
/// let options = Options::new()
///     .query("page", "2")
///     .header("Accept", "application/json")
///     .form(FormData::new().append("foo", "baz"))
///     .max_redirects(3);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    qs: QueryParams,
    json: Option<Vec<u8>>,
    form: Option<FormData>,
    body: Option<Vec<u8>>,
    headers: Headers,
    follow_redirects: Option<bool>,
    max_redirects: Option<u32>,
    timeout: Option<Duration>,
    error: Option<String>,
}

impl Options {
    /// Empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Query parameters merged into the URL; replaces earlier ones
    #[must_use]
    pub fn qs(mut self, qs: QueryParams) -> Self {
        self.qs = qs;
        self
    }

    /// Append a single query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.qs.push(key, value);
        self
    }

    /// Send `value` serialized as JSON
    ///
    /// A serialization failure is reported when the request is dispatched.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.json = Some(bytes),
            Err(e) => self.error = Some(format!("json body cannot be serialized: {}", e)),
        }
        self
    }

    /// Send a multipart form
    #[must_use]
    pub fn form(mut self, form: FormData) -> Self {
        self.form = Some(form);
        self
    }

    /// Send raw bytes (a string is sent as UTF-8)
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a header; caller headers win over every default
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Merge a set of headers
    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers.merge(&headers);
        self
    }

    /// Whether to follow redirects
    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    /// Maximum number of redirects to follow
    #[must_use]
    pub fn max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Timeout for each exchange; [`Duration::ZERO`] disables the client default
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Pick the body option that applies, json > form > raw
    fn take_body(&mut self) -> Option<BodySource> {
        let set = [
            self.json.is_some(),
            self.form.is_some(),
            self.body.is_some(),
        ]
        .iter()
        .filter(|s| **s)
        .count();
        if set > 1 {
            debug!("Several body options given, using json > form > body precedence");
        }

        if let Some(json) = self.json.take() {
            Some(BodySource::Json(json))
        } else if let Some(form) = self.form.take() {
            Some(BodySource::Form(form))
        } else {
            self.body.take().map(BodySource::Raw)
        }
    }
}

impl TryFrom<&Value> for Options {
    type Error = Error;

    /// Build options from a loosely typed JSON object
    ///
    /// Recognized keys: `qs`, `json`, `form`, `body`, `headers`,
    /// `followRedirects`, `maxRedirects` and `timeout` (milliseconds, `0` for
    /// none).
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::invalid_argument(format!(
                    "options must be an object, got {}",
                    json_type_name(other)
                )))
            }
        };

        let mut options = Options::new();
        for (key, value) in map {
            match key.as_str() {
                "qs" => options.qs = QueryParams::try_from(value)?,
                "json" => options = options.json(value),
                "form" => options.form = Some(FormData::try_from(value)?),
                "body" => options.body = Some(raw_body(value)?),
                "headers" => options.headers = headers_from_value(value)?,
                "followRedirects" => {
                    let follow = value.as_bool().ok_or_else(|| {
                        Error::invalid_argument("followRedirects must be a boolean")
                    })?;
                    options.follow_redirects = Some(follow);
                }
                "maxRedirects" => {
                    let max = value
                        .as_u64()
                        .and_then(|n| u32::try_from(n).ok())
                        .ok_or_else(|| {
                            Error::invalid_argument("maxRedirects must be a non-negative integer")
                        })?;
                    options.max_redirects = Some(max);
                }
                "timeout" => {
                    let millis = value.as_u64().ok_or_else(|| {
                        Error::invalid_argument("timeout must be a number of milliseconds")
                    })?;
                    options.timeout = Some(Duration::from_millis(millis));
                }
                other => debug!("Ignoring unknown option `{}`", other),
            }
        }
        Ok(options)
    }
}

fn raw_body(value: &Value) -> Result<Vec<u8>, Error> {
    match value {
        Value::String(s) => Ok(s.clone().into_bytes()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| Error::invalid_argument("body array must contain bytes"))
            })
            .collect(),
        other => Err(Error::invalid_argument(format!(
            "body must be a string or a byte array, got {}",
            json_type_name(other)
        ))),
    }
}

fn headers_from_value(value: &Value) -> Result<Headers, Error> {
    let map = value.as_object().ok_or_else(|| {
        Error::invalid_argument(format!(
            "headers must be an object, got {}",
            json_type_name(value)
        ))
    })?;

    Ok(map
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), value)
        })
        .collect())
}

/// Validate `(method, url, options)` and build the request to send
pub fn normalize(
    method: &str,
    url: &str,
    mut options: Options,
    config: &ClientConfig,
) -> Result<RequestDescriptor, Error> {
    if let Some(err) = options.error.take() {
        return Err(Error::InvalidArgument(err));
    }

    let method = Method::parse(method)?;
    if url.is_empty() {
        return Err(Error::invalid_argument("url must be a non-empty string"));
    }
    let url = resolve_url(&qs::merge(url, &options.qs), config.base_url.as_ref())?;

    let mut headers = Headers::new();
    for (name, value) in &config.headers {
        headers.set(name.as_str(), value.as_str());
    }
    if let Some(user_agent) = &config.user_agent {
        headers.set_default("User-Agent", user_agent.as_str());
    }

    let body = options.take_body().map(body::resolve).map(|resolved| {
        headers.merge(&resolved.headers);
        resolved.bytes
    });
    headers.merge(&options.headers);

    Ok(RequestDescriptor {
        method,
        url,
        headers,
        body,
        follow_redirects: options.follow_redirects.unwrap_or(config.follow_redirects),
        max_redirects: options.max_redirects.unwrap_or(config.max_redirects),
        timeout: options
            .timeout
            .or_else(|| config.timeout())
            .filter(|timeout| !timeout.is_zero()),
    })
}

/// Validate loosely typed arguments, then [`normalize`]
pub fn normalize_value(
    method: &Value,
    url: &Value,
    options: Option<&Value>,
    config: &ClientConfig,
) -> Result<RequestDescriptor, Error> {
    let method = method.as_str().ok_or_else(|| {
        Error::invalid_argument(format!(
            "method must be a string, got {}",
            json_type_name(method)
        ))
    })?;
    let url = url.as_str().ok_or_else(|| {
        Error::invalid_argument(format!("url must be a string, got {}", json_type_name(url)))
    })?;
    let options = match options {
        None | Some(Value::Null) => Options::new(),
        Some(value) => Options::try_from(value)?,
    };

    normalize(method, url, options, config)
}

fn resolve_url(url: &str, base: Option<&Url>) -> Result<Url, Error> {
    match Url::parse(url) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base
                .join(url)
                .map_err(|e| Error::invalid_argument(format!("invalid url `{}`: {}", url, e))),
            None => Err(Error::invalid_argument(format!(
                "relative url `{}` needs a configured base_url",
                url
            ))),
        },
        Err(e) => Err(Error::invalid_argument(format!(
            "invalid url `{}`: {}",
            url, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config() -> ClientConfig {
        ClientConfig {
            user_agent: None,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_defaults() {
        let req = normalize("get", "http://localhost:3000", Options::new(), &config())
            .expect("valid request");

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url.as_str(), "http://localhost:3000/");
        assert!(req.headers.is_empty());
        assert_eq!(req.body, None);
        assert!(req.follow_redirects);
        assert_eq!(req.max_redirects, 10);
        assert_eq!(req.timeout, None);
    }

    #[test]
    fn test_normalize_merges_qs() {
        let req = normalize(
            "GET",
            "http://localhost:3000/?a=1",
            Options::new().query("foo", "baz"),
            &config(),
        )
        .expect("valid request");
        assert_eq!(req.url.as_str(), "http://localhost:3000/?a=1&foo=baz");
    }

    #[test]
    fn test_normalize_json_body() {
        let req = normalize(
            "POST",
            "http://localhost:3000",
            Options::new().json(&json!({"foo": "baz"})),
            &config(),
        )
        .expect("valid request");

        assert_eq!(req.body.as_deref(), Some(br#"{"foo":"baz"}"#.as_slice()));
        assert_eq!(req.headers.get("content-type"), Some("application/json"));
        assert_eq!(req.headers.get("content-length"), Some("13"));
    }

    #[test]
    fn test_body_precedence_json_over_form_over_raw() {
        let form = FormData::new().append("foo", "bar");

        let req = normalize(
            "POST",
            "http://localhost:3000",
            Options::new()
                .body("raw")
                .form(form.clone())
                .json(&json!([1])),
            &config(),
        )
        .expect("valid request");
        assert_eq!(req.body.as_deref(), Some(b"[1]".as_slice()));
        assert_eq!(req.headers.get("content-type"), Some("application/json"));

        let req = normalize(
            "POST",
            "http://localhost:3000",
            Options::new().body("raw").form(form),
            &config(),
        )
        .expect("valid request");
        assert!(req
            .headers
            .get("content-type")
            .is_some_and(|ct| ct.starts_with("multipart/form-data; boundary=")));

        let req = normalize(
            "POST",
            "http://localhost:3000",
            Options::new().body("raw"),
            &config(),
        )
        .expect("valid request");
        assert_eq!(req.body.as_deref(), Some(b"raw".as_slice()));
        assert_eq!(req.headers.get("content-type"), None);
    }

    #[test]
    fn test_header_layering_caller_wins() {
        let mut config = config();
        config.user_agent = Some("isoreq-test".to_string());
        config
            .headers
            .insert("X-Default".to_string(), "config".to_string());

        let req = normalize(
            "POST",
            "http://localhost:3000",
            Options::new()
                .json(&json!({}))
                .header("content-type", "application/vnd.api+json")
                .header("x-default", "caller"),
            &config,
        )
        .expect("valid request");

        assert_eq!(req.headers.get("user-agent"), Some("isoreq-test"));
        assert_eq!(req.headers.get("x-default"), Some("caller"));
        assert_eq!(
            req.headers.get("content-type"),
            Some("application/vnd.api+json")
        );
    }

    #[test]
    fn test_configured_user_agent_header_wins_over_user_agent_field() {
        let mut config = config();
        config.user_agent = Some("from-field".to_string());
        config
            .headers
            .insert("user-agent".to_string(), "from-headers".to_string());

        let req = normalize("GET", "http://localhost:3000", Options::new(), &config)
            .expect("valid request");
        assert_eq!(req.headers.get("User-Agent"), Some("from-headers"));
    }

    #[test]
    fn test_request_overrides_redirect_config() {
        let req = normalize(
            "GET",
            "http://localhost:3000",
            Options::new()
                .follow_redirects(false)
                .max_redirects(2)
                .timeout(Duration::from_millis(250)),
            &config(),
        )
        .expect("valid request");

        assert!(!req.follow_redirects);
        assert_eq!(req.max_redirects, 2);
        assert_eq!(req.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_zero_timeout_disables_configured_default() {
        let mut config = config();
        config.timeout_ms = Some(5000);

        let req = normalize(
            "GET",
            "http://localhost:3000",
            Options::new().timeout(Duration::ZERO),
            &config,
        )
        .expect("zero timeout is accepted");
        assert_eq!(req.timeout, None);

        let req = normalize_value(
            &json!("GET"),
            &json!("http://localhost:3000"),
            Some(&json!({ "timeout": 0 })),
            &ClientConfig::default(),
        )
        .expect("zero timeout is accepted");
        assert_eq!(req.timeout, None);
    }

    #[test]
    fn test_relative_url_needs_base() {
        let err = normalize("GET", "/path", Options::new(), &config())
            .expect_err("relative without base");
        assert!(matches!(err, Error::InvalidArgument(_)));

        let mut config = config();
        config.base_url = Some(Url::parse("http://localhost:3000/api/").expect("valid base"));
        let req = normalize(
            "GET",
            "items?x=1",
            Options::new().query("y", "2"),
            &config,
        )
        .expect("relative with base");
        assert_eq!(req.url.as_str(), "http://localhost:3000/api/items?x=1&y=2");
    }

    #[test]
    fn test_invalid_method_and_url() {
        for method in ["", "GRAB"] {
            let err = normalize(method, "http://localhost:3000", Options::new(), &config())
                .expect_err("invalid method");
            assert!(matches!(err, Error::InvalidArgument(_)));
        }

        let err = normalize("GET", "", Options::new(), &config()).expect_err("empty url");
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err =
            normalize("GET", "http://[::1", Options::new(), &config()).expect_err("bad url");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_unserializable_json_is_argument_error() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(vec![1u8], "non-string key");

        let err = normalize(
            "POST",
            "http://localhost:3000",
            Options::new().json(&map),
            &config(),
        )
        .expect_err("map with non-string keys");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_normalize_value_rejects_non_string_method() {
        let err = normalize_value(
            &json!({}),
            &json!("http://localhost:3000"),
            None,
            &config(),
        )
        .expect_err("object method");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_normalize_value_rejects_non_string_url() {
        let err = normalize_value(&json!("GET"), &json!({}), None, &config())
            .expect_err("object url");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_normalize_value_rejects_string_options() {
        let err = normalize_value(
            &json!("GET"),
            &json!("http://localhost:3000"),
            Some(&json!("options")),
            &config(),
        )
        .expect_err("string options");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_normalize_value_full_options() {
        let req = normalize_value(
            &json!("post"),
            &json!("http://localhost:3000/form"),
            Some(&json!({
                "qs": {"foo": {"bar": "baz"}},
                "headers": {"X-Trace": "1"},
                "form": {"foo": "baz"},
                "followRedirects": false,
                "maxRedirects": 4,
                "timeout": 1500,
                "somethingElse": true
            })),
            &config(),
        )
        .expect("valid request");

        assert_eq!(req.method, Method::Post);
        assert_eq!(
            req.url.as_str(),
            "http://localhost:3000/form?foo%5Bbar%5D=baz"
        );
        assert_eq!(req.headers.get("x-trace"), Some("1"));
        assert!(req
            .headers
            .get("content-type")
            .is_some_and(|ct| ct.starts_with("multipart/form-data")));
        assert!(!req.follow_redirects);
        assert_eq!(req.max_redirects, 4);
        assert_eq!(req.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_normalize_value_rejects_bad_option_types() {
        for options in [
            json!({"followRedirects": "yes"}),
            json!({"maxRedirects": -1}),
            json!({"headers": "x"}),
            json!({"body": {"a": 1}}),
            json!({"qs": "a=b"}),
        ] {
            let err = normalize_value(
                &json!("GET"),
                &json!("http://localhost:3000"),
                Some(&options),
                &config(),
            )
            .expect_err("bad option type");
            assert!(matches!(err, Error::InvalidArgument(_)), "{}", options);
        }
    }
}
