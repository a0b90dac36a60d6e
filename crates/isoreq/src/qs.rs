//! Query string merging
//!
//! Extra query parameters are appended to whatever query a URL already carries.
//! Nested mappings use bracket notation (`foo[bar]=baz`) and list values repeat
//! their key once per element (`a=x&a=y`).

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::error::Error;

/// Everything except the RFC 3986 unreserved characters
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Ordered query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, QueryValue)>,
}

/// A single query parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Plain value
    Str(String),
    /// Nested mapping, flattened with bracket notation
    Map(QueryParams),
    /// Repeated value
    List(Vec<QueryValue>),
}

impl QueryParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, keeping insertion order
    #[must_use]
    pub fn append(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a parameter in place
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// True when no parameter was added
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over the top-level parameters
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten into `key=value` pairs, unencoded
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, value) in &self.pairs {
            flatten_into(key.clone(), value, &mut out);
        }
        out
    }

    /// Serialize as an encoded query string without the leading `?`
    pub fn to_query_string(&self) -> String {
        self.flatten()
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn flatten_into(prefix: String, value: &QueryValue, out: &mut Vec<(String, String)>) {
    match value {
        QueryValue::Str(s) => out.push((prefix, s.clone())),
        QueryValue::Map(map) => {
            for (key, nested) in &map.pairs {
                flatten_into(format!("{}[{}]", prefix, key), nested, out);
            }
        }
        QueryValue::List(items) => {
            for item in items {
                flatten_into(prefix.clone(), item, out);
            }
        }
    }
}

fn encode(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT_ENCODE_SET).to_string()
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<QueryParams> for QueryValue {
    fn from(value: QueryParams) -> Self {
        QueryValue::Map(value)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<&Value> for QueryValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => QueryValue::Str(s.clone()),
            Value::Null => QueryValue::Str(String::new()),
            Value::Array(items) => QueryValue::List(items.iter().map(Into::into).collect()),
            Value::Object(map) => QueryValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), QueryValue::from(v)))
                    .collect(),
            ),
            other => QueryValue::Str(other.to_string()),
        }
    }
}

impl TryFrom<&Value> for QueryParams {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| (k.clone(), QueryValue::from(v)))
                .collect()),
            other => Err(Error::invalid_argument(format!(
                "qs must be an object, got {}",
                json_type_name(other)
            ))),
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Merge `extra` into the query component of `url`
///
/// Existing query text is kept verbatim, new pairs are appended after it and
/// the fragment (if any) stays last. An `extra` that yields no pairs returns
/// `url` untouched.
pub fn merge(url: &str, extra: &QueryParams) -> String {
    let query = extra.to_query_string();
    if query.is_empty() {
        return url.to_string();
    }

    let (rest, fragment) = match url.find('#') {
        Some(idx) => (&url[..idx], &url[idx..]),
        None => (url, ""),
    };

    let mut merged = String::with_capacity(url.len() + query.len() + 1);
    merged.push_str(rest);
    if !rest.contains('?') {
        merged.push('?');
    } else if !rest.ends_with('?') && !rest.ends_with('&') {
        merged.push('&');
    }
    merged.push_str(&query);
    merged.push_str(fragment);
    merged
}
