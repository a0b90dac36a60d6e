//! HTTP response types

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use strum_macros::EnumString;
use url::Url;

use crate::error::Error;

/// Result of a completed exchange as delivered by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lower-cased names, last value wins
    pub headers: BTreeMap<String, String>,
    /// Full response body
    pub body: Vec<u8>,
    /// URL the response was served from
    pub url: Url,
}

impl RawResponse {
    /// Empty response with the given status
    pub fn new(status: u16, url: Url) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
            url,
        }
    }

    /// Add a header, lower-casing its name; a later value replaces an earlier one
    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    /// `Location` header value
    pub fn location(&self) -> Option<&str> {
        self.headers.get("location").map(String::as_str)
    }
}

/// Text encodings accepted by [`Response::get_body`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Encoding {
    /// UTF-8, invalid sequences replaced with U+FFFD
    #[strum(serialize = "utf8", serialize = "utf-8")]
    Utf8,
    /// 7-bit ASCII, the high bit of every byte is dropped
    #[strum(serialize = "ascii")]
    Ascii,
    /// ISO-8859-1, one char per byte
    #[strum(serialize = "latin1", serialize = "binary")]
    Latin1,
    /// Lower-case hexadecimal
    #[strum(serialize = "hex")]
    Hex,
    /// Standard padded base64
    #[strum(serialize = "base64")]
    Base64,
}

impl Encoding {
    /// Parse an encoding name
    pub fn parse(name: &str) -> Result<Self, Error> {
        Encoding::from_str(name).map_err(|_| Error::InvalidEncoding(name.to_string()))
    }

    /// Decode `bytes` into text
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Ascii => bytes.iter().map(|b| char::from(b & 0x7f)).collect(),
            Encoding::Latin1 => bytes.iter().map(|b| char::from(*b)).collect(),
            Encoding::Hex => hex::encode(bytes),
            Encoding::Base64 => BASE64.encode(bytes),
        }
    }
}

/// Materialized response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Undecoded bytes
    Bytes(Vec<u8>),
    /// Decoded text
    Text(String),
}

impl Body {
    /// Body bytes; text is returned as its UTF-8 encoding
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Bytes(bytes) => bytes,
            Body::Text(text) => text.as_bytes(),
        }
    }

    /// Decoded text, if an encoding was requested
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Bytes(_) => None,
        }
    }

    /// Owned bytes
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Body::Bytes(bytes) => bytes,
            Body::Text(text) => text.into_bytes(),
        }
    }
}

/// A completed HTTP response
///
/// Status, headers and body bytes are available immediately. The body is
/// decoded on demand by [`Response::get_body`] from the stored bytes, so it
/// can be read any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    raw: RawResponse,
}

impl From<RawResponse> for Response {
    fn from(raw: RawResponse) -> Self {
        Self { raw }
    }
}

impl Response {
    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.raw.status
    }

    /// Alias of [`Response::status`]
    pub fn status_code(&self) -> u16 {
        self.raw.status
    }

    /// Response headers keyed by lower-cased name
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.raw.headers
    }

    /// Header value, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw
            .headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        &self.raw.body
    }

    /// URL of the final response, after redirects
    pub fn url(&self) -> &Url {
        &self.raw.url
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.raw.status)
    }

    /// Check if the response status is a redirection (3xx)
    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.raw.status)
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.raw.status)
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.raw.status)
    }

    /// Materialize the body
    ///
    /// Without an encoding the raw bytes are returned; with one, the decoded
    /// text. Unknown encoding names fail with [`Error::InvalidEncoding`].
    pub async fn get_body(&self, encoding: Option<&str>) -> Result<Body, Error> {
        match encoding {
            None => Ok(Body::Bytes(self.raw.body.clone())),
            Some(name) => Ok(Body::Text(Encoding::parse(name)?.decode(&self.raw.body))),
        }
    }

    /// Get the response body as UTF-8 text
    pub async fn text(&self) -> Result<String, Error> {
        Ok(Encoding::Utf8.decode(&self.raw.body))
    }

    /// Get the response body as JSON
    pub async fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.raw.body).map_err(Error::from)
    }

    /// Turn a client or server error status (400 and above) into
    /// [`Error::Status`]
    ///
    /// A 3xx that reaches the caller is either a `304` or a redirect left
    /// unfollowed on purpose, so it passes through.
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.raw.status >= 400 {
            return Err(Error::Status {
                status: self.raw.status,
                message: Encoding::Utf8.decode(&self.raw.body),
            });
        }
        Ok(self)
    }

    /// Owned body bytes
    pub fn into_body(self) -> Vec<u8> {
        self.raw.body
    }

    /// Unwrap into the underlying [`RawResponse`]
    pub fn into_raw(self) -> RawResponse {
        self.raw
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) type ResponseFuture<'a> = futures::future::BoxFuture<'a, Result<Response, Error>>;
#[cfg(target_arch = "wasm32")]
pub(crate) type ResponseFuture<'a> = futures::future::LocalBoxFuture<'a, Result<Response, Error>>;

/// A request in flight
///
/// Awaiting it yields the [`Response`]. The body helpers can be chained
/// directly: `request(..).get_body(Some("utf8")).await`.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct PendingResponse<'a> {
    inner: ResponseFuture<'a>,
}

impl<'a> PendingResponse<'a> {
    pub(crate) fn new(inner: ResponseFuture<'a>) -> Self {
        Self { inner }
    }

    /// Wait for the response, then materialize its body
    pub async fn get_body(self, encoding: Option<&str>) -> Result<Body, Error> {
        self.await?.get_body(encoding).await
    }

    /// Wait for the response, then decode its body as UTF-8
    pub async fn text(self) -> Result<String, Error> {
        self.await?.text().await
    }

    /// Wait for the response, then parse its body as JSON
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        self.await?.json().await
    }
}

impl Future for PendingResponse<'_> {
    type Output = Result<Response, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for PendingResponse<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResponse").finish_non_exhaustive()
    }
}
