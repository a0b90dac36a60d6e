//! reqwest-based transport for native targets

use tracing::trace;

use crate::error::Error;
use crate::request::RequestDescriptor;
use crate::response::RawResponse;
use crate::transport::Transport;

/// Transport backed by a `reqwest::Client`
///
/// The client never follows redirects itself so that the redirect policy of
/// [`crate::Client`] sees every hop.
#[derive(Debug, Clone)]
pub struct ServerTransport {
    inner: reqwest::Client,
}

impl ServerTransport {
    /// Create a transport with its own connection pool
    pub fn new() -> Result<Self, Error> {
        let inner = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Build(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Wrap an existing `reqwest::Client`
    ///
    /// The client should be built with `redirect::Policy::none()`, otherwise
    /// redirects are resolved before the redirect policy gets to see them.
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

#[async_trait::async_trait]
impl Transport for ServerTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, Error> {
        let method = reqwest::Method::from_bytes(request.method.as_ref().as_bytes())
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;

        let mut builder = self.inner.request(method, request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        trace!(method = %request.method, url = %request.url, "Sending request");
        let response = builder.send().await.map_err(Error::from)?;

        let mut raw = RawResponse::new(response.status().as_u16(), response.url().clone());
        for (name, value) in response.headers() {
            raw.insert_header(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        raw.body = response.bytes().await.map_err(Error::from)?.to_vec();
        trace!(status = raw.status, len = raw.body.len(), "Received response");

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_new() {
        let transport = ServerTransport::new().expect("client builds");
        let _ = format!("{:?}", transport);
    }

    #[test]
    fn test_from_reqwest() {
        let transport = ServerTransport::from_reqwest(reqwest::Client::new());
        let _ = format!("{:?}", transport);
    }
}
