//! HTTP client
//!
//! A [`Client`] owns one [`Transport`] and one [`ClientConfig`]. Each call is
//! normalized into a [`RequestDescriptor`], handed to the transport, and
//! re-issued for as long as the redirect policy asks for another hop.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::options::{self, Options};
use crate::redirect::{self, Step};
use crate::request::RequestDescriptor;
use crate::response::{PendingResponse, Response};
use crate::transport::{DefaultTransport, Transport};

/// Client used by the free [`request`] function, built on first use
static DEFAULT_CLIENT: Lazy<Result<Client, String>> =
    Lazy::new(|| Client::new().map_err(|e| e.to_string()));

/// HTTP client
#[derive(Debug)]
pub struct Client<T = DefaultTransport> {
    transport: Arc<T>,
    config: Arc<ClientConfig>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
        }
    }
}

impl Client {
    /// Create a client with the default transport and configuration
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Create a new client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client with the default transport and `config`
    pub fn with_config(config: ClientConfig) -> Result<Self, Error> {
        ClientBuilder::from_config(config).build()
    }
}

impl<T: Transport> Client<T> {
    /// Create a client on top of a custom transport
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
        }
    }

    /// Configuration applied to every request
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start a request
    ///
    /// Arguments are validated before anything is sent; a bad method, URL or
    /// option surfaces as [`Error::InvalidArgument`] when the returned value
    /// is awaited.
    pub fn request(&self, method: &str, url: &str, options: Options) -> PendingResponse<'_> {
        let descriptor = options::normalize(method, url, options, &self.config);
        PendingResponse::new(Box::pin(async move { self.dispatch(descriptor?).await }))
    }

    /// Start a request from loosely typed arguments
    ///
    /// `method` and `url` must be JSON strings and `options`, when present,
    /// a JSON object or `null`.
    pub fn request_value(
        &self,
        method: &Value,
        url: &Value,
        options: Option<&Value>,
    ) -> PendingResponse<'_> {
        let descriptor = options::normalize_value(method, url, options, &self.config);
        PendingResponse::new(Box::pin(async move { self.dispatch(descriptor?).await }))
    }

    /// `GET` without options
    pub fn get(&self, url: &str) -> PendingResponse<'_> {
        self.request("GET", url, Options::new())
    }

    /// `POST` with `options`
    pub fn post(&self, url: &str, options: Options) -> PendingResponse<'_> {
        self.request("POST", url, options)
    }

    /// Send an already normalized request, following redirects
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn dispatch(&self, request: RequestDescriptor) -> Result<Response, Error> {
        let mut current = request;
        let mut redirects = 0u32;

        loop {
            let raw = self.transport.send(&current).await?;
            match redirect::next_step(&current, &raw, redirects)? {
                Step::Terminal => {
                    debug!(status = raw.status, redirects, "Request complete");
                    return Ok(Response::from(raw));
                }
                Step::Redirect(next) => {
                    redirects += 1;
                    debug!(
                        status = raw.status,
                        from = %current.url,
                        to = %next.url,
                        method = %next.method,
                        "Following redirect"
                    );
                    current = next;
                }
            }
        }
    }
}

/// Builder for [`Client`]
#[derive(Debug, Default, Clone)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Start from an existing configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Follow redirects by default
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Default redirect limit
    pub fn max_redirects(mut self, max: u32) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Default timeout; [`Duration::ZERO`] disables it
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.set_timeout(timeout);
        self
    }

    /// User agent; `None` sends none
    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Base for relative request URLs
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.config.base_url = Some(base_url);
        self
    }

    /// Header sent with every request
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    /// Build a client on the default transport
    pub fn build(self) -> Result<Client, Error> {
        Ok(Client::with_transport(DefaultTransport::new()?, self.config))
    }

    /// Build a client on a custom transport
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Client<T> {
        Client::with_transport(transport, self.config)
    }
}

fn default_client() -> Result<&'static Client, Error> {
    Lazy::force(&DEFAULT_CLIENT)
        .as_ref()
        .map_err(|e| Error::Build(e.clone()))
}

/// Start a request on the process-wide default client
///
/// ```no_run
/// # async fn run() -> Result<(), isoreq::Error> {
/// let body = isoreq::request("GET", "http://example.com", isoreq::Options::new())
///     .get_body(Some("utf8"))
///     .await?;
/// println!("{}", body.as_text().unwrap_or_default());
/// # Ok(())
/// # }
/// ```
pub fn request(method: &str, url: &str, options: Options) -> PendingResponse<'static> {
    match default_client() {
        Ok(client) => client.request(method, url, options),
        Err(err) => PendingResponse::new(Box::pin(async move { Err::<Response, _>(err) })),
    }
}

/// Start a request from loosely typed arguments on the default client
pub fn request_value(
    method: &Value,
    url: &Value,
    options: Option<&Value>,
) -> PendingResponse<'static> {
    match default_client() {
        Ok(client) => client.request_value(method, url, options),
        Err(err) => PendingResponse::new(Box::pin(async move { Err::<Response, _>(err) })),
    }
}
