//! Transport abstraction
//!
//! A transport performs one HTTP exchange and nothing else: it never follows
//! redirects on its own behalf and never retries.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Error;
use crate::request::RequestDescriptor;
use crate::response::RawResponse;

/// Transport selected for the compilation target
#[cfg(not(target_arch = "wasm32"))]
pub type DefaultTransport = crate::backends::ServerTransport;
/// Transport selected for the compilation target
#[cfg(target_arch = "wasm32")]
pub type DefaultTransport = crate::backends::BrowserTransport;

/// Sends a single request and returns the complete response
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait Transport: Send + Sync + Debug {
    /// Perform the exchange described by `request`
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, Error>;
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, Error> {
        (**self).send(request).await
    }
}
