//! Isomorphic HTTP request client
//!
//! One call shape, `request(method, url, options)`, works the same on native
//! targets (backed by `reqwest`) and in the browser (backed by
//! `XMLHttpRequest`). The transport is picked at compile time.
//!
//! # Example
//!
//! ```no_run
//! use isoreq::{FormData, Options};
//!
//! # async fn example() -> Result<(), isoreq::Error> {
//! let res = isoreq::request(
//!     "GET",
//!     "http://localhost:3000/?foo=baz",
//!     Options::new().query("bar", "qux"),
//! )
//! .await?;
//! assert_eq!(res.status(), 200);
//!
//! let body = isoreq::request(
//!     "POST",
//!     "http://localhost:3000/form",
//!     Options::new().form(FormData::new().append("foo", "baz")),
//! )
//! .get_body(Some("utf8"))
//! .await?;
//! println!("{:?}", body.as_text());
//! # Ok(())
//! # }
//! ```

mod backends;
mod body;
mod client;
mod config;
mod error;
mod form;
mod options;
pub mod qs;
mod redirect;
mod request;
mod response;
mod transport;

#[cfg(target_arch = "wasm32")]
pub use backends::BrowserTransport;
#[cfg(not(target_arch = "wasm32"))]
pub use backends::ServerTransport;
pub use body::{resolve as resolve_body, BodySource, ResolvedBody};
pub use client::{request, request_value, Client, ClientBuilder};
pub use config::{ClientConfig, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};
pub use error::{Error, ErrorKind};
pub use form::{FormData, FormPart};
pub use options::{normalize, normalize_value, Options};
pub use qs::{QueryParams, QueryValue};
pub use redirect::{next_step, Step};
pub use request::{Headers, Method, RequestDescriptor};
pub use response::{Body, Encoding, PendingResponse, RawResponse, Response};
pub use transport::{DefaultTransport, Transport};
