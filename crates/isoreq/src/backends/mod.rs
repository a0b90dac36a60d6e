//! Transport backends

#[cfg(not(target_arch = "wasm32"))]
pub mod reqwest_backend;

#[cfg(target_arch = "wasm32")]
pub mod xhr_backend;
#[cfg(any(target_arch = "wasm32", test))]
mod xhr_headers;

#[cfg(not(target_arch = "wasm32"))]
pub use reqwest_backend::ServerTransport;
#[cfg(target_arch = "wasm32")]
pub use xhr_backend::BrowserTransport;
