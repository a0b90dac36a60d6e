//! XMLHttpRequest-based transport for browser targets

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use tracing::trace;
use url::Url;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, XmlHttpRequest, XmlHttpRequestResponseType};

use super::xhr_headers::{apply_header_block, check_status, is_browser_managed};
use crate::error::Error;
use crate::request::RequestDescriptor;
use crate::response::RawResponse;
use crate::transport::Transport;

/// Transport backed by the host's `XMLHttpRequest`
///
/// Browsers follow redirects before the script sees the response, so this
/// transport only ever reports the final hop. Its URL comes from `responseURL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTransport;

impl BrowserTransport {
    /// Create the transport
    pub fn new() -> Result<Self, Error> {
        Ok(Self)
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Load,
    Error,
    Timeout,
    Abort,
}

fn js_error(context: &str, err: JsValue) -> Error {
    Error::Transport(format!("{}: {:?}", context, err))
}

#[async_trait::async_trait(?Send)]
impl Transport for BrowserTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, Error> {
        let xhr =
            XmlHttpRequest::new().map_err(|e| js_error("Failed to create XMLHttpRequest", e))?;
        xhr.open_with_async(request.method.as_ref(), request.url.as_str(), true)
            .map_err(|e| Error::InvalidArgument(format!("Failed to open request: {:?}", e)))?;
        xhr.set_response_type(XmlHttpRequestResponseType::Arraybuffer);
        if let Some(timeout) = request.timeout {
            xhr.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        }

        for (name, value) in request.headers.iter() {
            if is_browser_managed(name) {
                trace!(header = name, "Leaving header to the browser");
                continue;
            }
            xhr.set_request_header(name, value)
                .map_err(|e| Error::InvalidArgument(format!("Failed to set header: {:?}", e)))?;
        }

        let (tx, rx) = oneshot::channel::<Outcome>();
        let tx = Rc::new(RefCell::new(Some(tx)));
        let listener = |outcome: Outcome| {
            let tx = Rc::clone(&tx);
            Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(outcome);
                }
            })
        };
        let on_load = listener(Outcome::Load);
        let on_error = listener(Outcome::Error);
        let on_timeout = listener(Outcome::Timeout);
        let on_abort = listener(Outcome::Abort);
        xhr.set_onload(Some(on_load.as_ref().unchecked_ref()));
        xhr.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        xhr.set_ontimeout(Some(on_timeout.as_ref().unchecked_ref()));
        xhr.set_onabort(Some(on_abort.as_ref().unchecked_ref()));

        trace!(method = %request.method, url = %request.url, "Sending request");
        match &request.body {
            Some(body) => {
                let array = js_sys::Uint8Array::from(body.as_slice());
                xhr.send_with_opt_buffer_source(Some(&*array))
            }
            None => xhr.send(),
        }
        .map_err(|e| js_error("Failed to send request", e))?;

        let outcome = rx
            .await
            .map_err(|_| Error::Transport("XMLHttpRequest dropped before completing".into()))?;

        xhr.set_onload(None);
        xhr.set_onerror(None);
        xhr.set_ontimeout(None);
        xhr.set_onabort(None);
        drop((on_load, on_error, on_timeout, on_abort));

        match outcome {
            Outcome::Load => {}
            Outcome::Error => {
                return Err(Error::Connection(format!(
                    "Network error while requesting {}",
                    request.url
                )))
            }
            Outcome::Timeout => return Err(Error::Timeout),
            Outcome::Abort => return Err(Error::Transport("Request aborted".into())),
        }

        let status = xhr
            .status()
            .map_err(|e| js_error("Failed to read status", e))?;
        let status = check_status(status, &request.url)?;

        let url = Url::parse(&xhr.response_url()).unwrap_or_else(|_| request.url.clone());
        let mut raw = RawResponse::new(status, url);

        let headers = xhr
            .get_all_response_headers()
            .map_err(|e| js_error("Failed to read headers", e))?;
        apply_header_block(&mut raw, &headers)?;

        let body = xhr
            .response()
            .map_err(|e| js_error("Failed to read body", e))?;
        raw.body = js_sys::Uint8Array::new(&body).to_vec();
        trace!(status = raw.status, len = raw.body.len(), "Received response");

        Ok(raw)
    }
}
