//! Header and status handling for the XMLHttpRequest transport
//!
//! Kept free of `web_sys` so it builds and runs on the host too.

use url::Url;

use crate::error::Error;
use crate::response::RawResponse;

/// Headers the browser computes itself and refuses to take from scripts
const BROWSER_MANAGED_HEADERS: &[&str] = &[
    "accept-charset",
    "accept-encoding",
    "connection",
    "content-length",
    "cookie",
    "date",
    "host",
    "keep-alive",
    "origin",
    "referer",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "user-agent",
];

/// Whether `name` is left to the browser instead of being set on the XHR
pub fn is_browser_managed(name: &str) -> bool {
    BROWSER_MANAGED_HEADERS
        .iter()
        .any(|managed| managed.eq_ignore_ascii_case(name))
}

/// Reject the status `0` an XHR reports when no response arrived
pub fn check_status(status: u16, url: &Url) -> Result<u16, Error> {
    if status == 0 {
        return Err(Error::Connection(format!(
            "Request to {} was blocked or never answered",
            url
        )));
    }
    Ok(status)
}

/// Copy a `getAllResponseHeaders` block into `raw`
pub fn apply_header_block(raw: &mut RawResponse, block: &str) -> Result<(), Error> {
    for line in block.split("\r\n") {
        match line.split_once(':') {
            Some((name, value)) => raw.insert_header(name.trim(), value.trim()),
            None if line.trim().is_empty() => {}
            None => {
                return Err(Error::MalformedResponse(format!(
                    "invalid header line `{}`",
                    line
                )))
            }
        }
    }
    Ok(())
}
