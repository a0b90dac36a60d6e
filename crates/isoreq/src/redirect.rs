//! Redirect policy
//!
//! Every response moves a request either back to pending (a new hop against
//! the `Location` target) or to terminal.

use crate::error::Error;
use crate::request::{Method, RequestDescriptor};
use crate::response::RawResponse;

/// Headers that never travel to a different origin
const CREDENTIAL_HEADERS: &[&str] = &["authorization", "cookie", "proxy-authorization"];

/// What to do after a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Send this request next
    Redirect(RequestDescriptor),
    /// The response is final
    Terminal,
}

/// Decide whether `response` to `current` leads to another hop
///
/// `taken` is the number of redirects already followed for this call.
pub fn next_step(
    current: &RequestDescriptor,
    response: &RawResponse,
    taken: u32,
) -> Result<Step, Error> {
    if !current.follow_redirects || !(300..400).contains(&response.status) {
        return Ok(Step::Terminal);
    }
    let Some(location) = response.location() else {
        return Ok(Step::Terminal);
    };

    let target = current.url.join(location).map_err(|e| {
        Error::MalformedResponse(format!("invalid Location header `{}`: {}", location, e))
    })?;
    if taken >= current.max_redirects {
        return Err(Error::TooManyRedirects {
            max: current.max_redirects,
            url: target.to_string(),
        });
    }

    let mut next = current.clone();
    if response.status == 303 {
        if next.method != Method::Head {
            next.method = Method::Get;
        }
        next.body = None;
        next.headers.remove("content-type");
        next.headers.remove("content-length");
    }
    if target.origin() != current.url.origin() {
        for name in CREDENTIAL_HEADERS {
            next.headers.remove(name);
        }
    }
    next.url = target;

    Ok(Step::Redirect(next))
}
