//! Request body resolution

use crate::form::FormData;
use crate::request::Headers;

/// The body option selected for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    /// Already serialized JSON text
    Json(Vec<u8>),
    /// Multipart form
    Form(FormData),
    /// Raw bytes, sent unchanged
    Raw(Vec<u8>),
}

/// Transport-ready body bytes plus the headers describing them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBody {
    /// Encoded body
    pub bytes: Vec<u8>,
    /// `Content-Type` (when implied) and `Content-Length`
    pub headers: Headers,
}

/// Encode `source` and derive its content headers
pub fn resolve(source: BodySource) -> ResolvedBody {
    let mut headers = Headers::new();
    let bytes = match source {
        BodySource::Json(bytes) => {
            headers.set("Content-Type", "application/json");
            bytes
        }
        BodySource::Form(form) => {
            let (boundary, bytes) = form.encode();
            headers.set(
                "Content-Type",
                format!("multipart/form-data; boundary={}", boundary),
            );
            bytes
        }
        BodySource::Raw(bytes) => bytes,
    };
    headers.set("Content-Length", bytes.len().to_string());

    ResolvedBody { bytes, headers }
}
