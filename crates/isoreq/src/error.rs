//! HTTP error types

use thiserror::Error;

/// Errors that can occur while dispatching a request or reading its response
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid `method`, `url` or `options` argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Connection could not be established (refused, DNS failure, ...)
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// Any other I/O failure while talking to the remote end
    #[error("Transport error: {0}")]
    Transport(String),
    /// The remote end answered with something that is not HTTP
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// Redirect chain longer than the configured maximum
    #[error("Too many redirects (max {max}) while requesting {url}")]
    TooManyRedirects {
        /// Configured redirect limit
        max: u32,
        /// Location that would have been requested next
        url: String,
    },
    /// Unsupported body encoding name
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
    /// HTTP error with status code
    #[error("HTTP error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Client build error
    #[error("Client build error: {0}")]
    Build(String),
}

/// Coarse classification of [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller passed something unusable
    Argument,
    /// The exchange with the remote end failed
    Transport,
    /// Redirect limit exceeded
    Redirect,
    /// Body could not be decoded as requested
    Encoding,
    /// Non-success status surfaced by [`crate::Response::error_for_status`]
    Status,
    /// Body (de)serialization failed
    Serialization,
}

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::Argument,
            Error::Connection(_)
            | Error::Timeout
            | Error::Transport(_)
            | Error::MalformedResponse(_)
            | Error::Build(_) => ErrorKind::Transport,
            Error::TooManyRedirects { .. } => ErrorKind::Redirect,
            Error::InvalidEncoding(_) => ErrorKind::Encoding,
            Error::Status { .. } => ErrorKind::Status,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_builder() {
            Error::InvalidArgument(err.to_string())
        } else if err.is_connect() {
            Error::Connection(render_chain(&err))
        } else if let Some(cause) = malformed_cause(&err) {
            Error::MalformedResponse(cause)
        } else {
            Error::Transport(render_chain(&err))
        }
    }
}

/// Render an error with all of its sources, outermost first
#[cfg(not(target_arch = "wasm32"))]
fn render_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// hyper reports unparseable status lines and headers as `invalid HTTP ...`
#[cfg(not(target_arch = "wasm32"))]
fn malformed_cause(err: &(dyn std::error::Error + 'static)) -> Option<String> {
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if message.starts_with("invalid HTTP") || message == "message head is too large" {
            return Some(message);
        }
        source = cause.source();
    }
    None
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let error = Error::InvalidArgument("method must be a string".to_string());
        assert_eq!(
            format!("{}", error),
            "Invalid argument: method must be a string"
        );
        assert_eq!(error.kind(), ErrorKind::Argument);
    }

    #[test]
    fn test_connection_display() {
        let error = Error::Connection("connection refused".to_string());
        assert_eq!(format!("{}", error), "Connection error: connection refused");
        assert_eq!(error.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_timeout_display() {
        let error = Error::Timeout;
        assert_eq!(format!("{}", error), "Request timeout");
        assert_eq!(error.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_too_many_redirects_display() {
        let error = Error::TooManyRedirects {
            max: 3,
            url: "http://example.com/loop".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Too many redirects (max 3) while requesting http://example.com/loop"
        );
        assert_eq!(error.kind(), ErrorKind::Redirect);
    }

    #[test]
    fn test_invalid_encoding_display() {
        let error = Error::InvalidEncoding("utf32".to_string());
        assert_eq!(format!("{}", error), "Invalid encoding: utf32");
        assert_eq!(error.kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_status_display() {
        let error = Error::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(format!("{}", error), "HTTP error (404): Not Found");
        assert_eq!(error.kind(), ErrorKind::Status);
    }

    #[test]
    fn test_malformed_is_transport_kind() {
        let error = Error::MalformedResponse("invalid HTTP version parsed".to_string());
        assert_eq!(error.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_from_serde_json_error() {
        let result: Result<String, _> = serde_json::from_str("not valid json");
        let json_error = result.expect_err("Invalid JSON should produce an error");
        let error: Error = json_error.into();

        match error {
            Error::Serialization(msg) => {
                assert!(
                    msg.contains("expected"),
                    "Error message should describe JSON error"
                );
            }
            _ => panic!("Expected Error::Serialization"),
        }
    }
}
