use thiserror::Error;

/// Errors surfaced through a request's completion signal.
///
/// Every terminal outcome of a request lifecycle maps to exactly one of
/// these variants. The display strings are part of the public contract:
/// host applications match on them when rendering request results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying transport reported a network-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The underlying transport exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request was aborted, either by the caller or by the
    /// underlying transport.
    #[error("Request aborted")]
    Aborted,

    /// The exchange completed but the status code was outside the
    /// success range.
    #[error("The request failed with status code: {0}")]
    HttpStatus(u16),

    /// Response decoding raised.
    #[error("Could not parse response. {0}")]
    Parse(String),

    /// The request URL could not be parsed.
    #[error("Invalid URL")]
    InvalidUrl,

    /// A header name or value was refused by the underlying transport.
    /// Swallowed during header application; never fails a request.
    #[error("invalid header")]
    InvalidHeader,
}

impl TransportError {
    /// True for failures where the exchange never produced response
    /// headers (timeout and abort paths).
    pub fn is_terminated_early(&self) -> bool {
        matches!(self, TransportError::Timeout | TransportError::Aborted)
    }

    /// True when the failure is an out-of-range HTTP status code.
    pub fn is_http_status(&self) -> bool {
        matches!(self, TransportError::HttpStatus(_))
    }
}
