use crate::base::neterror::TransportError;
use crate::base::progress::TransferProgress;
use crate::base::readystate::ReadyState;
use crate::http::requestbody::Payload;
use crate::http::responsebody::{ResponseBody, ResponseType};
use std::time::Duration;

/// An asynchronous notification from the underlying transport.
///
/// Notifications are delivered one at a time, in order, into
/// [`RequestTransport::notify`](crate::RequestTransport::notify).
/// `LoadEnd` is always the last notification for a request and arrives
/// after any `Error`, `Timeout` or `Abort` for the same request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Transfer progress changed.
    Progress(TransferProgress),
    /// The transport reported a network-level failure.
    Error(TransportError),
    /// The configured timeout elapsed.
    Timeout,
    /// The exchange was aborted.
    Abort,
    /// The exchange finished, successfully or not.
    LoadEnd,
}

/// The native HTTP request capability driven by a [`RequestTransport`].
///
/// Implementations record the request line, headers and flags, perform
/// the exchange when `send` is called, and expose the response through
/// the read accessors once notifications start arriving. The transport
/// never reimplements any of this; it only sequences calls and reacts to
/// notifications.
///
/// The accessors used during decoding are fallible so that a backing
/// store failure surfaces as a decode error rather than a panic.
pub trait NetworkHandle {
    /// Current lifecycle state. `send` is accepted only while `Unsent`.
    fn ready_state(&self) -> ReadyState;

    /// Record the request line. Always async semantics on the wire.
    fn open(&mut self, method: &str, url: &str);

    /// Set a single request header. Implementations may refuse
    /// individual headers (forbidden names); the caller treats that as
    /// per-header best effort.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError>;

    /// Configure the exchange timeout enforced by the handle.
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Configure whether ambient credentials accompany the request.
    fn set_with_credentials(&mut self, with_credentials: bool);

    /// Initiate the exchange. A synchronous failure here is routed by
    /// the transport through the same path as an asynchronous error
    /// notification.
    fn send(&mut self, payload: Payload) -> Result<(), TransportError>;

    /// Ask the handle to abort an in-flight exchange. Settlement still
    /// arrives through the `Abort` notification, never synchronously.
    fn abort(&mut self);

    /// Response status code; 0 until known (and for non-network schemes).
    fn status(&self) -> u16;

    /// Response status text; empty until known.
    fn status_text(&self) -> String;

    /// The raw response header block, or `None` when collection fails
    /// or no response was received.
    fn response_headers(&self) -> Option<String>;

    /// The declared decode mode for the response body.
    fn response_type(&self) -> ResponseType;

    /// Whether this handle decodes the body natively according to the
    /// declared response type. When false, JSON decoding falls to the
    /// transport.
    fn decodes_natively(&self) -> bool;

    /// The natively decoded response value, when the handle produced one.
    fn response(&self) -> Result<Option<ResponseBody>, TransportError>;

    /// The natively parsed document for `Xml` responses.
    fn response_xml(&self) -> Result<Option<ResponseBody>, TransportError>;

    /// The raw response body as text.
    fn response_text(&self) -> Result<String, TransportError>;
}
