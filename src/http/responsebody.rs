//! Decoded response bodies and the declared decode mode.

use bytes::Bytes;

/// The declared response type on an underlying handle.
///
/// Drives response-body decoding after load-end: the transport decodes
/// the raw body differently depending on what the handle was asked to
/// produce. `Default` behaves as `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    Json,
    Xml,
    Blob,
    Document,
    ArrayBuffer,
    Text,
    #[default]
    Default,
}

impl ResponseType {
    /// Parse the wire name of a response type. Unknown names fall back
    /// to `Default`, matching how unset attributes behave.
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => ResponseType::Json,
            "xml" => ResponseType::Xml,
            "blob" => ResponseType::Blob,
            "document" => ResponseType::Document,
            "arraybuffer" => ResponseType::ArrayBuffer,
            "text" => ResponseType::Text,
            _ => ResponseType::Default,
        }
    }
}

/// A decoded response body.
///
/// The variant reflects what decoding produced, not what was requested:
/// a handle that decodes natively may return any of these for any
/// declared type, and the transport passes native values through
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Structured JSON value.
    Json(serde_json::Value),
    /// Raw or decoded text.
    Text(String),
    /// Opaque binary payload (blob / arraybuffer).
    Bytes(Bytes),
    /// A parsed markup document, kept in source form.
    Xml(String),
}

impl ResponseBody {
    /// Borrow the textual content, when the body has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) | ResponseBody::Xml(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the JSON value, when the body is structured.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }
}
