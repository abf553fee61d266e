//! Request payloads for methods that send data.

use bytes::Bytes;

/// The body of an outgoing request.
///
/// Callers hand the transport one of three payload shapes: text, a raw
/// binary buffer, or structured form data that the backend serializes as
/// `application/x-www-form-urlencoded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    /// No body (GET, HEAD, DELETE).
    #[default]
    Empty,
    /// Text body.
    Text(String),
    /// Raw binary body.
    Bytes(Bytes),
    /// Structured form data as ordered name/value pairs.
    Form(Vec<(String, String)>),
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Vec<(String, String)>> for Payload {
    fn from(fields: Vec<(String, String)>) -> Self {
        Payload::Form(fields)
    }
}

impl Payload {
    /// Check if the payload carries no data.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Empty => true,
            Payload::Text(s) => s.is_empty(),
            Payload::Bytes(b) => b.is_empty(),
            Payload::Form(f) => f.is_empty(),
        }
    }

    /// Serialize the payload to wire bytes.
    ///
    /// Form payloads are URL-encoded; text and bytes pass through.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Empty => Bytes::new(),
            Payload::Text(s) => Bytes::from(s),
            Payload::Bytes(b) => b,
            Payload::Form(fields) => {
                let mut serializer = url::form_urlencoded::Serializer::new(String::new());
                for (name, value) in &fields {
                    serializer.append_pair(name, value);
                }
                Bytes::from(serializer.finish())
            }
        }
    }

    /// The content type implied by the payload shape, if any.
    pub fn implied_content_type(&self) -> Option<&'static str> {
        match self {
            Payload::Form(_) => Some("application/x-www-form-urlencoded"),
            _ => None,
        }
    }
}
