use crate::base::neterror::TransportError;
use crate::http::responsebody::{ResponseBody, ResponseType};
use crate::transport::handle::NetworkHandle;

/// Decode the response body of a finished exchange.
///
/// Dispatches on the handle's declared response type. `Ok(None)` is a
/// valid outcome: an empty native value, or the JSON fallback parse
/// giving up on a malformed body. Any accessor failure is wrapped into
/// [`TransportError::Parse`] and settled through the failure path by the
/// caller, bypassing the load-end success evaluation.
pub fn parse_response<H: NetworkHandle>(handle: &H) -> Result<Option<ResponseBody>, TransportError> {
    decode(handle).map_err(|e| TransportError::Parse(e.to_string()))
}

fn decode<H: NetworkHandle>(handle: &H) -> Result<Option<ResponseBody>, TransportError> {
    match handle.response_type() {
        ResponseType::Json => {
            // A handle with native decoding already parsed the body for
            // us; its value passes through verbatim, whatever its shape.
            if handle.decodes_natively() {
                if let Some(native) = handle.response()? {
                    return Ok(Some(native));
                }
            }
            let text = handle.response_text()?;
            match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(ResponseBody::Json(value))),
                Err(error) => {
                    // A body that fails to parse becomes a null body,
                    // not a failed request. Callers rely on the
                    // recoverable null.
                    tracing::warn!(%error, "failed to parse JSON response body");
                    Ok(None)
                }
            }
        }
        ResponseType::Xml => handle.response_xml(),
        ResponseType::Blob | ResponseType::Document | ResponseType::ArrayBuffer => {
            handle.response()
        }
        ResponseType::Text | ResponseType::Default => {
            Ok(Some(ResponseBody::Text(handle.response_text()?)))
        }
    }
}
