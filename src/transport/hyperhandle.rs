//! The bundled network backend: a [`NetworkHandle`] over hyper's HTTP/1.1
//! client connection.
//!
//! One handle performs one exchange on a dedicated connection. The
//! exchange runs on a spawned task that records the response into a
//! shared slot and pushes notifications into an unbounded channel; the
//! owner drains that channel into
//! [`RequestTransport::notify`](crate::RequestTransport::notify).
//! `LoadEnd` is always the final notification, after any
//! `Error`/`Timeout`/`Abort`. No pooling, no redirects, no TLS.

use crate::base::neterror::TransportError;
use crate::base::progress::TransferProgress;
use crate::base::readystate::ReadyState;
use crate::http::requestbody::Payload;
use crate::http::responsebody::{ResponseBody, ResponseType};
use crate::transport::handle::{NetworkHandle, TransportEvent};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use url::Url;

/// Response fields filled in by the exchange task.
#[derive(Debug, Default)]
struct ResponseSlot {
    ready_state: ReadyState,
    status: u16,
    status_text: String,
    header_block: Option<String>,
    body: Vec<u8>,
}

fn lock(slot: &Arc<Mutex<ResponseSlot>>) -> MutexGuard<'_, ResponseSlot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A single-exchange HTTP/1.1 handle on the hyper stack.
pub struct HyperHandle {
    slot: Arc<Mutex<ResponseSlot>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    method: String,
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    timeout: Option<Duration>,
    with_credentials: bool,
    response_type: ResponseType,
    abort: Option<oneshot::Sender<()>>,
}

impl HyperHandle {
    /// Create a handle plus the notification stream its exchange task
    /// feeds.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let handle = Self {
            slot: Arc::new(Mutex::new(ResponseSlot::default())),
            events,
            method: "GET".to_string(),
            url: String::new(),
            headers: Vec::new(),
            timeout: None,
            with_credentials: false,
            response_type: ResponseType::Default,
            abort: None,
        };
        (handle, events_rx)
    }

    /// Declare the decode mode for the response body. The handle itself
    /// never decodes; the transport does, keyed on this value.
    pub fn set_response_type(&mut self, response_type: ResponseType) {
        self.response_type = response_type;
    }
}

impl NetworkHandle for HyperHandle {
    fn ready_state(&self) -> ReadyState {
        lock(&self.slot).ready_state
    }

    fn open(&mut self, method: &str, url: &str) {
        self.method = method.to_string();
        self.url = url.to_string();
        lock(&self.slot).ready_state = ReadyState::Opened;
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        let name = name
            .parse::<HeaderName>()
            .map_err(|_| TransportError::InvalidHeader)?;
        let value = HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader)?;
        // Last write wins for a repeated name, order otherwise preserved.
        if let Some((_, v)) = self.headers.iter_mut().find(|(n, _)| *n == name) {
            *v = value;
        } else {
            self.headers.push((name, value));
        }
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn set_with_credentials(&mut self, with_credentials: bool) {
        self.with_credentials = with_credentials;
    }

    fn send(&mut self, payload: Payload) -> Result<(), TransportError> {
        let url = Url::parse(&self.url).map_err(|_| TransportError::InvalidUrl)?;
        if url.scheme() != "http" {
            return Err(TransportError::Network(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or(TransportError::InvalidUrl)?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.clone(),
        };
        let mut target = url.path().to_string();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }

        let method = http::Method::from_bytes(self.method.as_bytes())
            .map_err(|_| TransportError::Network(format!("invalid method: {}", self.method)))?;
        let implied_content_type = payload.implied_content_type();
        let mut header_map = http::HeaderMap::with_capacity(self.headers.len() + 2);
        if !self.headers.iter().any(|(n, _)| *n == HOST) {
            let authority = HeaderValue::from_str(&authority)
                .map_err(|_| TransportError::InvalidUrl)?;
            header_map.insert(HOST, authority);
        }
        for (name, value) in &self.headers {
            header_map.append(name.clone(), value.clone());
        }
        if let Some(content_type) = implied_content_type {
            if !header_map.contains_key(CONTENT_TYPE) {
                header_map.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }
        let mut request = http::Request::builder()
            .method(method)
            .uri(target)
            .body(Full::new(payload.into_bytes()))
            .map_err(|e| TransportError::Network(e.to_string()))?;
        *request.headers_mut() = header_map;

        if self.with_credentials {
            tracing::debug!("with_credentials set; this backend sends no ambient credentials");
        }

        let (abort_tx, abort_rx) = oneshot::channel();
        self.abort = Some(abort_tx);
        lock(&self.slot).ready_state = ReadyState::Loading;
        tokio::spawn(run_exchange(
            request,
            host,
            port,
            self.slot.clone(),
            self.events.clone(),
            self.timeout,
            abort_rx,
        ));
        Ok(())
    }

    fn abort(&mut self) {
        if let Some(abort) = self.abort.take() {
            let _ = abort.send(());
        }
    }

    fn status(&self) -> u16 {
        lock(&self.slot).status
    }

    fn status_text(&self) -> String {
        lock(&self.slot).status_text.clone()
    }

    fn response_headers(&self) -> Option<String> {
        lock(&self.slot).header_block.clone()
    }

    fn response_type(&self) -> ResponseType {
        self.response_type
    }

    fn decodes_natively(&self) -> bool {
        false
    }

    fn response(&self) -> Result<Option<ResponseBody>, TransportError> {
        let slot = lock(&self.slot);
        let native = match self.response_type {
            ResponseType::Blob | ResponseType::ArrayBuffer => {
                Some(ResponseBody::Bytes(Bytes::from(slot.body.clone())))
            }
            ResponseType::Document => {
                Some(ResponseBody::Xml(
                    String::from_utf8_lossy(&slot.body).into_owned(),
                ))
            }
            _ => None,
        };
        Ok(native)
    }

    fn response_xml(&self) -> Result<Option<ResponseBody>, TransportError> {
        let slot = lock(&self.slot);
        if slot.body.is_empty() {
            return Ok(None);
        }
        Ok(Some(ResponseBody::Xml(
            String::from_utf8_lossy(&slot.body).into_owned(),
        )))
    }

    fn response_text(&self) -> Result<String, TransportError> {
        Ok(String::from_utf8_lossy(&lock(&self.slot).body).into_owned())
    }
}

/// Run one exchange to completion, emitting notifications along the way.
async fn run_exchange(
    request: http::Request<Full<Bytes>>,
    host: String,
    port: u16,
    slot: Arc<Mutex<ResponseSlot>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    timeout: Option<Duration>,
    mut abort_rx: oneshot::Receiver<()>,
) {
    let exchange = exchange(request, host, port, slot.clone(), events.clone());
    tokio::select! {
        aborted = &mut abort_rx => {
            if aborted.is_ok() {
                let _ = events.send(TransportEvent::Abort);
            }
            // Sender dropped without an abort: the transport is gone
            // and nobody is listening; stop quietly.
        }
        timed_out = async {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, exchange).await.is_err(),
                None => {
                    exchange.await;
                    false
                }
            }
        } => {
            if timed_out {
                let _ = events.send(TransportEvent::Timeout);
            }
        }
    }
    lock(&slot).ready_state = ReadyState::Done;
    let _ = events.send(TransportEvent::LoadEnd);
}

async fn exchange(
    request: http::Request<Full<Bytes>>,
    host: String,
    port: u16,
    slot: Arc<Mutex<ResponseSlot>>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let stream = match TcpStream::connect((host.as_str(), port)).await {
        Ok(stream) => stream,
        Err(error) => {
            let _ = events.send(TransportEvent::Error(TransportError::Network(
                error.to_string(),
            )));
            return;
        }
    };
    let io = TokioIo::new(stream);
    let (mut sender, conn) = match http1::handshake(io).await {
        Ok(pair) => pair,
        Err(error) => {
            let _ = events.send(TransportEvent::Error(TransportError::Network(
                error.to_string(),
            )));
            return;
        }
    };
    // Connection driver; ends when the exchange does.
    tokio::spawn(async move {
        if let Err(error) = conn.await {
            tracing::debug!(%error, "connection task ended with error");
        }
    });

    let response = match sender.send_request(request).await {
        Ok(response) => response,
        Err(error) => {
            let _ = events.send(TransportEvent::Error(TransportError::Network(
                error.to_string(),
            )));
            return;
        }
    };
    let (parts, mut body) = response.into_parts();
    let total = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    {
        let mut slot = lock(&slot);
        slot.status = parts.status.as_u16();
        slot.status_text = parts
            .status
            .canonical_reason()
            .unwrap_or_default()
            .to_string();
        slot.header_block = Some(format_header_block(&parts.headers));
    }

    let mut loaded = 0u64;
    let mut collected = Vec::new();
    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                if let Some(chunk) = frame.data_ref() {
                    loaded += chunk.len() as u64;
                    collected.extend_from_slice(chunk);
                    let _ = events.send(TransportEvent::Progress(TransferProgress {
                        length_computable: total.is_some(),
                        loaded,
                        total: total.unwrap_or(0),
                    }));
                }
            }
            Err(error) => {
                let _ = events.send(TransportEvent::Error(TransportError::Network(
                    error.to_string(),
                )));
                return;
            }
        }
    }
    lock(&slot).body = collected;
}

/// Collect response headers into the raw block form, one
/// `name: value` line per header, CRLF separated.
fn format_header_block(headers: &http::HeaderMap) -> String {
    let mut block = String::new();
    for (name, value) in headers {
        if !block.is_empty() {
            block.push_str("\r\n");
        }
        block.push_str(name.as_str());
        block.push_str(": ");
        block.push_str(&String::from_utf8_lossy(value.as_bytes()));
    }
    block
}
