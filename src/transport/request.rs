use crate::base::neterror::TransportError;
use crate::base::progress::TransferProgress;
use crate::http::headers::merge_headers;
use crate::http::proxy::rewrite_url;
use crate::http::requestbody::Payload;
use crate::http::responsebody::ResponseBody;
use crate::transport::decode::parse_response;
use crate::transport::handle::{NetworkHandle, TransportEvent};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

/// A caller-supplied request description, immutable per call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// The URL to which the request is sent.
    pub url: String,
    /// HTTP method; GET when absent.
    pub method: Option<String>,
    /// Raw request header block, `name: value` lines.
    pub headers: Option<String>,
    /// Request body.
    pub payload: Payload,
    /// Whether ambient credentials accompany the request.
    pub with_credentials: bool,
    /// Exchange timeout enforced by the underlying handle.
    pub timeout: Option<Duration>,
    /// Opaque correlation token, surfaced only in logs.
    pub id: Option<String>,
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Component-level configuration, read once at `send()` time.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Raw header block injected into every request; wins over caller
    /// headers on name conflicts. Accepts the literal `\n` separator
    /// used by attribute-delivered configuration.
    pub append_headers: Option<String>,
    /// Proxy endpoint prefix applied to every request URL.
    pub proxy: Option<String>,
    /// Percent-encode the URL before appending it to the proxy prefix.
    pub proxy_encode_url: bool,
}

/// Observable per-request state, owned exclusively by one transport and
/// never reused across requests.
#[derive(Debug, Default)]
struct TransportState {
    response: Option<ResponseBody>,
    headers: Option<String>,
    status: u16,
    status_text: String,
    progress: Option<TransferProgress>,
    aborted: bool,
    errored: bool,
    timed_out: bool,
}

/// The success payload of a settled completion.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// Decoded response body; `None` for an empty or unrecoverable body.
    pub response: Option<ResponseBody>,
    /// Raw response header block, when collection succeeded.
    pub headers: Option<String>,
}

/// The failure payload of a settled completion.
///
/// Carries the observable snapshot of the underlying handle at the time
/// of failure. `headers` is present for error and load-end failures and
/// absent for timeout and abort, where the exchange never got far enough
/// to produce response headers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct TransportFailure {
    pub error: TransportError,
    pub status: u16,
    pub status_text: String,
    pub headers: Option<String>,
}

/// The settled outcome of one request.
pub type RequestResult = Result<TransportResponse, TransportFailure>;

/// A single-resolution completion signal.
///
/// Settles exactly once; every terminal lifecycle path settles it and
/// later attempts are silent no-ops. Dropping the transport without
/// settlement resolves the future with an abort failure.
#[derive(Debug)]
pub struct Completes {
    rx: oneshot::Receiver<RequestResult>,
}

impl Future for Completes {
    type Output = RequestResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(TransportFailure {
                error: TransportError::Aborted,
                status: 0,
                status_text: String::new(),
                headers: None,
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}

type ProgressObserver = Box<dyn FnMut(TransferProgress) + Send>;

/// A single-request transport: owns one underlying handle and one
/// pending completion.
///
/// The lifecycle is `idle -> sent -> {progress}* -> terminal`, where the
/// terminal states are success, network error, timeout and abort. All
/// state mutation and settlement happen inside [`notify`], which the
/// owner of the notification source calls once per notification, in
/// order. A used instance is never reused; construct a new transport for
/// the next request.
///
/// [`notify`]: RequestTransport::notify
pub struct RequestTransport<H: NetworkHandle> {
    handle: H,
    config: TransportConfig,
    state: TransportState,
    settle: Option<oneshot::Sender<RequestResult>>,
    completes: Option<Completes>,
    progress_observer: Option<ProgressObserver>,
}

impl<H: NetworkHandle> RequestTransport<H> {
    pub fn new(handle: H) -> Self {
        Self::with_config(handle, TransportConfig::default())
    }

    pub fn with_config(handle: H, config: TransportConfig) -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            handle,
            config,
            state: TransportState::default(),
            settle: Some(tx),
            completes: Some(Completes { rx }),
            progress_observer: None,
        }
    }

    /// Register an observer called on every progress update. Progress
    /// observation is independent of the completion signal.
    pub fn set_progress_observer(&mut self, observer: ProgressObserver) {
        self.progress_observer = Some(observer);
    }

    /// Send a request.
    ///
    /// Accepted only while the underlying handle is unsent; a second
    /// call against an already-open handle returns `None` without any
    /// effect. Otherwise composes headers, rewrites the URL for the
    /// configured proxy, opens and initiates the underlying request,
    /// and returns the completion signal. A synchronous failure during
    /// initiation is routed through the same path as an asynchronous
    /// error notification, so the returned completion is already
    /// rejected rather than an error being raised here.
    pub fn send(&mut self, options: &RequestOptions) -> Option<Completes> {
        if !self.handle.ready_state().accepts_send() {
            return None;
        }
        let method = options.method.as_deref().unwrap_or("GET");
        let url = rewrite_url(
            &options.url,
            self.config.proxy.as_deref(),
            self.config.proxy_encode_url,
        );
        tracing::debug!(
            method,
            url = %url,
            id = options.id.as_deref().unwrap_or(""),
            "sending request"
        );
        self.handle.open(method, &url);
        self.apply_headers(options.headers.as_deref());
        self.handle.set_timeout(options.timeout);
        self.handle.set_with_credentials(options.with_credentials);
        if let Err(error) = self.handle.send(options.payload.clone()) {
            self.on_error(error);
        }
        self.completes.take()
    }

    /// Abort the request.
    ///
    /// Fire-and-forget: the underlying handle's own abort notification
    /// drives settlement, so callers must not assume the completion is
    /// settled when this returns.
    pub fn abort(&mut self) {
        self.state.aborted = true;
        self.handle.abort();
    }

    /// Deliver one notification from the underlying transport.
    pub fn notify(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Progress(progress) => self.on_progress(progress),
            TransportEvent::Error(error) => self.on_error(error),
            TransportEvent::Timeout => self.on_timeout(),
            TransportEvent::Abort => self.on_abort(),
            TransportEvent::LoadEnd => self.on_load_end(),
        }
    }

    /// Whether the request succeeded: loaded without error, not aborted
    /// or timed out, and the status code in the success range. Status 0
    /// counts as success because non-network schemes never report one.
    pub fn succeeded(&self) -> bool {
        if self.state.errored || self.state.aborted || self.state.timed_out {
            return false;
        }
        let status = self.handle.status();
        status == 0 || (200..300).contains(&status)
    }

    /// Whether the completion has been settled.
    pub fn settled(&self) -> bool {
        self.settle.is_none()
    }

    pub fn response(&self) -> Option<&ResponseBody> {
        self.state.response.as_ref()
    }

    pub fn headers(&self) -> Option<&str> {
        self.state.headers.as_deref()
    }

    pub fn status(&self) -> u16 {
        self.state.status
    }

    pub fn status_text(&self) -> &str {
        &self.state.status_text
    }

    pub fn progress(&self) -> Option<TransferProgress> {
        self.state.progress
    }

    pub fn aborted(&self) -> bool {
        self.state.aborted
    }

    pub fn errored(&self) -> bool {
        self.state.errored
    }

    pub fn timed_out(&self) -> bool {
        self.state.timed_out
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Apply the configured fixed headers and the caller's request
    /// headers to the handle. Application is best effort per header: a
    /// rejected header is logged and skipped, never failing the request.
    fn apply_headers(&mut self, caller_block: Option<&str>) {
        let entries = merge_headers(self.config.append_headers.as_deref(), caller_block);
        for entry in &entries {
            if let Err(error) = self.handle.set_header(&entry.name, &entry.value) {
                tracing::warn!(
                    name = %entry.name,
                    value = %entry.value,
                    %error,
                    "header rejected by transport, skipping"
                );
            }
        }
    }

    fn on_progress(&mut self, progress: TransferProgress) {
        if self.state.aborted {
            return;
        }
        self.state.progress = Some(progress);
        if let Some(observer) = self.progress_observer.as_mut() {
            observer(progress);
        }
    }

    fn on_error(&mut self, error: TransportError) {
        // An abort in flight suppresses a concurrently arriving error.
        if self.state.aborted {
            return;
        }
        self.state.errored = true;
        self.update_status();
        self.state.headers = self.handle.response_headers();
        let failure = self.failure(error, self.state.headers.clone());
        self.reject(failure);
    }

    fn on_timeout(&mut self) {
        self.state.timed_out = true;
        self.update_status();
        // No headers: the exchange never completed far enough.
        let failure = self.failure(TransportError::Timeout, None);
        self.reject(failure);
    }

    fn on_abort(&mut self) {
        self.state.aborted = true;
        self.update_status();
        let failure = self.failure(TransportError::Aborted, None);
        self.reject(failure);
    }

    fn on_load_end(&mut self) {
        // Those paths already settled; load-end arrives last and must
        // not re-trigger work.
        if self.state.aborted || self.state.timed_out {
            return;
        }
        self.update_status();
        self.state.headers = self.handle.response_headers();
        match parse_response(&self.handle) {
            Ok(body) => self.state.response = body,
            Err(error) => {
                let failure = self.failure(error, self.state.headers.clone());
                self.reject(failure);
                return;
            }
        }
        if self.succeeded() {
            let response = TransportResponse {
                response: self.state.response.clone(),
                headers: self.state.headers.clone(),
            };
            self.resolve(response);
        } else {
            let failure = self.failure(
                TransportError::HttpStatus(self.handle.status()),
                self.state.headers.clone(),
            );
            self.reject(failure);
        }
    }

    fn update_status(&mut self) {
        self.state.status = self.handle.status();
        self.state.status_text = self.handle.status_text();
    }

    fn failure(&self, error: TransportError, headers: Option<String>) -> TransportFailure {
        TransportFailure {
            error,
            status: self.state.status,
            status_text: self.state.status_text.clone(),
            headers,
        }
    }

    fn resolve(&mut self, response: TransportResponse) {
        if let Some(tx) = self.settle.take() {
            let _ = tx.send(Ok(response));
        }
    }

    fn reject(&mut self, failure: TransportFailure) {
        if let Some(tx) = self.settle.take() {
            let _ = tx.send(Err(failure));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::readystate::ReadyState;
    use crate::http::headers::HeaderEntry;
    use crate::http::responsebody::ResponseType;
    use crate::transport::testing::FakeHandle;
    use std::sync::{Arc, Mutex};

    fn transport_with(handle: FakeHandle) -> RequestTransport<FakeHandle> {
        RequestTransport::new(handle)
    }

    #[tokio::test]
    async fn test_success_lifecycle() {
        let mut handle = FakeHandle::new();
        handle.status = 200;
        handle.status_text = "OK".to_string();
        handle.text = "test".to_string();
        handle.header_block = Some("content-type: text/plain".to_string());
        let mut transport = transport_with(handle);

        let completes = transport
            .send(&RequestOptions::new("http://success.domain.com/"))
            .unwrap();
        transport.notify(TransportEvent::LoadEnd);

        let result = completes.await.unwrap();
        assert_eq!(result.response, Some(ResponseBody::Text("test".to_string())));
        assert_eq!(result.headers.as_deref(), Some("content-type: text/plain"));
        assert_eq!(transport.status(), 200);
        assert_eq!(transport.status_text(), "OK");
        assert!(transport.settled());
    }

    #[tokio::test]
    async fn test_status_zero_is_success() {
        let mut handle = FakeHandle::new();
        handle.status = 0;
        handle.text = "local".to_string();
        let mut transport = transport_with(handle);
        let completes = transport.send(&RequestOptions::new("file:///data")).unwrap();
        transport.notify(TransportEvent::LoadEnd);
        assert!(completes.await.is_ok());
    }

    #[tokio::test]
    async fn test_status_250_is_success() {
        let mut handle = FakeHandle::new();
        handle.status = 250;
        let mut transport = transport_with(handle);
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.notify(TransportEvent::LoadEnd);
        assert!(completes.await.is_ok());
    }

    #[tokio::test]
    async fn test_status_404_fails_with_message() {
        let mut handle = FakeHandle::new();
        handle.status = 404;
        handle.status_text = "Not Found".to_string();
        handle.header_block = Some("x-srv: 1".to_string());
        let mut transport = transport_with(handle);
        let completes = transport
            .send(&RequestOptions::new("http://error.domain.com/404"))
            .unwrap();
        transport.notify(TransportEvent::LoadEnd);

        let failure = completes.await.unwrap_err();
        assert_eq!(
            failure.error.to_string(),
            "The request failed with status code: 404"
        );
        assert_eq!(failure.status, 404);
        assert_eq!(failure.headers.as_deref(), Some("x-srv: 1"));
    }

    #[tokio::test]
    async fn test_send_on_open_handle_is_noop() {
        let mut handle = FakeHandle::new();
        handle.ready_state = ReadyState::Opened;
        let mut transport = transport_with(handle);
        assert!(transport.send(&RequestOptions::new("http://t/")).is_none());
        assert!(transport.handle().opened_with.is_none());
        assert!(transport.handle().sent_payload.is_none());
        assert!(!transport.settled());
    }

    #[tokio::test]
    async fn test_error_notification_rejects_and_captures_headers() {
        let mut handle = FakeHandle::new();
        handle.status = 0;
        handle.header_block = Some("x-h: 1".to_string());
        let mut transport = transport_with(handle);
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.notify(TransportEvent::Error(TransportError::Network(
            "connection reset".to_string(),
        )));

        assert!(transport.errored());
        assert_eq!(transport.headers(), Some("x-h: 1"));
        let failure = completes.await.unwrap_err();
        assert!(matches!(failure.error, TransportError::Network(_)));
        assert_eq!(failure.headers.as_deref(), Some("x-h: 1"));
    }

    #[tokio::test]
    async fn test_timeout_rejects_without_headers() {
        let mut handle = FakeHandle::new();
        handle.header_block = Some("x-h: 1".to_string());
        let mut transport = transport_with(handle);
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.notify(TransportEvent::Timeout);
        transport.notify(TransportEvent::LoadEnd);

        assert!(transport.timed_out());
        // Load-end after timeout is a no-op: no decode happened.
        assert!(transport.response().is_none());
        let failure = completes.await.unwrap_err();
        assert_eq!(failure.error, TransportError::Timeout);
        assert!(failure.headers.is_none());
    }

    #[tokio::test]
    async fn test_abort_notification_rejects_with_abort_error() {
        let mut transport = transport_with(FakeHandle::new());
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.notify(TransportEvent::Abort);
        transport.notify(TransportEvent::LoadEnd);

        assert!(transport.aborted());
        let failure = completes.await.unwrap_err();
        assert_eq!(failure.error.to_string(), "Request aborted");
        assert!(failure.headers.is_none());
    }

    #[tokio::test]
    async fn test_abort_suppresses_subsequent_error() {
        let mut handle = FakeHandle::new();
        handle.header_block = Some("x-h: 1".to_string());
        let mut transport = transport_with(handle);
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.notify(TransportEvent::Abort);
        transport.notify(TransportEvent::Error(TransportError::Network(
            "late error".to_string(),
        )));

        // The error must not settle, flip errored, or capture headers.
        assert!(!transport.errored());
        assert!(transport.headers().is_none());
        let failure = completes.await.unwrap_err();
        assert_eq!(failure.error, TransportError::Aborted);
    }

    #[tokio::test]
    async fn test_settlement_is_idempotent_under_late_notifications() {
        let mut handle = FakeHandle::new();
        handle.status = 200;
        handle.text = "first".to_string();
        let mut transport = transport_with(handle);
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.notify(TransportEvent::LoadEnd);
        transport.notify(TransportEvent::Error(TransportError::Network(
            "late".to_string(),
        )));
        transport.notify(TransportEvent::LoadEnd);

        let result = completes.await.unwrap();
        assert_eq!(result.response, Some(ResponseBody::Text("first".to_string())));
    }

    #[tokio::test]
    async fn test_progress_updates_state_and_observer() {
        let mut transport = transport_with(FakeHandle::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        transport.set_progress_observer(Box::new(move |p| {
            sink.lock().unwrap().push(p);
        }));
        let _completes = transport.send(&RequestOptions::new("http://t/")).unwrap();

        let progress = TransferProgress {
            length_computable: true,
            loaded: 10,
            total: 100,
        };
        transport.notify(TransportEvent::Progress(progress));
        assert_eq!(transport.progress(), Some(progress));
        assert_eq!(*seen.lock().unwrap(), vec![progress]);
    }

    #[tokio::test]
    async fn test_progress_ignored_after_abort() {
        let mut transport = transport_with(FakeHandle::new());
        let _completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.notify(TransportEvent::Abort);
        transport.notify(TransportEvent::Progress(TransferProgress {
            length_computable: true,
            loaded: 1,
            total: 2,
        }));
        assert!(transport.progress().is_none());
    }

    #[tokio::test]
    async fn test_synchronous_send_failure_routes_to_error_path() {
        let mut handle = FakeHandle::new();
        handle.fail_send = true;
        let mut transport = transport_with(handle);
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();

        assert!(transport.errored());
        let failure = completes.await.unwrap_err();
        assert!(matches!(failure.error, TransportError::Network(_)));
    }

    #[tokio::test]
    async fn test_fixed_headers_shadow_caller_headers() {
        let handle = FakeHandle::new();
        let config = TransportConfig {
            append_headers: Some("x-a: test1\\nx-b: test2".to_string()),
            ..TransportConfig::default()
        };
        let mut transport = RequestTransport::with_config(handle, config);
        let mut options = RequestOptions::new("http://t/");
        options.headers = Some("x-a: test3".to_string());
        let _completes = transport.send(&options).unwrap();

        assert_eq!(
            transport.handle().applied_headers,
            vec![
                HeaderEntry::new("x-a", "test1"),
                HeaderEntry::new("x-b", "test2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_caller_headers_union_with_fixed() {
        let handle = FakeHandle::new();
        let config = TransportConfig {
            append_headers: Some("x-a: test1\\nx-b: test2".to_string()),
            ..TransportConfig::default()
        };
        let mut transport = RequestTransport::with_config(handle, config);
        let mut options = RequestOptions::new("http://t/");
        options.headers = Some("accept: application/json\nx-test:true".to_string());
        let _completes = transport.send(&options).unwrap();

        assert_eq!(
            transport.handle().applied_headers,
            vec![
                HeaderEntry::new("x-a", "test1"),
                HeaderEntry::new("x-b", "test2"),
                HeaderEntry::new("accept", "application/json"),
                HeaderEntry::new("x-test", "true"),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_header_does_not_fail_request() {
        let mut handle = FakeHandle::new();
        handle.rejected_header_names = vec!["host".to_string()];
        handle.status = 200;
        handle.text = "ok".to_string();
        let mut transport = transport_with(handle);
        let mut options = RequestOptions::new("http://t/");
        options.headers = Some("host: evil\nx-ok: 1".to_string());
        let completes = transport.send(&options).unwrap();

        assert_eq!(
            transport.handle().applied_headers,
            vec![HeaderEntry::new("x-ok", "1")]
        );
        transport.notify(TransportEvent::LoadEnd);
        assert!(completes.await.is_ok());
    }

    #[tokio::test]
    async fn test_proxy_rewrite_applied_on_send() {
        let handle = FakeHandle::new();
        let config = TransportConfig {
            proxy: Some("https://api.domain.com/endpoint?url=".to_string()),
            proxy_encode_url: true,
            ..TransportConfig::default()
        };
        let mut transport = RequestTransport::with_config(handle, config);
        let _completes = transport.send(&RequestOptions::new("http://test.com")).unwrap();

        let (method, url) = transport.handle().opened_with.clone().unwrap();
        assert_eq!(method, "GET");
        assert_eq!(url, "https://api.domain.com/endpoint?url=http%3A%2F%2Ftest.com");
    }

    #[tokio::test]
    async fn test_options_are_forwarded_to_handle() {
        let handle = FakeHandle::new();
        let mut transport = transport_with(handle);
        let mut options = RequestOptions::new("http://t/");
        options.method = Some("POST".to_string());
        options.payload = Payload::from("body");
        options.with_credentials = true;
        options.timeout = Some(Duration::from_millis(2500));
        let _completes = transport.send(&options).unwrap();

        let handle = transport.handle();
        assert_eq!(handle.opened_with.as_ref().unwrap().0, "POST");
        assert_eq!(handle.sent_payload, Some(Payload::Text("body".to_string())));
        assert!(handle.with_credentials);
        assert_eq!(handle.timeout, Some(Duration::from_millis(2500)));
    }

    #[tokio::test]
    async fn test_malformed_json_settles_success_with_null_body() {
        let mut handle = FakeHandle::new();
        handle.status = 200;
        handle.response_type = ResponseType::Json;
        handle.text = "{not json".to_string();
        let mut transport = transport_with(handle);
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.notify(TransportEvent::LoadEnd);

        let result = completes.await.unwrap();
        assert!(result.response.is_none());
    }

    #[tokio::test]
    async fn test_decode_failure_rejects_with_parse_error() {
        let mut handle = FakeHandle::new();
        handle.status = 200;
        handle.fail_accessors = true;
        handle.header_block = Some("x-h: 1".to_string());
        let mut transport = transport_with(handle);
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.notify(TransportEvent::LoadEnd);

        let failure = completes.await.unwrap_err();
        assert!(matches!(failure.error, TransportError::Parse(_)));
        assert_eq!(failure.headers.as_deref(), Some("x-h: 1"));
    }

    #[tokio::test]
    async fn test_caller_abort_is_fire_and_forget() {
        let mut transport = transport_with(FakeHandle::new());
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        transport.abort();

        assert!(transport.aborted());
        assert!(transport.handle().abort_requested);
        // Not settled until the abort notification arrives.
        assert!(!transport.settled());
        transport.notify(TransportEvent::Abort);
        assert!(transport.settled());
        assert_eq!(completes.await.unwrap_err().error, TransportError::Aborted);
    }

    #[tokio::test]
    async fn test_dropped_transport_resolves_completes_with_abort() {
        let mut transport = transport_with(FakeHandle::new());
        let completes = transport.send(&RequestOptions::new("http://t/")).unwrap();
        drop(transport);
        let failure = completes.await.unwrap_err();
        assert_eq!(failure.error, TransportError::Aborted);
    }
}
