//! High-level request API.
//!
//! Wires the pieces together for the common case: a [`Client`] holds the
//! transport configuration and, per request, constructs a fresh
//! [`HyperHandle`] and [`RequestTransport`], pumps notifications until
//! the completion settles, and returns the outcome. One transport
//! instance serves exactly one request; the client hides that churn.
//!
//! # Example
//!
//! ```rust,ignore
//! use simplenet::{Client, RequestOptions};
//!
//! let client = Client::builder()
//!     .append_headers("x-a: test1\\nx-b: test2")
//!     .proxy("https://api.domain.com/endpoint?url=")
//!     .proxy_encode_url(true)
//!     .build();
//!
//! let outcome = client.send(RequestOptions::new("http://test.com")).await;
//! ```

use crate::base::neterror::TransportError;
use crate::base::progress::TransferProgress;
use crate::http::responsebody::ResponseType;
use crate::transport::hyperhandle::HyperHandle;
use crate::transport::request::{
    RequestOptions, RequestResult, RequestTransport, TransportConfig, TransportFailure,
};

/// HTTP client for single-shot requests.
///
/// Use [`Client::builder()`] to configure and create a client.
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: TransportConfig,
    response_type: ResponseType,
}

impl Client {
    /// Create a client with default settings: no injected headers, no
    /// proxy, text decoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Send a request and await its settled outcome.
    pub async fn send(&self, options: RequestOptions) -> RequestResult {
        self.dispatch(options, None).await
    }

    /// Send a request, forwarding every progress update to `observer`.
    pub async fn send_with_progress(
        &self,
        options: RequestOptions,
        observer: impl FnMut(TransferProgress) + Send + 'static,
    ) -> RequestResult {
        self.dispatch(options, Some(Box::new(observer))).await
    }

    async fn dispatch(
        &self,
        options: RequestOptions,
        observer: Option<Box<dyn FnMut(TransferProgress) + Send>>,
    ) -> RequestResult {
        let (mut handle, mut events) = HyperHandle::new();
        handle.set_response_type(self.response_type);
        let mut transport = RequestTransport::with_config(handle, self.config.clone());
        if let Some(observer) = observer {
            transport.set_progress_observer(observer);
        }
        let completes = match transport.send(&options) {
            Some(completes) => completes,
            // A fresh handle is always unsent; kept for the contract.
            None => {
                return Err(TransportFailure {
                    error: TransportError::Network("transport already used".to_string()),
                    status: 0,
                    status_text: String::new(),
                    headers: None,
                })
            }
        };
        while !transport.settled() {
            match events.recv().await {
                Some(event) => transport.notify(event),
                None => break,
            }
        }
        // Deliver any trailing notifications (the load-end that follows
        // an error, timeout or abort) so their no-op paths still run.
        while let Ok(event) = events.try_recv() {
            transport.notify(event);
        }
        drop(transport);
        completes.await
    }
}

/// Builder for creating a [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    append_headers: Option<String>,
    proxy: Option<String>,
    proxy_encode_url: bool,
    response_type: ResponseType,
}

impl ClientBuilder {
    /// Headers injected into every request, as a raw header block.
    /// Injected headers win over caller headers with the same name. The
    /// literal `\n` separator from attribute-delivered configuration is
    /// accepted.
    pub fn append_headers(mut self, headers: impl Into<String>) -> Self {
        self.append_headers = Some(headers.into());
        self
    }

    /// Route every request through a proxy endpoint by prefixing the
    /// request URL with this value.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Percent-encode the request URL before appending it to the proxy
    /// prefix. Use when the proxy takes the URL as a query parameter.
    pub fn proxy_encode_url(mut self, encode: bool) -> Self {
        self.proxy_encode_url = encode;
        self
    }

    /// Declared decode mode for response bodies.
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        Client {
            config: TransportConfig {
                append_headers: self.append_headers,
                proxy: self.proxy,
                proxy_encode_url: self.proxy_encode_url,
            },
            response_type: self.response_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = Client::builder().build();
        assert!(client.config.append_headers.is_none());
        assert!(client.config.proxy.is_none());
        assert!(!client.config.proxy_encode_url);
        assert_eq!(client.response_type, ResponseType::Default);
    }

    #[test]
    fn test_builder_carries_configuration() {
        let client = Client::builder()
            .append_headers("x-a: 1")
            .proxy("https://proxy/?u=")
            .proxy_encode_url(true)
            .response_type(ResponseType::Json)
            .build();
        assert_eq!(client.config.append_headers.as_deref(), Some("x-a: 1"));
        assert_eq!(client.config.proxy.as_deref(), Some("https://proxy/?u="));
        assert!(client.config.proxy_encode_url);
        assert_eq!(client.response_type, ResponseType::Json);
    }
}
