//! # simplenet
//!
//! A single-request HTTP transport for Rust.
//!
//! `simplenet` drives exactly one network exchange per transport instance
//! and settles a single-resolution completion with a decoded outcome or a
//! typed failure. It is built for API consoles and host applications that
//! inject fixed headers into every request, optionally route traffic
//! through a proxy endpoint, and observe upload/download progress while a
//! request is in flight.
//!
//! ## Features
//!
//! - **Single-shot lifecycle**: one instance, one request, one settlement
//! - **Header injection**: configured headers merge with caller headers,
//!   configured headers win on name conflicts
//! - **Proxy rewriting**: prefix the target URL, optionally percent-encoded
//! - **Event-driven state machine**: progress, error, timeout, abort and
//!   load-end notifications drive observable state
//! - **Typed decoding**: JSON, XML, blob, document, arraybuffer or raw text
//!   keyed on the handle's declared response type
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use simplenet::{Client, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::builder()
//!         .append_headers("x-api-token: 123")
//!         .build();
//!     let outcome = client
//!         .send(RequestOptions::new("http://localhost:8080/status"))
//!         .await;
//!     match outcome {
//!         Ok(success) => println!("Body: {:?}", success.response),
//!         Err(failure) => println!("Failed: {}", failure.error),
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Core types and error definitions
//! - [`http`] - Header blocks, proxy rewriting, and body handling
//! - [`transport`] - The request lifecycle state machine and its backends
//! - [`client`] - High-level request API
//!
//! The underlying network capability is abstracted behind
//! [`transport::NetworkHandle`], so the state machine runs identically
//! against the bundled hyper backend or a deterministic test fake.

pub mod base;
pub mod client;
pub mod http;
pub mod transport;

pub use crate::base::neterror::TransportError;
pub use crate::base::progress::TransferProgress;
pub use crate::client::{Client, ClientBuilder};
pub use crate::http::requestbody::Payload;
pub use crate::http::responsebody::{ResponseBody, ResponseType};
pub use crate::transport::request::{
    Completes, RequestOptions, RequestResult, RequestTransport, TransportConfig,
    TransportFailure, TransportResponse,
};
