//! Base types and error handling.
//!
//! Provides foundational types shared by the transport layers:
//! - [`TransportError`]: the crate-wide error taxonomy
//! - [`ReadyState`]: coarse lifecycle state of an underlying handle
//! - [`TransferProgress`]: a point-in-time transfer progress snapshot

pub mod neterror;
pub mod progress;
pub mod readystate;


// Re-exports for convenience
pub use neterror::TransportError;
pub use progress::TransferProgress;
pub use readystate::ReadyState;
