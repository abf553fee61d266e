//! Request plumbing: header blocks, proxy rewriting, and body types.

pub mod headers;
pub mod proxy;
pub mod requestbody;
pub mod responsebody;

// Re-exports for convenience
pub use headers::HeaderEntry;
pub use requestbody::Payload;
pub use responsebody::{ResponseBody, ResponseType};
