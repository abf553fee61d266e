use serde::{Deserialize, Serialize};

/// A point-in-time snapshot of transfer progress.
///
/// Emitted to the registered progress observer on every progress
/// notification from the underlying transport. Serializable so host
/// applications can forward it as an event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    /// Whether the underlying transport knows the total transfer size.
    pub length_computable: bool,
    /// Bytes transferred so far.
    pub loaded: u64,
    /// Total bytes expected, or 0 when not computable.
    pub total: u64,
}
