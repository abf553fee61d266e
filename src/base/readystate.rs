/// The coarse lifecycle state of an underlying network handle.
/// This roughly matches the XMLHttpRequest readyState ladder, collapsed
/// to the transitions the transport actually observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    /// The handle has been constructed but not opened.
    #[default]
    Unsent,

    /// `open()` has been called; the request line is recorded.
    Opened,

    /// `send()` has been called; the exchange is in flight.
    Loading,

    /// The exchange finished (successfully or not).
    Done,
}

impl ReadyState {
    /// A handle accepts `send()` only while unsent.
    pub fn accepts_send(&self) -> bool {
        matches!(self, ReadyState::Unsent)
    }
}
