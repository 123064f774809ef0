//! Output sink port (interface).

use crate::domain::StreamId;

/// Port for the original output primitive.
///
/// The interceptor hands every event to the sink unmodified and returns
/// whatever the sink returns, so `Output` carries the primitive's own
/// result type (a byte count, an `io::Result`, a raw `ssize_t`).
pub trait OutputSink: Send + Sync {
    type Output;

    /// Write `bytes` to `stream`.
    fn forward(&self, stream: StreamId, bytes: &[u8]) -> Self::Output;
}
