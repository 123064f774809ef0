//! Intercepted output primitive.

use crate::application::publisher::PortPublisher;
use crate::domain::StreamId;
use crate::ports::{EnvStore, OutputSink};

/// Stands in for an output primitive. Every event is forwarded after inspection.
///
/// Inspection is observational only. The sink receives exactly the bytes the
/// caller passed, and its result is returned to the caller unchanged. No lock
/// is taken around forwarding, so concurrent callers keep whatever ordering
/// the sink itself provides.
#[derive(Debug)]
pub struct Interceptor<S, E> {
    sink: S,
    publisher: PortPublisher<E>,
}

impl<S: OutputSink, E: EnvStore> Interceptor<S, E> {
    pub fn new(sink: S, env: E) -> Self {
        Self {
            sink,
            publisher: PortPublisher::new(env),
        }
    }

    /// Handle one output event.
    pub fn emit(&self, stream: StreamId, bytes: &[u8]) -> S::Output {
        self.publisher.observe(stream, bytes);
        self.sink.forward(stream, bytes)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn publisher(&self) -> &PortPublisher<E> {
        &self.publisher
    }
}
