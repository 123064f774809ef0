//! `io::Write` decorator.
//!
//! For output paths that are constructed rather than interposed: wrap the real
//! destination once and hand the wrapper to everything that writes.

use std::io::{self, Write};

use crate::application::publisher::PortPublisher;
use crate::domain::StreamId;
use crate::ports::EnvStore;

/// Writer that inspects every buffer before passing it to `inner`.
///
/// Each call to [`Write::write`] is one output event. The inner writer sees
/// the same buffer and its result is returned as-is, short writes included.
#[derive(Debug)]
pub struct InterceptWriter<W, E> {
    inner: W,
    stream: StreamId,
    publisher: PortPublisher<E>,
}

impl<W: Write, E: EnvStore> InterceptWriter<W, E> {
    pub fn new(inner: W, stream: StreamId, env: E) -> Self {
        Self {
            inner,
            stream,
            publisher: PortPublisher::new(env),
        }
    }

    /// Wrap a writer that stands for standard error.
    pub fn stderr(inner: W, env: E) -> Self {
        Self::new(inner, StreamId::STDERR, env)
    }

    pub fn stream(&self) -> StreamId {
        self.stream
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn publisher(&self) -> &PortPublisher<E> {
        &self.publisher
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write, E: EnvStore> Write for InterceptWriter<W, E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.publisher.observe(self.stream, buf);
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
