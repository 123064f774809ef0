//! Port publisher.

use tracing::{debug, warn};

use crate::domain::{parse_trigger, StreamId};
use crate::error::Result;
use crate::ports::EnvStore;

/// Environment variable the allocated port is published under.
pub const PUBLISH_VAR: &str = "SSH_RFWD";

/// Recognizes trigger lines and publishes the allocated port.
///
/// Stateless apart from the environment it writes to: every call is
/// independent and a later match overwrites an earlier one.
#[derive(Debug)]
pub struct PortPublisher<E> {
    env: E,
}

impl<E: EnvStore> PortPublisher<E> {
    pub fn new(env: E) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// Inspect one output event.
    ///
    /// Only [`StreamId::STDERR`] is inspected. Returns the published port,
    /// or `None` when nothing was published. An environment failure is
    /// logged and reported as `None`; it never reaches the caller's output.
    pub fn observe(&self, stream: StreamId, bytes: &[u8]) -> Option<u32> {
        if !stream.is_stderr() {
            return None;
        }

        let allocation = parse_trigger(bytes)?;
        match self.publish(allocation.port) {
            Ok(()) => {
                debug!(
                    port = allocation.port,
                    forward_to = %allocation.forward_to_lossy(),
                    "published remote forward port"
                );
                Some(allocation.port)
            }
            Err(e) => {
                warn!(port = allocation.port, error = %e, "failed to publish remote forward port");
                None
            }
        }
    }

    /// Write `port` to [`PUBLISH_VAR`], overwriting any previous value.
    pub fn publish(&self, port: u32) -> Result<()> {
        self.env.set(PUBLISH_VAR, &port.to_string())
    }

    /// The currently published port, if the variable holds a valid one.
    pub fn current(&self) -> Option<u32> {
        self.env.get(PUBLISH_VAR)?.parse().ok()
    }
}
