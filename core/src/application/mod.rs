//! Application layer - Use case services.
//!
//! - [`PortPublisher`]: recognize trigger lines on stderr and publish the port
//! - [`Interceptor`]: stand in for a raw output primitive (inspect, then forward)
//! - [`InterceptWriter`]: the same behavior as an `io::Write` decorator

mod interceptor;
mod publisher;
mod writer;

pub use interceptor::Interceptor;
pub use publisher::{PortPublisher, PUBLISH_VAR};
pub use writer::InterceptWriter;
