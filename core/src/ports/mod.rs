//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces the application layer uses to reach
//! the process environment and the real output destination. Implementations
//! live in `adapters` (environment) and in the shim crate (output).

mod env;
mod sink;

pub use env::EnvStore;
pub use sink::OutputSink;
