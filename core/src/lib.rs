//! rfwd Core Library
//!
//! Recognizes the diagnostic OpenSSH prints when the server allocates a
//! dynamic remote-forward port (`ssh -R 0:host:port`) and publishes that
//! port as the `SSH_RFWD` environment variable.
//!
//! # Architecture
//! The crate follows the same ports & adapters split as the shim and CLI
//! that sit on top of it:
//! - `domain`: trigger line parsing and stream identifiers (no I/O)
//! - `ports`: trait definitions for the environment and the output sink
//! - `adapters`: process and in-memory environment stores
//! - `application`: the publisher, the `write` interceptor and the
//!   `io::Write` wrapper built on them
//!
//! # Example
//! ```
//! use rfwd_core::{InterceptWriter, MemoryEnv, EnvStore, PUBLISH_VAR};
//! use std::io::Write;
//!
//! let env = MemoryEnv::new();
//! let mut stderr = InterceptWriter::stderr(Vec::new(), &env);
//! stderr
//!     .write_all(b"Allocated port 44284 for remote forward to 127.0.0.1:1000\n")
//!     .unwrap();
//! assert_eq!(env.get(PUBLISH_VAR).as_deref(), Some("44284"));
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-export domain types (primary API)
pub use domain::{parse_trigger, Allocation, ForwardAllocation, StreamId};

// Re-export other commonly used types
pub use adapters::env::{MemoryEnv, ProcessEnv};
pub use application::{InterceptWriter, Interceptor, PortPublisher, PUBLISH_VAR};
pub use config::{LibraryLocator, ShimConfig};
pub use error::{Error, Result};
pub use ports::{EnvStore, OutputSink};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
