//! Environment store adapters.
//!
//! - [`ProcessEnv`]: the real process environment via `setenv(3)`/`getenv(3)`
//! - [`MemoryEnv`]: an isolated map, for tests and embedding

mod memory;
mod process;

pub use memory::MemoryEnv;
pub use process::ProcessEnv;
