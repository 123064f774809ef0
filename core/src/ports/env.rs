//! Environment store port (interface).

use std::sync::Arc;

use crate::error::Result;

/// Port for a process-wide key-value environment.
///
/// Writes are last-write-wins. Implementations provide whatever mutual
/// exclusion the underlying store needs.
pub trait EnvStore: Send + Sync {
    /// Set `key` to `value`, overwriting any existing entry.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Get the current value of `key`.
    fn get(&self, key: &str) -> Option<String>;
}

impl<T: EnvStore + ?Sized> EnvStore for &T {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<T: EnvStore + ?Sized> EnvStore for Arc<T> {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}
