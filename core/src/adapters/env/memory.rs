//! In-memory environment store.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::ports::EnvStore;

/// Environment store backed by a map instead of the process environment.
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let env = Self::new();
        env.vars.lock().insert(key.to_string(), value.to_string());
        env
    }

    pub fn len(&self) -> usize {
        self.vars.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.lock().is_empty()
    }
}

impl EnvStore for MemoryEnv {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() || key.contains('=') {
            return Err(Error::InvalidEnv(format!("invalid key {:?}", key)));
        }
        self.vars.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.vars.lock().get(key).cloned()
    }
}
