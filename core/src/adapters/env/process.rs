//! Process environment store.

use std::ffi::{CStr, CString};

use parking_lot::{const_mutex, Mutex};

use crate::error::{Error, Result};
use crate::ports::EnvStore;

/// Serializes every access this crate makes to the environment table.
static ENV_LOCK: Mutex<()> = const_mutex(());

/// The real process environment.
///
/// Entries written here are visible to the whole process and inherited by
/// any child spawned afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ProcessEnv {
    pub fn new() -> Self {
        Self
    }
}

fn c_key(key: &str) -> Result<CString> {
    if key.is_empty() || key.contains('=') {
        return Err(Error::InvalidEnv(format!("invalid key {:?}", key)));
    }
    CString::new(key).map_err(|_| Error::InvalidEnv(format!("key {:?} contains NUL", key)))
}

impl EnvStore for ProcessEnv {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let c_key = c_key(key)?;
        let c_value = CString::new(value)
            .map_err(|_| Error::InvalidEnv(format!("value for {} contains NUL", key)))?;

        let _guard = ENV_LOCK.lock();
        // SAFETY: both pointers are valid NUL-terminated strings and ENV_LOCK
        // keeps this crate's own readers and writers off the table meanwhile.
        let rc = unsafe { libc::setenv(c_key.as_ptr(), c_value.as_ptr(), 1) };
        if rc != 0 {
            return Err(Error::Env {
                key: key.to_string(),
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        let c_key = c_key(key).ok()?;

        let _guard = ENV_LOCK.lock();
        // SAFETY: the returned pointer is copied out before the lock is released.
        unsafe {
            let value = libc::getenv(c_key.as_ptr());
            if value.is_null() {
                None
            } else {
                Some(CStr::from_ptr(value).to_string_lossy().into_owned())
            }
        }
    }
}
