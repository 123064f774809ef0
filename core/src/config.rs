//! Environment-driven configuration.
//!
//! The shim runs inside foreign processes and has no config file; everything
//! is read from environment variables. Lookups go through an injectable
//! getter so tests never have to mutate the real environment.
//!
//! | variable | used by | meaning |
//! |----------|---------|---------|
//! | `RFWD_LOG` | shim | `tracing` filter directive; unset keeps the shim silent |
//! | `RFWD_LOG_FILE` | shim | append shim logs to this file instead of stderr |
//! | `RFWD_PRELOAD_LIB` | `rfwd exec` | path of the shim library |

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

pub const LOG_FILTER_VAR: &str = "RFWD_LOG";
pub const LOG_FILE_VAR: &str = "RFWD_LOG_FILE";
pub const PRELOAD_LIB_VAR: &str = "RFWD_PRELOAD_LIB";

/// System-wide install location searched last.
pub const DEFAULT_LIB_DIR: &str = "/usr/local/lib";

/// Environment variable the dynamic loader reads preload libraries from.
pub const fn preload_var() -> &'static str {
    if cfg!(target_os = "macos") {
        "DYLD_INSERT_LIBRARIES"
    } else {
        "LD_PRELOAD"
    }
}

/// File name of the built shim library.
pub const fn library_file_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "librfwd.dylib"
    } else {
        "librfwd.so"
    }
}

/// Settings for the shim loaded into a host process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShimConfig {
    /// Filter directive for shim logging. `None` disables logging.
    pub log_filter: Option<String>,

    /// Log destination. `None` means raw stderr.
    pub log_file: Option<PathBuf>,
}

impl ShimConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        Self {
            log_filter: non_empty(LOG_FILTER_VAR).map(|v| v.to_string_lossy().into_owned()),
            log_file: non_empty(LOG_FILE_VAR).map(PathBuf::from),
        }
    }

    pub fn logging_enabled(&self) -> bool {
        self.log_filter.is_some()
    }
}

/// Finds the shim library for `rfwd exec`.
///
/// Search order:
/// 1. An explicit path (`--lib`)
/// 2. `RFWD_PRELOAD_LIB`
/// 3. The directory containing the running executable
/// 4. `~/.local/lib`
/// 5. [`DEFAULT_LIB_DIR`]
///
/// The first two must exist when given; they are never skipped silently.
#[derive(Debug, Clone, Default)]
pub struct LibraryLocator {
    explicit: Option<PathBuf>,
    env_override: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
    home_dir: Option<PathBuf>,
}

impl LibraryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locator for the current process and environment.
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            env_override: std::env::var_os(PRELOAD_LIB_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            exe_dir: std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf)),
            home_dir: dirs::home_dir(),
        }
    }

    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    pub fn with_env_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_override = Some(path.into());
        self
    }

    pub fn with_exe_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exe_dir = Some(dir.into());
        self
    }

    pub fn with_home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(dir.into());
        self
    }

    /// Directory candidates searched when no path was given.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let name = library_file_name();
        let mut paths = Vec::new();

        if let Some(dir) = &self.exe_dir {
            paths.push(dir.join(name));
        }
        if let Some(home) = &self.home_dir {
            paths.push(home.join(".local").join("lib").join(name));
        }
        paths.push(Path::new(DEFAULT_LIB_DIR).join(name));

        paths
    }

    /// Resolve the library path.
    pub fn locate(&self) -> Result<PathBuf> {
        let given = [
            (self.explicit.as_ref(), "--lib"),
            (self.env_override.as_ref(), PRELOAD_LIB_VAR),
        ];
        for (path, source) in given {
            if let Some(path) = path {
                if path.is_file() {
                    return Ok(path.clone());
                }
                return Err(Error::Config(format!(
                    "{} points to {}, which does not exist",
                    source,
                    path.display()
                )));
            }
        }

        let candidates = self.search_paths();
        if let Some(found) = candidates.iter().find(|p| p.is_file()) {
            return Ok(found.clone());
        }

        let searched = candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(Error::Config(format!(
            "could not find {} (searched: {})",
            library_file_name(),
            searched
        )))
    }
}

/// Whether `c` separates entries of the [`preload_var`] list.
///
/// glibc's `LD_PRELOAD` accepts colons and spaces; dyld's
/// `DYLD_INSERT_LIBRARIES` only colons, so a space there is part of a path.
pub const fn is_preload_separator(c: char) -> bool {
    c == ':' || (c == ' ' && !cfg!(target_os = "macos"))
}

/// Build the preload list with `library` first.
///
/// Keeps any libraries already listed in `existing` and does not list
/// `library` twice.
pub fn preload_list(library: &Path, existing: Option<&OsStr>) -> OsString {
    let mut list = OsString::from(library.as_os_str());

    let Some(existing) = existing.filter(|e| !e.is_empty()) else {
        return list;
    };

    let existing = existing.to_string_lossy();
    for entry in existing
        .split(is_preload_separator)
        .filter(|e| !e.is_empty() && Path::new(e) != library)
    {
        list.push(":");
        list.push(entry);
    }
    list
}
