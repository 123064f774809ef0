//! Lib command - show which shim library `exec` would preload.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use rfwd_core::config::preload_var;
use rfwd_core::LibraryLocator;

pub fn run(lib: Option<PathBuf>, json: bool) -> Result<ExitCode> {
    let path = LibraryLocator::from_env(lib).locate()?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "path": path.display().to_string(), "preload_var": preload_var() })
        );
    } else {
        println!("{}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}
