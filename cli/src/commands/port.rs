//! Port command - read back the published port.

use std::process::ExitCode;

use anyhow::{Context, Result};
use rfwd_core::{EnvStore, ProcessEnv, PUBLISH_VAR};

pub fn run(json: bool) -> Result<ExitCode> {
    let port = read_port(&ProcessEnv::new())?;

    if json {
        println!("{}", serde_json::json!({ "port": port }));
    } else {
        println!("{}", port);
    }
    Ok(ExitCode::SUCCESS)
}

fn read_port(env: &impl EnvStore) -> Result<u32> {
    let raw = env
        .get(PUBLISH_VAR)
        .with_context(|| format!("{} is not set", PUBLISH_VAR))?;
    raw.parse()
        .with_context(|| format!("{}={:?} is not a port number", PUBLISH_VAR, raw))
}
