//! Exec command - run a command with its remote port published as `SSH_RFWD`.
//!
//! For a dynamic forward (typically `ssh -R 0:...`) the child gets the shim
//! through the loader's preload variable, so `SSH_RFWD` is set inside it and
//! inherited by anything it spawns. When the port is fixed with `--port`, ssh
//! never prints an allocation line, so `SSH_RFWD` is exported to the child
//! directly instead. Either way we watch its stderr for the trigger line and
//! report each allocation on our stdout, relaying the stderr bytes unchanged.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitCode, ExitStatus, Stdio};

use anyhow::{Context, Result};
use rfwd_core::config::{preload_list, preload_var};
use rfwd_core::{parse_trigger, ForwardAllocation, LibraryLocator, PUBLISH_VAR};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info};

use super::render_allocation;

/// Longest unterminated line kept for recognition.
const MAX_PENDING: usize = 64 * 1024;

/// How the child's remote port reaches `SSH_RFWD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publish {
    /// Known up front; exported as-is.
    Fixed(u32),
    /// Allocated by ssh; the preloaded shim publishes it. Holds the full
    /// preload list.
    Preload(OsString),
}

impl Publish {
    /// Pick the mode: a fixed port needs no library.
    pub fn resolve(lib: Option<PathBuf>, port: Option<u32>) -> Result<Self> {
        if let Some(port) = port {
            return Ok(Self::Fixed(port));
        }

        let library = LibraryLocator::from_env(lib)
            .locate()
            .context("cannot preload the rfwd shim")?;
        debug!(library = %library.display(), var = preload_var(), "preloading shim");

        Ok(Self::Preload(preload_list(
            &library,
            std::env::var_os(preload_var()).as_deref(),
        )))
    }

    /// Variable and value added to the child's environment.
    pub fn child_env(&self) -> (&'static str, OsString) {
        match self {
            Self::Fixed(port) => (PUBLISH_VAR, OsString::from(port.to_string())),
            Self::Preload(list) => (preload_var(), list.clone()),
        }
    }
}

pub async fn run(
    lib: Option<PathBuf>,
    port: Option<u32>,
    command: Vec<OsString>,
    json: bool,
) -> Result<ExitCode> {
    let (program, args) = command.split_first().context("no command given")?;
    let (key, value) = Publish::resolve(lib, port)?.child_env();

    let mut child = Command::new(program)
        .args(args)
        .env(key, &value)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start {}", program.to_string_lossy()))?;

    let stderr = child.stderr.take().context("child stderr was not captured")?;
    let found = relay(stderr, tokio::io::stderr(), tokio::io::stdout(), json).await?;

    let status = child.wait().await.context("failed to wait for child")?;
    debug!(%status, allocations = found.len(), "child exited");

    Ok(ExitCode::from(exit_code(status)))
}

/// Copy `input` to `passthrough` as it arrives, reporting trigger lines to `report`.
///
/// Runs until `input` reaches EOF and returns every allocation seen.
pub async fn relay<R, P, W>(
    mut input: R,
    mut passthrough: P,
    mut report: W,
    json: bool,
) -> Result<Vec<ForwardAllocation>>
where
    R: AsyncRead + Unpin,
    P: AsyncWrite + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut chunk = vec![0u8; 8192];
    let mut pending: Vec<u8> = Vec::new();
    let mut found = Vec::new();
    // Set after an overlong line was dropped until its newline shows up
    let mut discarding = false;

    loop {
        let n = input.read(&mut chunk).await?;
        if n == 0 {
            break;
        }

        passthrough.write_all(&chunk[..n]).await?;
        passthrough.flush().await?;

        pending.extend_from_slice(&chunk[..n]);
        while let Some(end) = pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = pending.drain(..=end).collect();
            if std::mem::take(&mut discarding) {
                continue;
            }
            if let Some(allocation) = recognize(&line) {
                report
                    .write_all(render_allocation(&allocation, json)?.as_bytes())
                    .await?;
                report.flush().await?;
                found.push(allocation);
            }
        }
        if pending.len() > MAX_PENDING {
            pending.clear();
            discarding = true;
        }
    }

    if discarding {
        return Ok(found);
    }
    if let Some(allocation) = recognize(&pending) {
        report
            .write_all(render_allocation(&allocation, json)?.as_bytes())
            .await?;
        report.flush().await?;
        found.push(allocation);
    }

    Ok(found)
}

fn recognize(line: &[u8]) -> Option<ForwardAllocation> {
    let allocation = ForwardAllocation::from(parse_trigger(line)?);
    info!(port = allocation.port, forward_to = %allocation.forward_to, "remote forward allocated");
    Some(allocation)
}

/// Shell convention: the child's code, or 128 + signal number.
fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(1);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return u8::try_from(128 + signal).unwrap_or(1);
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_relay_reports_allocation() {
        let input = Builder::new()
            .read(b"debug1: Remote connections from LOCALHOST:0 forwarded to local address 127.0.0.1:1000\n")
            .read(b"Allocated port 44")
            .read(b"284 for remote forward to 127.0.0.1:1000\r\n")
            .read(b"debug1: All remote forwarding requests processed\n")
            .build();
        let mut passthrough = Vec::new();
        let mut report = Vec::new();

        let found = relay(input, &mut passthrough, &mut report, false)
            .await
            .unwrap();

        assert_eq!(
            found,
            vec![ForwardAllocation {
                port: 44284,
                forward_to: "127.0.0.1:1000".to_string(),
            }]
        );
        assert_eq!(report, b"SSH_RFWD=44284\n");
        assert_eq!(
            passthrough,
            b"debug1: Remote connections from LOCALHOST:0 forwarded to local address 127.0.0.1:1000\n\
Allocated port 44284 for remote forward to 127.0.0.1:1000\r\n\
debug1: All remote forwarding requests processed\n"
                .to_vec()
        );
    }

    #[tokio::test]
    async fn test_relay_json_and_multiple_forwards() {
        let input = Builder::new()
            .read(b"Allocated port 100 for remote forward to a:1\nAllocated port 200 for remote forward to b:2\n")
            .build();
        let mut report = Vec::new();

        let found = relay(input, tokio::io::sink(), &mut report, true)
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[1].port, 200);
        assert_eq!(
            String::from_utf8(report).unwrap(),
            "{\"port\":100,\"forward_to\":\"a:1\"}\n{\"port\":200,\"forward_to\":\"b:2\"}\n"
        );
    }

    #[tokio::test]
    async fn test_relay_unterminated_last_line() {
        let input = Builder::new()
            .read(b"Allocated port 5000 for remote forward to localhost:22")
            .build();
        let mut report = Vec::new();

        let found = relay(input, tokio::io::sink(), &mut report, false)
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(report, b"SSH_RFWD=5000\n");
    }

    #[tokio::test]
    async fn test_relay_without_trigger() {
        let input = Builder::new()
            .read(b"ssh: connect to host example port 22: Connection refused\n")
            .build();
        let mut passthrough = Vec::new();
        let mut report = Vec::new();

        let found = relay(input, &mut passthrough, &mut report, false)
            .await
            .unwrap();

        assert!(found.is_empty());
        assert!(report.is_empty());
        assert_eq!(
            passthrough,
            b"ssh: connect to host example port 22: Connection refused\n".to_vec()
        );
    }

    #[tokio::test]
    async fn test_relay_drops_rest_of_overlong_line() {
        let long = vec![b'x'; MAX_PENDING + 1];
        let input = Builder::new()
            .read(&long)
            .read(b"Allocated port 100 for remote forward to a:1\n")
            .read(b"Allocated port 200 for remote forward to b:2\n")
            .build();
        let mut passthrough = Vec::new();
        let mut report = Vec::new();

        let found = relay(input, &mut passthrough, &mut report, false)
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].port, 200);
        assert_eq!(report, b"SSH_RFWD=200\n");
        assert_eq!(passthrough.len(), MAX_PENDING + 1 + 45 + 45);
    }

    #[tokio::test]
    async fn test_relay_overlong_unterminated_tail_is_ignored() {
        let mut tail = vec![b'x'; MAX_PENDING + 1];
        tail.extend_from_slice(b"Allocated port 300 for remote forward to c:3");
        let input = Builder::new().read(&tail).build();
        let mut report = Vec::new();

        let found = relay(input, tokio::io::sink(), &mut report, false)
            .await
            .unwrap();

        assert!(found.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn test_fixed_port_is_exported_directly() {
        // A fixed port never touches the library search
        let publish = Publish::resolve(Some(PathBuf::from("/nonexistent/librfwd.so")), Some(2222))
            .unwrap();

        assert_eq!(publish, Publish::Fixed(2222));
        assert_eq!(publish.child_env(), (PUBLISH_VAR, OsString::from("2222")));
    }

    #[test]
    fn test_dynamic_port_preloads_the_shim() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("librfwd.so");
        std::fs::write(&lib, b"").unwrap();

        let publish = Publish::resolve(Some(lib.clone()), None).unwrap();
        let (key, value) = publish.child_env();

        assert_eq!(key, preload_var());
        assert!(value.to_string_lossy().starts_with(lib.to_string_lossy().as_ref()));
    }

    #[test]
    fn test_missing_library_is_an_error() {
        let err = Publish::resolve(Some(PathBuf::from("/nonexistent/librfwd.so")), None).unwrap_err();
        assert!(format!("{:#}", err).contains("--lib"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(255 << 8)), 255);
        // Killed by SIGKILL
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }
}
