//! Load-time behaviour of the built `librfwd.so`.
//!
//! The tests re-run this test binary as a child with the shim preloaded. The
//! child side (`helper_*`) does nothing unless `RFWD_TEST_HELPER` names it.

#![cfg(target_os = "linux")]

use std::path::PathBuf;
use std::process::{Command, Output};

const HELPER_VAR: &str = "RFWD_TEST_HELPER";
const TRIGGER: &[u8] = b"Allocated port 44284 for remote forward to 127.0.0.1:1000\n";

/// `target/<profile>/librfwd.so`, next to the `deps/` directory holding this test.
fn shim_path() -> PathBuf {
    let exe = std::env::current_exe().unwrap();
    let profile_dir = exe.parent().and_then(|deps| deps.parent()).unwrap();
    let path = profile_dir.join("librfwd.so");
    assert!(path.is_file(), "shim not built at {}", path.display());
    path
}

fn run_helper(name: &str, extra_env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(std::env::current_exe().unwrap());
    cmd.args([name, "--exact", "--nocapture", "--test-threads=1", "--quiet"])
        .env(HELPER_VAR, name)
        .env("LD_PRELOAD", shim_path())
        .env_remove("SSH_RFWD")
        .env_remove("RFWD_LOG")
        .env_remove("RFWD_LOG_FILE");
    for (key, value) in extra_env {
        cmd.env(key, value);
    }
    cmd.output().unwrap()
}

fn is_helper(name: &str) -> bool {
    std::env::var(HELPER_VAR).as_deref() == Ok(name)
}

/// Lines the helper reported, e.g. `after 0: SSH_RFWD=100`.
fn reports(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| line.starts_with("report "))
        .map(|line| line["report ".len()..].to_string())
        .collect()
}

fn raw_write(fd: i32, bytes: &[u8]) -> isize {
    unsafe { libc::write(fd, bytes.as_ptr().cast(), bytes.len()) }
}

fn report(label: &str) {
    let value = std::env::var("SSH_RFWD").unwrap_or_else(|_| "<unset>".to_string());
    println!("report {}: SSH_RFWD={}", label, value);
}

#[test]
fn helper_trigger() {
    if !is_helper("helper_trigger") {
        return;
    }
    let n = raw_write(2, TRIGGER);
    println!("report written: {}", n);
    report("trigger");
}

#[test]
fn helper_sequence() {
    if !is_helper("helper_sequence") {
        return;
    }
    let writes: [(i32, &[u8]); 6] = [
        (2, b"Allocated port 100 for remote forward to a:1\n"),
        (2, b"Allocated port 200 for remote forward to b:2\n"),
        (2, b"Allocated port xx for remote forward to c:3\n"),
        (2, b"Allocated port 300 for remote forward to\n"),
        (2, b"Allocated po"),
        (1, b"Allocated port 400 for remote forward to d:4\n"),
    ];
    for (i, (fd, bytes)) in writes.iter().enumerate() {
        let n = raw_write(*fd, bytes);
        assert_eq!(n, bytes.len() as isize);
        report(&format!("after {}", i));
    }
}

#[test]
fn test_preloaded_write_publishes_port() {
    let output = run_helper("helper_trigger", &[]);

    assert!(output.status.success(), "{:?}", output);
    assert!(output.stderr.starts_with(TRIGGER), "{:?}", output.stderr);
    assert_eq!(
        reports(&output),
        vec![
            format!("written: {}", TRIGGER.len()),
            "trigger: SSH_RFWD=44284".to_string(),
        ]
    );
}

#[test]
fn test_preloaded_write_last_match_wins() {
    let output = run_helper("helper_sequence", &[]);

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        reports(&output),
        vec![
            "after 0: SSH_RFWD=100",
            "after 1: SSH_RFWD=200",
            "after 2: SSH_RFWD=200",
            "after 3: SSH_RFWD=200",
            "after 4: SSH_RFWD=200",
            "after 5: SSH_RFWD=200",
        ]
    );
}

#[test]
fn test_constructor_runs_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("shim.log");

    let output = run_helper(
        "helper_trigger",
        &[("RFWD_LOG", "debug"), ("RFWD_LOG_FILE", log.to_str().unwrap())],
    );
    assert!(output.status.success(), "{:?}", output);

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("rfwd shim installed"), "{}", contents);
    assert!(contents.contains("44284"), "{}", contents);
}
