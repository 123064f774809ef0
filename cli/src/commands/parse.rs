//! Parse command - check one line against the trigger pattern.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use rfwd_core::{parse_trigger, ForwardAllocation};

use super::render_allocation;

pub fn run(line: &str, json: bool) -> Result<ExitCode> {
    let mut stdout = std::io::stdout().lock();

    match check(line) {
        Some(allocation) => {
            stdout.write_all(render_allocation(&allocation, json)?.as_bytes())?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            if json {
                writeln!(stdout, "null")?;
            } else {
                eprintln!("No match.");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check(line: &str) -> Option<ForwardAllocation> {
    parse_trigger(line.as_bytes()).map(ForwardAllocation::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_match() {
        let allocation = check("Allocated port 44284 for remote forward to 127.0.0.1:1000").unwrap();
        assert_eq!(allocation.port, 44284);
        assert_eq!(allocation.forward_to, "127.0.0.1:1000");
    }

    #[test]
    fn test_check_no_match() {
        assert!(check("Allocated port xx for remote forward to host").is_none());
        assert!(check("debug1: Allocated port 1 for remote forward to host").is_none());
    }
}
