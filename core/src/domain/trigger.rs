//! Trigger line recognizer.
//!
//! OpenSSH reports a dynamically allocated remote forward on stderr:
//!
//! ```text
//! Allocated port 44284 for remote forward to 127.0.0.1:1000
//! ```
//!
//! Recognition happens in two stages:
//! 1. A byte-exact comparison of the first 15 bytes against [`TRIGGER_PREFIX`]
//! 2. A bounded scan of the port, the [`FORWARD_LITERAL`] and the forward target
//!
//! The scan follows `scanf` conventions: a space in a literal matches any run
//! of whitespace (including none), leading whitespace is skipped before each
//! field, and a NUL byte ends the scannable text. Unlike `scanf` it never reads
//! past the slice it is given.

use serde::{Deserialize, Serialize};

/// Byte-exact prefix a trigger line must start with, at offset 0.
pub const TRIGGER_PREFIX: &[u8] = b"Allocated port ";

/// Literal between the port and the forward target.
pub const FORWARD_LITERAL: &[u8] = b" for remote forward to ";

/// Maximum number of bytes captured for the forward target.
pub const TARGET_CAPACITY: usize = 256;

/// A recognized trigger line, borrowing from the scanned buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation<'a> {
    /// The port the server allocated.
    pub port: u32,
    /// The forward target, truncated to [`TARGET_CAPACITY`] bytes.
    pub forward_to: &'a [u8],
}

impl Allocation<'_> {
    /// The forward target as text, replacing invalid UTF-8.
    pub fn forward_to_lossy(&self) -> String {
        String::from_utf8_lossy(self.forward_to).into_owned()
    }
}

/// Owned form of [`Allocation`] for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardAllocation {
    pub port: u32,
    pub forward_to: String,
}

impl From<Allocation<'_>> for ForwardAllocation {
    fn from(allocation: Allocation<'_>) -> Self {
        Self {
            port: allocation.port,
            forward_to: allocation.forward_to_lossy(),
        }
    }
}

impl std::fmt::Display for ForwardAllocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port {} -> {}", self.port, self.forward_to)
    }
}

/// Parse a trigger line.
///
/// Returns `None` unless the buffer starts with [`TRIGGER_PREFIX`] and both
/// the port and a non-empty forward target scan cleanly. Never allocates.
pub fn parse_trigger(bytes: &[u8]) -> Option<Allocation<'_>> {
    if !bytes.starts_with(TRIGGER_PREFIX) {
        return None;
    }

    let text = match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    };

    let rest = scan_literal(text, TRIGGER_PREFIX)?;
    let (port, rest) = scan_u32(skip_space(rest))?;
    let rest = scan_literal(rest, FORWARD_LITERAL)?;
    let forward_to = scan_token(skip_space(rest))?;

    Some(Allocation { port, forward_to })
}

/// Whitespace as classified by C `isspace` in the "C" locale.
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn skip_space(input: &[u8]) -> &[u8] {
    let start = input
        .iter()
        .position(|&b| !is_space(b))
        .unwrap_or(input.len());
    &input[start..]
}

fn scan_literal<'a>(mut input: &'a [u8], literal: &[u8]) -> Option<&'a [u8]> {
    for &expected in literal {
        if is_space(expected) {
            input = skip_space(input);
            continue;
        }
        match input.split_first() {
            Some((&b, rest)) if b == expected => input = rest,
            _ => return None,
        }
    }
    Some(input)
}

fn scan_u32(input: &[u8]) -> Option<(u32, &[u8])> {
    let digits = input
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(input.len());
    if digits == 0 {
        return None;
    }

    let mut value: u32 = 0;
    for &b in &input[..digits] {
        value = value.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }

    Some((value, &input[digits..]))
}

fn scan_token(input: &[u8]) -> Option<&[u8]> {
    let len = input
        .iter()
        .position(|&b| is_space(b))
        .unwrap_or(input.len());
    if len == 0 {
        return None;
    }

    Some(&input[..len.min(TARGET_CAPACITY)])
}
