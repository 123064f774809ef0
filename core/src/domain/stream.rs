//! Output stream identifiers.

use std::fmt;

/// Identifies the stream an output event is written to.
///
/// Wraps the raw file descriptor handed to `write(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(i32);

impl StreamId {
    pub const STDIN: StreamId = StreamId(0);
    pub const STDOUT: StreamId = StreamId(1);
    pub const STDERR: StreamId = StreamId(2);

    pub const fn from_raw(fd: i32) -> Self {
        Self(fd)
    }

    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// Only standard error is ever inspected for trigger lines.
    pub const fn is_stderr(self) -> bool {
        self.0 == Self::STDERR.0
    }
}

impl From<i32> for StreamId {
    fn from(fd: i32) -> Self {
        Self(fd)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::STDIN => write!(f, "stdin"),
            Self::STDOUT => write!(f, "stdout"),
            Self::STDERR => write!(f, "stderr"),
            Self(fd) => write!(f, "fd {}", fd),
        }
    }
}
