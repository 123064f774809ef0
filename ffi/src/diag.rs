//! Output that never passes through the interposed `write`.
//!
//! Everything here goes out via `writev(2)`, a separate libc symbol, so it
//! is safe to use before the original `write` is resolved and from inside
//! the interception path itself.

use std::io::{self, Write};
use std::os::fd::RawFd;

use libc::c_void;

/// Raw file descriptor writer backed by `writev`.
#[derive(Debug, Clone, Copy)]
pub struct RawWriter {
    fd: RawFd,
}

impl RawWriter {
    pub const fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    pub const fn stderr() -> Self {
        Self::new(libc::STDERR_FILENO)
    }
}

impl Write for RawWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let iov = libc::iovec {
            iov_base: buf.as_ptr() as *mut c_void,
            iov_len: buf.len(),
        };
        // SAFETY: iov describes `buf`, which outlives the call.
        let n = unsafe { libc::writev(self.fd, &iov, 1) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Print a diagnostic line to stderr.
pub fn report(message: &str) {
    let line = format!("rfwd: {}\n", message);
    let _ = RawWriter::stderr().write_all(line.as_bytes());
}

/// Print a diagnostic line and abort the process.
pub fn fatal(message: &str) -> ! {
    report(message);
    std::process::abort()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_writer_round_trip() {
        let mut fds = [0 as RawFd; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);

        let mut writer = RawWriter::new(fds[1]);
        writer.write_all(b"rfwd: resolved\n").unwrap();

        let mut buf = [0u8; 15];
        let read = unsafe { libc::read(fds[0], buf.as_mut_ptr().cast(), buf.len()) };
        assert_eq!(read, 15);
        assert_eq!(&buf, b"rfwd: resolved\n");

        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    #[test]
    fn test_raw_writer_bad_fd() {
        let err = RawWriter::new(-1).write(b"x").unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn test_raw_writer_empty() {
        assert_eq!(RawWriter::stderr().write(b"").unwrap(), 0);
    }
}
