//! Preloadable `write(2)` shim for rfwd.
//!
//! Building this crate produces `librfwd.so` (`librfwd.dylib` on macOS).
//! Loaded ahead of libc with `LD_PRELOAD`/`DYLD_INSERT_LIBRARIES`, it takes
//! over `write` for the lifetime of the process: every call is inspected for
//! OpenSSH's `Allocated port N for remote forward to ...` line on stderr,
//! `SSH_RFWD` is set to `N` on a match, and the bytes are always passed on to
//! the original `write` untouched.
//!
//! ```text
//! LD_PRELOAD=/usr/local/lib/librfwd.so ssh -o SendEnv=SSH_RFWD -R 0:localhost:1000 host
//! ```

#[cfg_attr(test, allow(unused_imports))]
use libc::{c_char, c_int, c_void, size_t, ssize_t};

mod diag;
mod logging;
mod shim;

// ============================================================================
// Interposed Symbols
// ============================================================================

/// Replacement for libc `write`.
///
/// Compiled out of test builds so the test harness keeps its own `write`.
///
/// # Safety
///
/// Same contract as `write(2)`: `buf` must be valid for reads of `count`
/// bytes unless the caller expects `EFAULT`.
#[cfg(all(not(test), not(target_os = "macos")))]
#[no_mangle]
pub unsafe extern "C" fn write(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
    shim::intercepted_write(fd, buf, count)
}

/// Replacement for libc `write` under dyld.
///
/// Two-level namespace binding ties every image's `write` to libSystem, so a
/// same-named export is never called. dyld instead rebinds through the
/// `__interpose` table below.
///
/// # Safety
///
/// Same contract as `write(2)`.
#[cfg(all(not(test), target_os = "macos"))]
#[no_mangle]
pub unsafe extern "C" fn rfwd_write(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
    shim::intercepted_write(fd, buf, count)
}

#[cfg(all(not(test), target_os = "macos"))]
#[repr(C)]
struct Interpose {
    replacement: shim::WriteFn,
    original: shim::WriteFn,
}

#[cfg(all(not(test), target_os = "macos"))]
#[used]
#[link_section = "__DATA,__interpose"]
static INTERPOSE_WRITE: Interpose = Interpose {
    replacement: rfwd_write,
    original: libc::write,
};

// ============================================================================
// Lifecycle Functions
// ============================================================================

#[cfg(all(not(test), any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
#[used]
#[link_section = ".init_array"]
static INIT: extern "C" fn() = rfwd_init;

#[cfg(all(not(test), target_os = "macos"))]
#[used]
#[link_section = "__DATA,__mod_init_func"]
static INIT: extern "C" fn() = rfwd_init;

/// Runs once when the library is loaded, before the host's `main`.
#[cfg_attr(test, allow(dead_code))]
extern "C" fn rfwd_init() {
    match shim::install() {
        Ok(_) => {
            logging::init(&rfwd_core::ShimConfig::from_env());
            tracing::debug!(version = rfwd_core::VERSION, "rfwd shim installed");
        }
        // Logging may target a file, and file writes would come straight
        // back into the failed shim
        Err(e) => diag::report(&format!("{}; output through write() will abort", e)),
    }
}

/// Install the shim explicitly.
///
/// The load-time constructor already does this; loaders that want to check
/// the outcome can call it again at no cost.
/// Returns 0 on success, -1 if the original `write` could not be resolved.
#[no_mangle]
pub extern "C" fn rfwd_install() -> c_int {
    match shim::install() {
        Ok(_) => 0,
        Err(_) => -1,
    }
}

/// Get library version
#[no_mangle]
pub extern "C" fn rfwd_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

// ============================================================================
// Tests
// ============================================================================
